//! # Resource module
//!
//! This module provide helpers on kubernetes [`Resource`]

use std::fmt::Debug;

use k8s_openapi::{api::core::v1::ObjectReference, NamespaceResourceScope};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tracing::debug;

// -----------------------------------------------------------------------------
// Helpers functions

/// returns if the resource is considered from kubernetes point of view as deleted
pub fn deleted<T>(obj: &T) -> bool
where
    T: Resource,
{
    obj.meta().deletion_timestamp.is_some()
}

/// returns the namespace and name of the kubernetes resource, the namespace
/// is empty for cluster-wide resources
pub fn namespaced_name<T>(obj: &T) -> (String, String)
where
    T: ResourceExt,
{
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

/// make a get request on the given namespaced resource, returns `None` if it
/// does not exist
pub async fn get<T>(client: Client, namespace: &str, name: &str) -> Result<Option<T>, kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope> + DeserializeOwned + Clone + Debug,
    <T as Resource>::DynamicType: Default,
{
    debug!(
        kind = T::kind(&Default::default()).to_string(),
        namespace = namespace,
        name = name,
        "execute a request to retrieve resource",
    );

    Api::namespaced(client, namespace).get_opt(name).await
}

/// returns an object reference pointing to the given resource
pub fn object_reference<T>(obj: &T) -> ObjectReference
where
    T: Resource<DynamicType = ()>,
{
    let meta = obj.meta();

    ObjectReference {
        api_version: Some(T::api_version(&()).to_string()),
        kind: Some(T::kind(&()).to_string()),
        name: meta.name.to_owned(),
        namespace: meta.namespace.to_owned(),
        uid: meta.uid.to_owned(),
        resource_version: meta.resource_version.to_owned(),
        field_path: None,
    }
}
