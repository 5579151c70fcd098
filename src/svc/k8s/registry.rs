//! # Registry module
//!
//! This module provide the registry of custom resources known by the
//! operator. It is built once at startup and handed to the components that
//! need to know how to serve a kind.

use std::collections::BTreeMap;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{core::ApiResource, CustomResourceExt};
use tracing::debug;

// -----------------------------------------------------------------------------
// Error enumeration

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("custom resource of kind '{0}' is already registered")]
    AlreadyRegistered(String),
}

// -----------------------------------------------------------------------------
// Registration structure

#[derive(Clone, Debug)]
pub struct Registration {
    pub resource: ApiResource,
    pub list_kind: String,
    crd: fn() -> CustomResourceDefinition,
}

impl Registration {
    /// returns the custom resource definition of the registered kind
    pub fn crd(&self) -> CustomResourceDefinition {
        (self.crd)()
    }
}

// -----------------------------------------------------------------------------
// Registry structure

#[derive(Clone, Default, Debug)]
pub struct Registry {
    entries: BTreeMap<String, Registration>,
}

impl Registry {
    /// registers the kind and its list kind
    pub fn register<T>(&mut self) -> Result<&mut Self, Error>
    where
        T: CustomResourceExt,
    {
        let resource = T::api_resource();
        if self.entries.contains_key(&resource.kind) {
            return Err(Error::AlreadyRegistered(resource.kind));
        }

        debug!(
            kind = &resource.kind,
            apiVersion = &resource.api_version,
            "Register custom resource",
        );

        self.entries.insert(
            resource.kind.to_owned(),
            Registration {
                list_kind: format!("{}List", resource.kind),
                resource,
                crd: T::crd,
            },
        );

        Ok(self)
    }

    pub fn contains<T>(&self) -> bool
    where
        T: CustomResourceExt,
    {
        self.entries
            .get(&T::api_resource().kind)
            .map_or(false, |registration| {
                registration.resource.api_version == T::api_resource().api_version
            })
    }

    pub fn get(&self, kind: &str) -> Option<&Registration> {
        self.entries.get(kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.values()
    }

    /// returns the custom resource definitions of every registered kind
    pub fn crds(&self) -> Vec<CustomResourceDefinition> {
        self.iter().map(Registration::crd).collect()
    }
}
