//! # MongoDb custom resource
//!
//! This module provide the mongodb custom resource, its definition and the
//! reconciler that keeps its status in line with the managed resources.

use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use async_trait::async_trait;
use k8s_openapi::api::{
    apps::v1::StatefulSet,
    core::v1::{ResourceRequirements, Service},
};
use kube::{
    runtime::{controller, watcher, Controller},
    Api, CustomResource, Resource,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::svc::{
    crd::is_default,
    k8s::{
        self,
        lock::ObjectKey,
        recorder, resource,
        status::{self, KubeStatusStore, Outcome, Policy, StatusStore},
        Context, ControllerBuilder,
    },
};

// -----------------------------------------------------------------------------
// Image structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Image {
    #[serde(rename = "tag", default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

// -----------------------------------------------------------------------------
// PersistentVolumeClaim structure

/// desired state of the persistent volume claims backing the replicas
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct PersistentVolumeClaim {
    #[serde(rename = "resources", default, skip_serializing_if = "is_default")]
    pub resources: ResourceRequirements,
}

// -----------------------------------------------------------------------------
// Spec structure

#[derive(CustomResource, JsonSchema, Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[kube(group = "operator.ibm.com")]
#[kube(version = "v1alpha1")]
#[kube(kind = "MongoDB")]
#[kube(struct = "MongoDb")]
#[kube(singular = "mongodb")]
#[kube(plural = "mongodbs")]
#[kube(status = "Status")]
#[kube(namespaced)]
#[kube(derive = "PartialEq")]
#[kube(
    printcolumn = r#"{"name":"replicas", "type":"integer", "description":"Replicas", "jsonPath":".spec.replicas"}"#
)]
#[kube(
    printcolumn = r#"{"name":"storage", "type":"string", "description":"Storage class", "jsonPath":".status.storageClass"}"#
)]
#[kube(
    printcolumn = r#"{"name":"service", "type":"string", "description":"Service status", "jsonPath":".status.service.status"}"#
)]
pub struct Spec {
    #[serde(rename = "imageRegistry", default, skip_serializing_if = "String::is_empty")]
    pub image_registry: String,
    #[serde(rename = "replicas", default, skip_serializing_if = "is_default")]
    pub replicas: i32,
    #[serde(rename = "storageClass", default, skip_serializing_if = "String::is_empty")]
    pub storage_class: String,
    #[serde(rename = "initImage", default, skip_serializing_if = "is_default")]
    pub init_image: Image,
    #[serde(rename = "bootstrapImage", default, skip_serializing_if = "is_default")]
    pub bootstrap_image: Image,
    #[serde(rename = "metricsImage", default, skip_serializing_if = "is_default")]
    pub metrics_image: Image,
    #[serde(rename = "resources", default, skip_serializing_if = "is_default")]
    pub resources: ResourceRequirements,
    #[serde(rename = "pvc", default, skip_serializing_if = "is_default")]
    pub pvc: PersistentVolumeClaim,
}

// -----------------------------------------------------------------------------
// ManagedResourceStatus structure

/// observed state of a child resource the service depends on
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ManagedResourceStatus {
    #[serde(rename = "objectName", default, skip_serializing_if = "String::is_empty")]
    pub object_name: String,
    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(rename = "namespace", default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(rename = "kind", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "status", default, skip_serializing_if = "String::is_empty")]
    pub status: String,
}

// -----------------------------------------------------------------------------
// ServiceStatus structure

/// observed state of the network-facing object and of the resources it
/// depends on, the order of managed resources is significant on comparison
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ServiceStatus {
    #[serde(rename = "objectName", default, skip_serializing_if = "String::is_empty")]
    pub object_name: String,
    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(rename = "namespace", default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(rename = "kind", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "status", default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(rename = "managedResources", default, skip_serializing_if = "Vec::is_empty")]
    pub managed_resources: Vec<ManagedResourceStatus>,
}

// -----------------------------------------------------------------------------
// Status structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Status {
    #[serde(rename = "storageClass", default, skip_serializing_if = "String::is_empty")]
    pub storage_class: String,
    #[serde(rename = "service", default, skip_serializing_if = "is_default")]
    pub service: ServiceStatus,
}

// -----------------------------------------------------------------------------
// MongoDb implementation

impl MongoDb {
    /// replaces the service status if it differs from the held one and
    /// persists the whole resource through the given store, while holding
    /// the given lock
    pub async fn set_service<S>(
        &mut self,
        service: ServiceStatus,
        store: &S,
        lock: &Mutex<()>,
        policy: &Policy,
    ) -> Result<Outcome, status::Error>
    where
        S: StatusStore<Self> + ?Sized,
    {
        status::synchronize(self, store, lock, policy, move |obj: &mut Self| {
            let unchanged = match &obj.status {
                Some(status) => status.service == service,
                None => is_default(&service),
            };

            if unchanged {
                return false;
            }

            obj.status.get_or_insert_with(Status::default).service = service;
            true
        })
        .await
    }

    /// same contract as [`MongoDb::set_service`] for the storage class
    pub async fn set_storage_class<S>(
        &mut self,
        storage_class: String,
        store: &S,
        lock: &Mutex<()>,
        policy: &Policy,
    ) -> Result<Outcome, status::Error>
    where
        S: StatusStore<Self> + ?Sized,
    {
        status::synchronize(self, store, lock, policy, move |obj: &mut Self| {
            let unchanged = match &obj.status {
                Some(status) => status.storage_class == storage_class,
                None => storage_class.is_empty(),
            };

            if unchanged {
                return false;
            }

            obj.status.get_or_insert_with(Status::default).storage_class = storage_class;
            true
        })
        .await
    }

    pub fn get_service(&self) -> ServiceStatus {
        self.status.to_owned().unwrap_or_default().service
    }
}

// -----------------------------------------------------------------------------
// Phase enumeration

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum Phase {
    Ready,
    Pending,
    NotFound,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Pending => write!(f, "Pending"),
            Self::NotFound => write!(f, "NotFound"),
        }
    }
}

impl Phase {
    /// a service is ready once kubernetes allocated it a cluster ip
    pub fn of_service(service: Option<&Service>) -> Self {
        let Some(service) = service else {
            return Self::NotFound;
        };

        let allocated = service
            .spec
            .as_ref()
            .and_then(|spec| spec.cluster_ip.as_ref())
            .map_or(false, |ip| !ip.is_empty());

        if allocated {
            Self::Ready
        } else {
            Self::Pending
        }
    }

    /// a statefulset is ready once every desired replica reports ready
    pub fn of_statefulset(statefulset: Option<&StatefulSet>) -> Self {
        let Some(statefulset) = statefulset else {
            return Self::NotFound;
        };

        let desired = statefulset
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(1);

        let ready = statefulset
            .status
            .as_ref()
            .and_then(|status| status.ready_replicas)
            .unwrap_or(0);

        if ready >= desired {
            Self::Ready
        } else {
            Self::Pending
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers functions

/// returns the service status computed from the observed service and the
/// statefulset it fronts, both sharing the name of the custom resource
pub fn observe(
    obj: &MongoDb,
    service: Option<&Service>,
    statefulset: Option<&StatefulSet>,
) -> ServiceStatus {
    let (namespace, name) = resource::namespaced_name(obj);

    let managed_resources = vec![ManagedResourceStatus {
        object_name: name.to_owned(),
        api_version: <StatefulSet as k8s_openapi::Resource>::API_VERSION.to_string(),
        namespace: namespace.to_owned(),
        kind: <StatefulSet as k8s_openapi::Resource>::KIND.to_string(),
        status: Phase::of_statefulset(statefulset).to_string(),
    }];

    ServiceStatus {
        object_name: name,
        api_version: <Service as k8s_openapi::Resource>::API_VERSION.to_string(),
        namespace,
        kind: <Service as k8s_openapi::Resource>::KIND.to_string(),
        status: Phase::of_service(service).to_string(),
        managed_resources,
    }
}

// -----------------------------------------------------------------------------
// Action enumeration

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub enum Action {
    UpdateServiceStatus,
    UpdateStorageClass,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UpdateServiceStatus => write!(f, "UpdateServiceStatus"),
            Self::UpdateStorageClass => write!(f, "UpdateStorageClass"),
        }
    }
}

// -----------------------------------------------------------------------------
// ReconcilerError enum

#[derive(thiserror::Error, Debug)]
pub enum ReconcilerError {
    #[error("failed to reconcile resource, {0}")]
    Reconcile(String),
    #[error("failed to execute request on kubernetes api, {0}")]
    KubeClient(kube::Error),
    #[error("failed to create status store, {0}")]
    Store(status::StoreError),
    #[error("failed to synchronize status, {0}")]
    Synchronize(status::Error),
}

impl From<kube::Error> for ReconcilerError {
    fn from(err: kube::Error) -> Self {
        Self::KubeClient(err)
    }
}

impl From<status::StoreError> for ReconcilerError {
    fn from(err: status::StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<status::Error> for ReconcilerError {
    fn from(err: status::Error) -> Self {
        Self::Synchronize(err)
    }
}

impl From<controller::Error<Self, watcher::Error>> for ReconcilerError {
    fn from(err: controller::Error<ReconcilerError, watcher::Error>) -> Self {
        Self::Reconcile(err.to_string())
    }
}

// -----------------------------------------------------------------------------
// Reconciler structure

#[derive(Clone, Default, Debug)]
pub struct Reconciler {}

impl ControllerBuilder<MongoDb> for Reconciler {
    fn build(&self, state: Arc<Context>) -> Controller<MongoDb> {
        let client = state.kube.to_owned();
        let services = Api::<Service>::all(client.to_owned());
        let statefulsets = Api::<StatefulSet>::all(client.to_owned());

        Controller::new(Api::all(client), watcher::Config::default())
            .owns(services, watcher::Config::default())
            .owns(statefulsets, watcher::Config::default())
    }
}

/// records an event on the resource matching the outcome of a status write,
/// a failure to record is logged and does not interrupt the reconciliation
async fn record(kube: &kube::Client, obj: &MongoDb, action: &Action, outcome: &Outcome) {
    let result = match outcome {
        Outcome::Unchanged => return,
        Outcome::Persisted => {
            let message = "Status of custom resource has been updated";
            recorder::normal(kube.to_owned(), obj, action, message).await
        }
        Outcome::Dropped => {
            let message = "Failed to persist status of custom resource";
            recorder::warning(kube.to_owned(), obj, action, message).await
        }
    };

    if let Err(err) = result {
        let (namespace, name) = resource::namespaced_name(obj);

        warn!(
            namespace = &namespace,
            name = &name,
            action = action.to_string(),
            error = err.to_string(),
            "Failed to record event on custom resource",
        );
    }
}

#[async_trait]
impl k8s::Reconciler<MongoDb> for Reconciler {
    type Error = ReconcilerError;

    async fn upsert(ctx: Arc<Context>, origin: Arc<MongoDb>) -> Result<(), ReconcilerError> {
        let Context {
            kube,
            config,
            registry,
            locks,
        } = ctx.as_ref();

        let kind = MongoDb::kind(&()).to_string();
        let (namespace, name) = resource::namespaced_name(&*origin);

        // ---------------------------------------------------------------------
        // Step 1: observe managed resources

        debug!(
            kind = &kind,
            namespace = &namespace,
            name = &name,
            "Retrieve managed resources of custom resource",
        );

        let service: Option<Service> = resource::get(kube.to_owned(), &namespace, &name).await?;
        let statefulset: Option<StatefulSet> =
            resource::get(kube.to_owned(), &namespace, &name).await?;

        let observed = observe(&origin, service.as_ref(), statefulset.as_ref());

        // ---------------------------------------------------------------------
        // Step 2: synchronize service status

        let store =
            KubeStatusStore::<MongoDb>::try_new(kube.to_owned(), registry, config.status.timeout())?;
        let lock = locks.get(&ObjectKey::from_resource(&*origin));
        let policy = &config.status.policy;
        let mut modified = (*origin).to_owned();

        info!(
            kind = &kind,
            namespace = &namespace,
            name = &name,
            status = &observed.status,
            "Synchronize service status of custom resource",
        );

        let outcome = modified
            .set_service(observed, &store, &lock, policy)
            .await?;

        record(kube, &modified, &Action::UpdateServiceStatus, &outcome).await;

        // ---------------------------------------------------------------------
        // Step 3: synchronize storage class

        let storage_class = modified.spec.storage_class.to_owned();
        let outcome = modified
            .set_storage_class(storage_class, &store, &lock, policy)
            .await?;

        record(kube, &modified, &Action::UpdateStorageClass, &outcome).await;

        Ok(())
    }

    async fn delete(ctx: Arc<Context>, origin: Arc<MongoDb>) -> Result<(), ReconcilerError> {
        let key = ObjectKey::from_resource(&*origin);

        info!(
            namespace = &key.namespace,
            name = &key.name,
            "Forget status lock of deleted custom resource",
        );

        ctx.locks.forget(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{atomic::Ordering, Arc},
        time::Duration,
    };

    use hyper::StatusCode;
    use k8s_openapi::api::{
        apps::v1::{StatefulSetSpec, StatefulSetStatus},
        core::v1::ServiceSpec,
    };
    use kube::CustomResourceExt;

    use super::*;
    use crate::svc::k8s::{client::mock, status::memory::MemoryStore};

    fn mongodb(name: &str) -> MongoDb {
        let mut obj = MongoDb::new(name, Spec::default());
        obj.metadata.namespace = Some("ibm-common-services".to_string());
        obj
    }

    fn service(object_name: &str, status: &str) -> ServiceStatus {
        ServiceStatus {
            object_name: object_name.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn managed(object_name: &str, status: &str) -> ManagedResourceStatus {
        ManagedResourceStatus {
            object_name: object_name.to_string(),
            api_version: "apps/v1".to_string(),
            namespace: "ibm-common-services".to_string(),
            kind: "StatefulSet".to_string(),
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_service_on_empty_status_is_a_noop() {
        let store = MemoryStore::default();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");

        let outcome = obj
            .set_service(ServiceStatus::default(), &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");

        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.attempts(), 0);
        assert!(obj.status.is_none());
    }

    #[tokio::test]
    async fn changed_service_is_persisted_once() {
        let store = MemoryStore::default();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");
        obj.status = Some(Status {
            service: service("svc-a", "Pending"),
            ..Default::default()
        });

        let outcome = obj
            .set_service(service("svc-a", "Ready"), &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");

        assert_eq!(outcome, Outcome::Persisted);
        assert_eq!(store.attempts(), 1);
        assert_eq!(store.updates()[0].get_service(), service("svc-a", "Ready"));

        let outcome = obj
            .set_service(service("svc-a", "Ready"), &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");

        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn nested_managed_resource_change_is_detected() {
        let store = MemoryStore::default();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");

        let mut current = service("mongodb", "Ready");
        current.managed_resources = vec![managed("mongodb", "Ready"), managed("backup", "Ready")];
        obj.status = Some(Status {
            service: current.to_owned(),
            ..Default::default()
        });

        let mut proposed = current.to_owned();
        proposed.managed_resources[1].status = "Pending".to_string();

        let outcome = obj
            .set_service(proposed.to_owned(), &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");

        assert_eq!(outcome, Outcome::Persisted);
        assert_eq!(obj.get_service(), proposed);
    }

    #[tokio::test]
    async fn reordered_managed_resources_are_a_difference() {
        let store = MemoryStore::default();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");

        let mut current = service("mongodb", "Ready");
        current.managed_resources = vec![managed("a", "Ready"), managed("b", "Ready")];
        obj.status = Some(Status {
            service: current.to_owned(),
            ..Default::default()
        });

        let mut proposed = current.to_owned();
        proposed.managed_resources.reverse();

        let outcome = obj
            .set_service(proposed, &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");

        assert_eq!(outcome, Outcome::Persisted);
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn failed_persistence_is_swallowed_and_keeps_in_memory_value() {
        let store = MemoryStore::failing();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");
        obj.status = Some(Status {
            service: service("svc-a", "Pending"),
            ..Default::default()
        });

        let result = obj
            .set_service(service("svc-a", "Ready"), &store, &lock, &Policy::Swallow)
            .await;

        assert!(matches!(result, Ok(Outcome::Dropped)));
        assert_eq!(store.attempts(), 1);
        assert_eq!(obj.get_service(), service("svc-a", "Ready"));

        // lock has been released
        assert!(lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn failed_persistence_is_propagated_on_demand() {
        let store = MemoryStore::failing();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");

        let result = obj
            .set_service(service("svc-a", "Ready"), &store, &lock, &Policy::Propagate)
            .await;

        assert!(matches!(result, Err(status::Error::Persist(..))));
        assert_eq!(obj.get_service(), service("svc-a", "Ready"));
        assert!(lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn concurrent_updates_on_same_resource_do_not_interleave() {
        let store = Arc::new(MemoryStore::<MongoDb>::with_delay(Duration::from_millis(20)));
        let lock = Arc::new(Mutex::new(()));

        let handles: Vec<_> = ["Ready", "Pending"]
            .into_iter()
            .map(|status| {
                let store = store.to_owned();
                let lock = lock.to_owned();

                tokio::spawn(async move {
                    let mut obj = mongodb("mongodb");
                    obj.set_service(service("svc-a", status), &*store, &lock, &Policy::Swallow)
                        .await
                })
            })
            .collect();

        for handle in handles {
            let outcome = handle
                .await
                .expect("task to complete")
                .expect("synchronization to succeed");

            assert_eq!(outcome, Outcome::Persisted);
        }

        assert!(!store.overlapped());

        let updates = store.updates();
        assert_eq!(updates.len(), 2);

        let last = updates[1].get_service();
        assert!(last == service("svc-a", "Ready") || last == service("svc-a", "Pending"));
    }

    #[tokio::test]
    async fn storage_class_follows_the_same_contract() {
        let store = MemoryStore::default();
        let lock = Mutex::new(());
        let mut obj = mongodb("mongodb");

        let outcome = obj
            .set_storage_class(String::new(), &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");
        assert_eq!(outcome, Outcome::Unchanged);

        let outcome = obj
            .set_storage_class("rook-ceph".to_string(), &store, &lock, &Policy::Swallow)
            .await
            .expect("synchronization to succeed");
        assert_eq!(outcome, Outcome::Persisted);
        assert_eq!(store.attempts(), 1);
        assert_eq!(
            obj.status.as_ref().map(|status| status.storage_class.as_str()),
            Some("rook-ceph")
        );
    }

    #[tokio::test]
    async fn rejected_event_does_not_interrupt_reconciliation() {
        let (client, requests) = mock::client(StatusCode::FORBIDDEN, Duration::ZERO);
        let obj = mongodb("mongodb");

        record(&client, &obj, &Action::UpdateServiceStatus, &Outcome::Dropped).await;
        record(&client, &obj, &Action::UpdateStorageClass, &Outcome::Persisted).await;
        record(&client, &obj, &Action::UpdateStorageClass, &Outcome::Unchanged).await;

        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn observe_without_children() {
        let obj = mongodb("mongodb");
        let status = observe(&obj, None, None);

        assert_eq!(status.object_name, "mongodb");
        assert_eq!(status.kind, "Service");
        assert_eq!(status.api_version, "v1");
        assert_eq!(status.namespace, "ibm-common-services");
        assert_eq!(status.status, "NotFound");
        assert_eq!(status.managed_resources, vec![managed("mongodb", "NotFound")]);
    }

    #[test]
    fn observe_ready_children() {
        let obj = mongodb("mongodb");

        let service = Service {
            spec: Some(ServiceSpec {
                cluster_ip: Some("10.0.0.12".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let statefulset = StatefulSet {
            spec: Some(StatefulSetSpec {
                replicas: Some(3),
                ..Default::default()
            }),
            status: Some(StatefulSetStatus {
                ready_replicas: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };

        let status = observe(&obj, Some(&service), Some(&statefulset));

        assert_eq!(status.status, "Ready");
        assert_eq!(status.managed_resources, vec![managed("mongodb", "Pending")]);
    }

    #[test]
    fn status_omits_empty_fields() {
        let status = Status {
            service: ServiceStatus {
                object_name: "svc-a".to_string(),
                status: "Ready".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&status).expect("status to be serializable");
        assert_eq!(
            value,
            serde_json::json!({"service": {"objectName": "svc-a", "status": "Ready"}})
        );

        let value = serde_json::to_value(Status::default()).expect("status to be serializable");
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn spec_is_read_from_camel_case_record() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "imageRegistry": "quay.io/opencloudio",
            "replicas": 3,
            "storageClass": "rook-ceph",
            "initImage": {"tag": "1.0.0"},
            "metricsImage": {"tag": "0.9.0"},
            "pvc": {"resources": {"requests": {"storage": "20Gi"}}}
        }))
        .expect("spec to be deserializable");

        assert_eq!(spec.image_registry, "quay.io/opencloudio");
        assert_eq!(spec.replicas, 3);
        assert_eq!(spec.init_image.tag, "1.0.0");
        assert!(spec.bootstrap_image.tag.is_empty());
        assert!(spec
            .pvc
            .resources
            .requests
            .as_ref()
            .map_or(false, |requests| requests.contains_key("storage")));
    }

    #[test]
    fn custom_resource_definition_exposes_status_subresource() {
        let crd = MongoDb::crd();

        assert_eq!(crd.spec.group, "operator.ibm.com");
        assert_eq!(crd.spec.names.kind, "MongoDB");
        assert_eq!(crd.spec.names.plural, "mongodbs");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert!(crd.spec.versions[0]
            .subresources
            .as_ref()
            .and_then(|subresources| subresources.status.as_ref())
            .is_some());
    }
}
