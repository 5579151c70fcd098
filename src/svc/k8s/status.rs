//! # Status module
//!
//! This module provide the status store abstraction and the routine that
//! synchronizes the status sub-resource of a kubernetes [`Resource`]

use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
    time::Duration,
};

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{api::PostParams, Api, Client, CustomResourceExt, Resource, ResourceExt};
#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use prometheus::{opts, register_counter_vec, CounterVec};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{sync::Mutex, time::timeout};
use tracing::{debug, error, info};

use crate::svc::k8s::registry::Registry;

// -----------------------------------------------------------------------------
// Telemetry

#[cfg(feature = "metrics")]
static STATUS_UPDATE: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        opts!(
            "kubernetes_operator_status_update",
            "number of status synchronization by outcome",
        ),
        &["kind", "outcome"]
    )
    .expect("metrics 'kubernetes_operator_status_update' to not be already registered")
});

// -----------------------------------------------------------------------------
// Policy enumeration

/// behaviour of the synchronization when the store fails to persist the
/// status
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum Policy {
    /// log the failure and report success to the caller
    #[default]
    #[serde(rename = "swallow")]
    Swallow,
    /// log the failure and return it to the caller
    #[serde(rename = "propagate")]
    Propagate,
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Swallow => write!(f, "swallow"),
            Self::Propagate => write!(f, "propagate"),
        }
    }
}

// -----------------------------------------------------------------------------
// Outcome enumeration

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Outcome {
    /// proposed status equals the held one, the store was not contacted
    Unchanged,
    /// status has been replaced and persisted
    Persisted,
    /// status has been replaced in memory, but the store failed to persist it
    Dropped,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Persisted => write!(f, "persisted"),
            Self::Dropped => write!(f, "dropped"),
        }
    }
}

// -----------------------------------------------------------------------------
// Error enumeration

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to persist status of resource '{0}/{1}', {2}")]
    Persist(String, String, Box<dyn StdError + Send + Sync>),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to serialize resource '{0}', {1}")]
    Serialize(String, serde_json::Error),
    #[error("failed to execute request on kubernetes api, {0}")]
    KubeClient(kube::Error),
    #[error("failed to update status of resource '{0}' within {1:?}")]
    Timeout(String, Duration),
    #[error("custom resource of kind '{0}' is not registered")]
    Unregistered(String),
}

// -----------------------------------------------------------------------------
// StatusStore trait

/// provides a way to persist the status sub-resource of an object
#[async_trait]
pub trait StatusStore<T>: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    /// persist the status of the given object and returns the object as
    /// seen by the store
    async fn update_status(&self, obj: &T) -> Result<T, Self::Error>;
}

// -----------------------------------------------------------------------------
// KubeStatusStore structure

/// persists status through the kubernetes status sub-resource, each request
/// is bounded by a timeout
pub struct KubeStatusStore<T> {
    client: Client,
    timeout: Duration,
    phantom: PhantomData<fn() -> T>,
}

impl<T> KubeStatusStore<T>
where
    T: CustomResourceExt,
{
    /// returns a new store, if the kind is known by the registry
    pub fn try_new(client: Client, registry: &Registry, timeout: Duration) -> Result<Self, StoreError> {
        if !registry.contains::<T>() {
            return Err(StoreError::Unregistered(T::api_resource().kind));
        }

        Ok(Self {
            client,
            timeout,
            phantom: PhantomData,
        })
    }
}

#[async_trait]
impl<T> StatusStore<T> for KubeStatusStore<T>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Serialize
        + DeserializeOwned
        + Clone
        + Debug
        + Send
        + Sync
        + 'static,
{
    type Error = StoreError;

    async fn update_status(&self, obj: &T) -> Result<T, Self::Error> {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        let api: Api<T> = Api::namespaced(self.client.to_owned(), &namespace);

        let data = serde_json::to_vec(obj).map_err(|err| StoreError::Serialize(name.to_owned(), err))?;

        debug!(
            namespace = &namespace,
            name = &name,
            "execute replace request on resource's status",
        );

        timeout(
            self.timeout,
            api.replace_status(&name, &PostParams::default(), data),
        )
        .await
        .map_err(|_| StoreError::Timeout(name.to_owned(), self.timeout))?
        .map_err(StoreError::KubeClient)
    }
}

// -----------------------------------------------------------------------------
// Helpers functions

/// applies `mutate` on the object and, if it reports a modification,
/// persists the object through the store. The lock is held from the
/// comparison until the store answered and released on every exit path.
pub async fn synchronize<T, S, F>(
    obj: &mut T,
    store: &S,
    lock: &Mutex<()>,
    policy: &Policy,
    mutate: F,
) -> Result<Outcome, Error>
where
    T: Resource<DynamicType = ()> + Send + Sync,
    S: StatusStore<T> + ?Sized,
    F: FnOnce(&mut T) -> bool + Send,
{
    let kind = T::kind(&()).to_string();
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();

    let _guard = lock.lock().await;

    let outcome = if !mutate(obj) {
        debug!(
            kind = &kind,
            namespace = &namespace,
            name = &name,
            "Status is the same, skip update",
        );

        Outcome::Unchanged
    } else {
        info!(
            kind = &kind,
            namespace = &namespace,
            name = &name,
            "Status has changed, perform update",
        );

        match store.update_status(obj).await {
            Ok(updated) => {
                obj.meta_mut().resource_version = updated.meta().resource_version.to_owned();
                Outcome::Persisted
            }
            Err(err) => {
                error!(
                    kind = &kind,
                    namespace = &namespace,
                    name = &name,
                    policy = policy.to_string(),
                    error = err.to_string(),
                    "Attempt to update status failed",
                );

                #[cfg(feature = "metrics")]
                STATUS_UPDATE
                    .with_label_values(&[&kind, &Outcome::Dropped.to_string()])
                    .inc();

                return match policy {
                    Policy::Swallow => Ok(Outcome::Dropped),
                    Policy::Propagate => Err(Error::Persist(namespace, name, Box::new(err))),
                };
            }
        }
    };

    #[cfg(feature = "metrics")]
    STATUS_UPDATE
        .with_label_values(&[&kind, &outcome.to_string()])
        .inc();

    Ok(outcome)
}

// -----------------------------------------------------------------------------
// In-memory store

#[cfg(test)]
pub mod memory {
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use kube::Resource;

    use super::StatusStore;

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("the object has been modified; please apply your changes to the latest version")]
        Conflict,
    }

    /// store keeping every persisted object, optionally failing or slow
    pub struct MemoryStore<T> {
        updates: Mutex<Vec<T>>,
        attempts: AtomicUsize,
        in_flight: AtomicUsize,
        overlapped: AtomicBool,
        failing: bool,
        delay: Option<Duration>,
    }

    impl<T> Default for MemoryStore<T> {
        fn default() -> Self {
            Self {
                updates: Mutex::new(vec![]),
                attempts: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                overlapped: AtomicBool::new(false),
                failing: false,
                delay: None,
            }
        }
    }

    impl<T> MemoryStore<T>
    where
        T: Clone,
    {
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Default::default()
            }
        }

        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        /// returns if two update requests have been served at the same time
        pub fn overlapped(&self) -> bool {
            self.overlapped.load(Ordering::SeqCst)
        }

        pub fn updates(&self) -> Vec<T> {
            self.updates.lock().expect("lock to not be poisoned").to_owned()
        }
    }

    #[async_trait]
    impl<T> StatusStore<T> for MemoryStore<T>
    where
        T: Resource + Clone + Send + Sync,
    {
        type Error = Error;

        async fn update_status(&self, obj: &T) -> Result<T, Self::Error> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.failing {
                return Err(Error::Conflict);
            }

            let mut updates = self.updates.lock().expect("lock to not be poisoned");
            updates.push(obj.to_owned());

            let mut updated = obj.to_owned();
            updated.meta_mut().resource_version = Some(updates.len().to_string());

            Ok(updated)
        }
    }
}
