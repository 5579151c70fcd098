//! # Lock module
//!
//! This module provide per-resource locks used to serialize status writes of
//! a single kubernetes resource

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use kube::{runtime::reflector::ObjectRef, Resource, ResourceExt};
use tokio::sync::Mutex;
use tracing::trace;

// -----------------------------------------------------------------------------
// ObjectKey structure

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl ObjectKey {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn from_resource<T>(obj: &T) -> Self
    where
        T: ResourceExt,
    {
        Self {
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
        }
    }
}

impl<K> From<&ObjectRef<K>> for ObjectKey
where
    K: Resource,
{
    fn from(obj_ref: &ObjectRef<K>) -> Self {
        Self {
            namespace: obj_ref.namespace.to_owned().unwrap_or_default(),
            name: obj_ref.name.to_owned(),
        }
    }
}

// -----------------------------------------------------------------------------
// Locks structure

/// maps a resource key to its own lock, locks are created on first use and
/// kept until the resource is forgotten
#[derive(Default, Debug)]
pub struct Locks {
    inner: StdMutex<HashMap<ObjectKey, Arc<Mutex<()>>>>,
}

impl Locks {
    /// returns the lock of the given key, the same lock is returned for equal
    /// keys
    pub fn get(&self, key: &ObjectKey) -> Arc<Mutex<()>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        inner
            .entry(key.to_owned())
            .or_insert_with(|| {
                trace!(key = key.to_string(), "Create status lock for resource");
                Arc::new(Mutex::new(()))
            })
            .to_owned()
    }

    /// drops the lock of the given key, returns if there was one
    pub fn forget(&self, key: &ObjectKey) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
