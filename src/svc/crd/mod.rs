//! # Custom resource definition module
//!
//! This module provide custom resource definition managed by the operator,
//! their structures, implementation and reconciliation loop.

use crate::svc::k8s::registry::{self, Registry};

pub mod mongodb;

// -----------------------------------------------------------------------------
// Helpers functions

/// returns if the given value is equal to its default, used to omit empty
/// nested records on serialization
pub(crate) fn is_default<T>(value: &T) -> bool
where
    T: Default + PartialEq,
{
    *value == T::default()
}

/// returns the registry of every custom resource managed by the operator
pub fn registry() -> Result<Registry, registry::Error> {
    let mut registry = Registry::default();

    registry.register::<mongodb::MongoDb>()?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use kube::CustomResourceExt;

    use super::*;

    #[test]
    fn registry_lists_mongodb() {
        let registry = registry().expect("registry to be built");

        assert!(registry.contains::<mongodb::MongoDb>());
        assert_eq!(registry.iter().count(), 1);

        let registration = registry
            .get(&mongodb::MongoDb::api_resource().kind)
            .expect("mongodb to be registered");

        assert_eq!(registration.list_kind, "MongoDBList");
    }

    #[test]
    fn is_default_on_strings_and_records() {
        assert!(is_default(&String::new()));
        assert!(!is_default(&"4.4".to_string()));
        assert!(is_default(&mongodb::Image::default()));
    }
}
