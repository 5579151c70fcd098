//! # Event module
//!
//! This module provide helpers to interact with the kubernetes core/v1/event
//! api

use std::fmt::Debug;

use chrono::Utc;
use k8s_openapi::{
    api::core::v1::{Event, EventSource},
    apimachinery::pkg::apis::meta::v1::{MicroTime, Time},
};
use kube::{api::ObjectMeta, Resource, ResourceExt};

use crate::svc::k8s::{recorder::Level, resource};

// -----------------------------------------------------------------------------
// constants

pub const REPORTING_COMPONENT: &str = env!("CARGO_PKG_NAME");

// -----------------------------------------------------------------------------
// Helper functions

/// create a new event from the given parameters
pub fn new<T, U>(obj: &T, kind: &Level, action: &U, message: &str) -> Event
where
    T: Resource<DynamicType = ()> + ResourceExt + Debug,
    U: ToString + Debug,
{
    let now = Utc::now();

    Event {
        metadata: ObjectMeta {
            namespace: obj.namespace(),
            name: Some(format!(
                "{}-{}-{}",
                obj.name_any(),
                action.to_string().to_lowercase(),
                now.timestamp_millis()
            )),
            ..Default::default()
        },
        type_: Some(kind.to_string()),
        action: Some(action.to_string()),
        count: Some(1),
        event_time: Some(MicroTime(now)),
        first_timestamp: Some(Time(now)),
        involved_object: resource::object_reference(obj),
        last_timestamp: Some(Time(now)),
        message: Some(message.to_string()),
        reason: Some(action.to_string()),
        reporting_component: Some(REPORTING_COMPONENT.to_string()),
        reporting_instance: Some(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )),
        series: None,
        source: Some(source()),
        ..Default::default()
    }
}

/// returns the source of this operator
pub fn source() -> EventSource {
    let host = hostname::get()
        .ok()
        .map(|host| host.to_string_lossy().to_string());

    EventSource {
        component: Some(REPORTING_COMPONENT.to_string()),
        host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svc::crd::mongodb::{Action, MongoDb, Spec};

    #[test]
    fn event_targets_the_resource() {
        let mut obj = MongoDb::new("mongodb", Spec::default());
        obj.metadata.namespace = Some("default".to_string());

        let event = new(
            &obj,
            &Level::Warning,
            &Action::UpdateServiceStatus,
            "Failed to persist status of custom resource",
        );

        assert_eq!(event.type_.as_deref(), Some("Warning"));
        assert_eq!(event.reason.as_deref(), Some("UpdateServiceStatus"));
        assert_eq!(event.metadata.namespace.as_deref(), Some("default"));
        assert!(event
            .metadata
            .name
            .as_deref()
            .map_or(false, |name| name.starts_with("mongodb-updateservicestatus-")));
        assert_eq!(event.involved_object.kind.as_deref(), Some("MongoDB"));
    }
}
