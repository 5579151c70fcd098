//! # Services module
//!
//! This module provide services to interact with kubernetes, the custom
//! resources of the operator and helpers to do so.
pub mod cfg;
pub mod crd;
pub mod k8s;
pub mod telemetry;
