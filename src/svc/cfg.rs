//! # Configuration module
//!
//! This module provide utilities and helpers to interact with the configuration

use std::{convert::TryFrom, env, net::SocketAddr, path::PathBuf, time::Duration};

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::svc::k8s::status::Policy;

// -----------------------------------------------------------------------------
// Constants

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
pub const DEFAULT_STATUS_POLICY: &str = "swallow";
pub const DEFAULT_STATUS_TIMEOUT: i64 = 30;
pub const DEFAULT_RECONCILER_REQUEUE: i64 = 300;

// -----------------------------------------------------------------------------
// Operator structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Operator {
    #[serde(rename = "listen")]
    pub listen: SocketAddr,
}

// -----------------------------------------------------------------------------
// Status structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Status {
    #[serde(rename = "policy")]
    pub policy: Policy,
    /// seconds to wait for the status update request
    #[serde(rename = "timeout")]
    pub timeout: u64,
}

impl Status {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// -----------------------------------------------------------------------------
// Reconciler structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Reconciler {
    /// seconds to wait before observing a resource again
    #[serde(rename = "requeue")]
    pub requeue: u64,
}

impl Reconciler {
    pub fn requeue(&self) -> Duration {
        Duration::from_secs(self.requeue)
    }
}

// -----------------------------------------------------------------------------
// ConfigurationError enum

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to load configuration, {0}")]
    Build(ConfigError),
    #[error("failed to load configuration, {0}")]
    Cast(ConfigError),
    #[error("failed to set default for key '{0}', {1}")]
    Default(String, ConfigError),
}

// -----------------------------------------------------------------------------
// Configuration structures

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Configuration {
    #[serde(rename = "operator")]
    pub operator: Operator,
    #[serde(rename = "status")]
    pub status: Status,
    #[serde(rename = "reconciler")]
    pub reconciler: Reconciler,
}

/// returns a builder holding defaults and the environment source
fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigurationError> {
    Ok(Config::builder()
        .set_default("operator.listen", DEFAULT_LISTEN)
        .map_err(|err| ConfigurationError::Default("operator.listen".into(), err))?
        .set_default("status.policy", DEFAULT_STATUS_POLICY)
        .map_err(|err| ConfigurationError::Default("status.policy".into(), err))?
        .set_default("status.timeout", DEFAULT_STATUS_TIMEOUT)
        .map_err(|err| ConfigurationError::Default("status.timeout".into(), err))?
        .set_default("reconciler.requeue", DEFAULT_RECONCILER_REQUEUE)
        .map_err(|err| ConfigurationError::Default("reconciler.requeue".into(), err))?
        .add_source(
            Environment::with_prefix(&env!("CARGO_PKG_NAME").replace('-', "_"))
                .prefix_separator("_")
                .separator("__"),
        ))
}

impl TryFrom<PathBuf> for Configuration {
    type Error = ConfigurationError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        builder()?
            .add_source(File::from(path).required(true))
            .build()
            .map_err(ConfigurationError::Build)?
            .try_deserialize()
            .map_err(ConfigurationError::Cast)
    }
}

impl Configuration {
    pub fn try_default() -> Result<Self, ConfigurationError> {
        let mut paths = vec![
            PathBuf::from(format!("/usr/share/{}/config", env!("CARGO_PKG_NAME"))),
            PathBuf::from(format!("/etc/{}/config", env!("CARGO_PKG_NAME"))),
        ];

        if let Some(home) = env::var_os("HOME") {
            let home = PathBuf::from(home);

            paths.push(home.join(".config").join(env!("CARGO_PKG_NAME")).join("config"));
            paths.push(
                home.join(".local")
                    .join("share")
                    .join(env!("CARGO_PKG_NAME"))
                    .join("config"),
            );
        }

        paths.push(PathBuf::from("config"));

        paths
            .into_iter()
            .fold(builder()?, |builder, path| {
                builder.add_source(File::from(path).required(false))
            })
            .build()
            .map_err(ConfigurationError::Build)?
            .try_deserialize()
            .map_err(ConfigurationError::Cast)
    }

    /// logs the configuration in use
    pub fn help(&self) {
        info!(
            listen = self.operator.listen.to_string(),
            policy = self.status.policy.to_string(),
            timeout = self.status.timeout,
            requeue = self.reconciler.requeue,
            "Configuration loaded",
        );
    }
}
