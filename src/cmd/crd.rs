//! # Custom resource definition module
//!
//! This module provides custom resource module command line interface function
//! implementation

use std::{error::Error, str::FromStr, sync::Arc};

use async_trait::async_trait;
use clap::Subcommand;
use kube::CustomResourceExt;

use crate::{
    cmd::Executor,
    svc::{
        self,
        cfg::Configuration,
        crd::mongodb::MongoDb,
        k8s::registry::{self, Registry},
    },
};

// -----------------------------------------------------------------------------
// CustomResource enum

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub enum CustomResource {
    MongoDb,
}

impl FromStr for CustomResource {
    type Err = Box<dyn Error + Send + Sync>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" => Ok(Self::MongoDb),
            _ => Err(format!("failed to parse '{s}', available option is 'mongodb'").into()),
        }
    }
}

impl CustomResource {
    /// returns the kind of the custom resource as registered
    pub fn kind(&self) -> String {
        match self {
            Self::MongoDb => MongoDb::api_resource().kind,
        }
    }
}

// -----------------------------------------------------------------------------
// CustomResourceDefinitionError enum

#[derive(thiserror::Error, Debug)]
pub enum CustomResourceDefinitionError {
    #[error("failed to serialize custom resource definition, {0}")]
    Serialize(serde_yaml::Error),
    #[error("failed to register custom resources, {0}")]
    Registry(registry::Error),
    #[error("custom resource of kind '{0}' is not registered")]
    Unregistered(String),
}

// -----------------------------------------------------------------------------
// CustomResourceDefinition enum

#[derive(Subcommand, Clone, Debug)]
pub enum CustomResourceDefinition {
    /// View custom resource definition
    #[clap(name = "view", aliases = &["v"])]
    View {
        #[clap(value_name = "CUSTOM_RESOURCE")]
        custom_resource: Option<CustomResource>,
    },
}

#[async_trait]
impl Executor for CustomResourceDefinition {
    type Error = CustomResourceDefinitionError;

    async fn execute(&self, config: Arc<Configuration>) -> Result<(), Self::Error> {
        match self {
            Self::View { custom_resource } => view(config, custom_resource).await,
        }
    }
}

// -----------------------------------------------------------------------------
// view function

/// returns the yaml documents of the requested custom resource definitions
pub fn render(
    registry: &Registry,
    custom_resource: &Option<CustomResource>,
) -> Result<String, CustomResourceDefinitionError> {
    let crds = match custom_resource {
        Some(cr) => {
            let kind = cr.kind();

            vec![registry
                .get(&kind)
                .ok_or(CustomResourceDefinitionError::Unregistered(kind))?
                .crd()]
        }
        None => registry.crds(),
    };

    let documents = crds
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(CustomResourceDefinitionError::Serialize)?;

    Ok(documents.join("---\n"))
}

pub async fn view(
    _config: Arc<Configuration>,
    custom_resource: &Option<CustomResource>,
) -> Result<(), CustomResourceDefinitionError> {
    let registry = svc::crd::registry().map_err(CustomResourceDefinitionError::Registry)?;

    print!("{}", render(&registry, custom_resource)?);
    Ok(())
}
