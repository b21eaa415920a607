//! Project file model (`fleetml.yaml`)

use crate::error::{ConfigError, Result};
use fleetml_cloud::{ComponentConfig, EndpointDeploymentConfig, ExpandableString, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service directory, relative to the project file
    #[serde(default = "default_project_dir")]
    pub project: PathBuf,

    #[serde(default)]
    pub config: MlServiceConfig,
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Resources a service provisions; every component is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MlServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<ExpandableString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<ComponentConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ComponentConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<ComponentConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<ComponentConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<ComponentConfig>,
}

impl MlServiceConfig {
    /// Kinds this service configures, in provisioning order
    pub fn kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::PROVISIONABLE
            .into_iter()
            .filter(|kind| self.component(*kind).is_some())
            .collect()
    }

    pub fn component(&self, kind: ResourceKind) -> Option<&ComponentConfig> {
        match kind {
            ResourceKind::Environment => self.environment.as_ref(),
            ResourceKind::Model => self.model.as_ref(),
            ResourceKind::Endpoint => self.endpoint.as_ref(),
            ResourceKind::Deployment => self.deployment.as_ref(),
            ResourceKind::Flow => self.flow.as_ref(),
            ResourceKind::Workspace => None,
        }
    }

    /// Deployment binding, when the service configures a deployment
    ///
    /// A deployment needs the environment and model it binds.
    pub fn deployment_config(&self, service: &str) -> Result<Option<EndpointDeploymentConfig>> {
        let Some(deployment) = &self.deployment else {
            return Ok(None);
        };

        let incomplete = |missing| ConfigError::IncompleteDeployment {
            service: service.to_string(),
            missing,
        };
        let environment = self
            .environment
            .clone()
            .ok_or_else(|| incomplete("environment"))?;
        let model = self.model.clone().ok_or_else(|| incomplete("model"))?;

        Ok(Some(EndpointDeploymentConfig {
            workspace: self.workspace.clone(),
            environment,
            model,
            deployment: deployment.clone(),
        }))
    }
}

/// A parsed project file and the directory it was found in
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn service(&self, name: &str) -> Result<&ServiceConfig> {
        self.config
            .services
            .get(name)
            .ok_or_else(|| ConfigError::UnknownService(name.to_string()))
    }

    /// Directory of `service`, against which definition paths are resolved
    pub fn service_path(&self, service: &ServiceConfig) -> PathBuf {
        if service.project.is_absolute() {
            service.project.clone()
        } else {
            self.root.join(&service.project)
        }
    }
}

/// Parse a project file; its parent directory becomes the project root
pub fn load_project(path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    tracing::debug!(
        "Loaded project '{}' with {} service(s) from {}",
        config.name,
        config.services.len(),
        path.display()
    );

    Ok(Project { root, config })
}
