//! Declarative component configuration

use crate::overrides::Overrides;
use crate::template::ExpandableString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One resource to provision
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Name template, expanded against the environment store
    #[serde(default, skip_serializing_if = "ExpandableString::is_empty")]
    pub name: ExpandableString,

    /// Definition file (or flow directory), relative to the service directory
    #[serde(default)]
    pub path: PathBuf,

    /// `--set` overrides forwarded to the tool
    #[serde(default, skip_serializing_if = "Overrides::is_empty")]
    pub overrides: Overrides,
}

impl ComponentConfig {
    pub fn new(name: impl Into<ExpandableString>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            overrides: Overrides::new(),
        }
    }

    pub fn with_override(
        mut self,
        key: impl Into<String>,
        value: impl Into<ExpandableString>,
    ) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }
}

/// Binding of a model version and an environment version into a deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointDeploymentConfig {
    /// Workspace name template, when the service overrides the scope's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<ExpandableString>,

    /// Environment whose latest version is bound
    pub environment: ComponentConfig,

    /// Model whose latest version is bound
    pub model: ComponentConfig,

    /// Deployment definition; its `name` is ignored, deployments are always freshly named
    pub deployment: ComponentConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_config_yaml() {
        let yaml = r#"
name: model-${ENV}
path: deployment/model.yaml
overrides:
  description: "built from ${GIT_SHA}"
"#;
        let config: ComponentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name.template(), "model-${ENV}");
        assert_eq!(config.path, PathBuf::from("deployment/model.yaml"));
        assert_eq!(
            config.overrides.get("description").unwrap().template(),
            "built from ${GIT_SHA}"
        );
    }

    #[test]
    fn test_endpoint_deployment_config_yaml() {
        let yaml = r#"
environment:
  name: env-${ENV}
model:
  name: model-${ENV}
deployment:
  path: deployment/deployment.yaml
"#;
        let config: EndpointDeploymentConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.workspace.is_none());
        assert_eq!(config.environment.name.template(), "env-${ENV}");
        assert!(config.deployment.overrides.is_empty());
    }
}
