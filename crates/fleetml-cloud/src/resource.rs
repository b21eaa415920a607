//! Canonical resource records
//!
//! These are only ever produced by reading the control plane (or, for flows,
//! by parsing the tool's output). The orchestrator never fabricates them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// ARM resource envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmResource<P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    pub properties: P,
}

impl<P> ArmResource<P> {
    pub fn new(name: impl Into<String>, properties: P) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            resource_type: None,
            properties,
        }
    }

    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }
}

/// Properties of a versioned resource family (environment or model container)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerProperties {
    pub next_version: Option<String>,
    pub latest_version: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentVersionProperties {
    pub image: Option<String>,
    pub description: Option<String>,
    pub provisioning_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelVersionProperties {
    pub model_uri: Option<String>,
    pub model_type: Option<String>,
    pub description: Option<String>,
    pub provisioning_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnlineEndpointProperties {
    pub auth_mode: Option<String>,
    pub scoring_uri: Option<String>,
    pub swagger_uri: Option<String>,
    pub provisioning_state: Option<String>,
    pub traffic: Option<HashMap<String, u32>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnlineDeploymentProperties {
    pub model: Option<String>,
    pub environment_id: Option<String>,
    pub instance_type: Option<String>,
    pub endpoint_compute_type: Option<String>,
    pub provisioning_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceProperties {
    pub friendly_name: Option<String>,
    pub discovery_url: Option<String>,
    pub provisioning_state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type VersionContainer = ArmResource<ContainerProperties>;
pub type EnvironmentVersion = ArmResource<EnvironmentVersionProperties>;
pub type ModelVersion = ArmResource<ModelVersionProperties>;
pub type OnlineEndpoint = ArmResource<OnlineEndpointProperties>;
pub type OnlineDeployment = ArmResource<OnlineDeploymentProperties>;
pub type Workspace = ArmResource<WorkspaceProperties>;

/// Prompt flow, as printed by the prompt-flow client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flow {
    pub name: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub flow_type: Option<String>,
    pub path: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub tags: Option<HashMap<String, String>>,
    pub created_date: Option<String>,
    pub flow_portal_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
