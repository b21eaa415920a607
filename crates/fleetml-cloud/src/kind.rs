//! Resource kinds and their per-kind provisioning policy

use crate::publish;
use crate::tool::ToolProgram;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of resource handled by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// The workspace the scope points at (read only)
    Workspace,
    /// Execution environment version
    Environment,
    /// Model version
    Model,
    /// Online inference endpoint
    Endpoint,
    /// Deployment binding a model and environment version to an endpoint
    Deployment,
    /// Prompt flow
    Flow,
}

impl ResourceKind {
    /// Kinds that can be provisioned, in pipeline order
    pub const PROVISIONABLE: [ResourceKind; 5] = [
        ResourceKind::Environment,
        ResourceKind::Model,
        ResourceKind::Endpoint,
        ResourceKind::Deployment,
        ResourceKind::Flow,
    ];

    /// Program that provisions this kind
    pub fn program(&self) -> ToolProgram {
        match self {
            ResourceKind::Flow => ToolProgram::PromptFlowClient,
            _ => ToolProgram::MlClient,
        }
    }

    /// Environment store key the resolved name is published under
    pub fn publish_key(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Environment => Some(publish::ENVIRONMENT_NAME_KEY),
            ResourceKind::Model => Some(publish::MODEL_NAME_KEY),
            ResourceKind::Endpoint => Some(publish::ENDPOINT_NAME_KEY),
            ResourceKind::Deployment => Some(publish::DEPLOYMENT_NAME_KEY),
            ResourceKind::Flow => Some(publish::FLOW_NAME_KEY),
            ResourceKind::Workspace => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Workspace => write!(f, "workspace"),
            ResourceKind::Environment => write!(f, "environment"),
            ResourceKind::Model => write!(f, "model"),
            ResourceKind::Endpoint => write!(f, "endpoint"),
            ResourceKind::Deployment => write!(f, "deployment"),
            ResourceKind::Flow => write!(f, "flow"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workspace" => Ok(ResourceKind::Workspace),
            "environment" | "env" => Ok(ResourceKind::Environment),
            "model" => Ok(ResourceKind::Model),
            "endpoint" | "online-endpoint" => Ok(ResourceKind::Endpoint),
            "deployment" | "online-deployment" => Ok(ResourceKind::Deployment),
            "flow" => Ok(ResourceKind::Flow),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}
