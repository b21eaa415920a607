//! Control-plane client abstraction
//!
//! The control plane is the authoritative record of what exists. The
//! orchestrator only ever reads from it: before a tool call to resolve
//! versions, and after a tool call to confirm what actually happened.

use crate::resource::{
    EnvironmentVersion, ModelVersion, OnlineDeployment, OnlineEndpoint, VersionContainer,
    Workspace,
};
use crate::scope::Scope;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlPlaneError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ControlPlaneError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControlPlaneError::NotFound(_))
    }
}

/// Versioned resource family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionFamily {
    Environment,
    Model,
}

impl std::fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionFamily::Environment => write!(f, "environment"),
            VersionFamily::Model => write!(f, "model"),
        }
    }
}

/// Read-only view of the control plane
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn get_workspace(&self, scope: &Scope) -> Result<Workspace, ControlPlaneError>;

    /// Read the container record of an environment or model family
    async fn get_container(
        &self,
        scope: &Scope,
        family: VersionFamily,
        name: &str,
    ) -> Result<VersionContainer, ControlPlaneError>;

    async fn get_environment_version(
        &self,
        scope: &Scope,
        name: &str,
        version: &str,
    ) -> Result<EnvironmentVersion, ControlPlaneError>;

    async fn get_model_version(
        &self,
        scope: &Scope,
        name: &str,
        version: &str,
    ) -> Result<ModelVersion, ControlPlaneError>;

    async fn get_online_endpoint(
        &self,
        scope: &Scope,
        name: &str,
    ) -> Result<OnlineEndpoint, ControlPlaneError>;

    async fn get_online_deployment(
        &self,
        scope: &Scope,
        endpoint: &str,
        deployment: &str,
    ) -> Result<OnlineDeployment, ControlPlaneError>;
}

/// Produces an authenticated control-plane client
///
/// Called at most once per orchestrator.
#[async_trait]
pub trait ControlPlaneFactory: Send + Sync {
    async fn connect(
        &self,
        subscription_id: &str,
    ) -> Result<Arc<dyn ControlPlane>, ControlPlaneError>;
}
