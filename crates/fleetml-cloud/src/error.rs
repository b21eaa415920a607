//! Provisioning error types

use crate::control_plane::ControlPlaneError;
use crate::env_store::EnvStoreError;
use crate::kind::ResourceKind;
use crate::overrides::OverrideError;
use crate::template::TemplateError;
use crate::tool::ToolError;
use std::path::PathBuf;
use thiserror::Error;

/// Provisioning errors
///
/// Every variant that belongs to a step carries the resource kind and the
/// resolved name (when resolution got that far) so a failure can be
/// diagnosed without re-running.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{kind} definition file not found: {}", path.display())]
    FileNotFound {
        kind: ResourceKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing {what}: {source}")]
    Template {
        what: String,
        #[source]
        source: TemplateError,
    },

    #[error("control plane read failed for {kind} '{name}': {source}")]
    ControlPlane {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ControlPlaneError,
    },

    #[error("{kind} '{name}' tool invocation failed: {source}")]
    ToolInvocation {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ToolError,
    },

    #[error("failed to parse {kind} '{name}' tool result: {source}")]
    ResultParse {
        kind: ResourceKind,
        name: String,
        stdout: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} '{name}' provisioning was cancelled")]
    Cancelled { kind: ResourceKind, name: String },

    #[error("control plane client initialization failed: {0}")]
    ControlPlaneInit(#[source] ControlPlaneError),

    #[error("tool bridge initialization failed: {0}")]
    ToolInit(#[source] ToolError),

    #[error("workspace mismatch: expected '{expected}', control plane returned '{actual}'")]
    WorkspaceMismatch { expected: String, actual: String },

    #[error("environment store error: {0}")]
    EnvStore(#[from] EnvStoreError),
}

impl ProvisionError {
    /// Wrap a template failure for the named value (e.g. "model name")
    pub fn template(what: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            what: what.into(),
            source,
        }
    }

    /// Captured tool output, if this error came from a failed tool run
    pub fn tool_output(&self) -> Option<(&str, &str)> {
        match self {
            Self::ToolInvocation { source, .. } => source.captured_output(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<OverrideError> for ProvisionError {
    fn from(err: OverrideError) -> Self {
        Self::Template {
            what: format!("override '{}'", err.key),
            source: err.source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
