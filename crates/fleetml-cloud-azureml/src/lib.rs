//! Azure Machine Learning collaborators for FleetML
//!
//! This crate provides the concrete control plane and tool bridge used by
//! the `fleetml-cloud` orchestrator.
//!
//! # Features
//!
//! - ARM REST control plane (workspaces, environment/model containers and
//!   versions, online endpoints and deployments)
//! - Azure CLI and static token credentials
//! - Python bridge running `ml_client.py` / `pf_client.py`
//!
//! # Requirements
//!
//! - `az` CLI logged in, or `AZURE_ACCESS_TOKEN` set
//! - A Python interpreter (`FLEETML_PYTHON`, default `python3`) and the
//!   client scripts (`FLEETML_SCRIPTS_DIR`)
//!
//! # Example
//!
//! ```ignore
//! use fleetml_cloud::{CancellationToken, MemoryEnvStore, Scope};
//! use std::sync::Arc;
//!
//! let orchestrator = fleetml_cloud_azureml::orchestrator_from_env(Arc::new(MemoryEnvStore::new()))?;
//! let scope = Scope::new("sub", "rg", "ws");
//! orchestrator.ensure_workspace(&scope, &CancellationToken::new()).await?;
//! ```

pub mod arm;
pub mod bridge;
pub mod credential;
pub mod error;

pub use arm::{ArmControlPlane, ArmControlPlaneFactory, CredentialSource};
pub use bridge::PythonBridge;
pub use credential::{AzureCliCredential, StaticTokenCredential, TokenCredential};
pub use error::{AzureMlError, Result};

use fleetml_cloud::{EnvStore, Orchestrator};
use std::sync::Arc;

/// Orchestrator backed by ARM and the Python bridge, configured from the
/// process environment
pub fn orchestrator_from_env(env: Arc<dyn EnvStore>) -> Result<Orchestrator> {
    let factory = ArmControlPlaneFactory::from_env();
    let bridge = PythonBridge::from_env()?;
    Ok(Orchestrator::new(Arc::new(factory), Arc::new(bridge), env))
}
