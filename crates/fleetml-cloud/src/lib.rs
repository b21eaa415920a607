//! FleetML provisioning core
//!
//! This crate coordinates versioned ML resources (environments, models,
//! online endpoints, deployments and prompt flows) across two systems of
//! record: an external provisioning tool that performs the mutation, and a
//! control-plane API that is read to resolve versions and confirm the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  FleetML CLI                     │
//! │              (fleetml provision)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                fleetml-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Orchestrator → ProvisionStep driver     │   │
//! │  │   plan → invoke → confirm → publish       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────────┐     │
//! │  │ Template │ │ Versions │ │ Env store    │     │
//! │  └──────────┘ └──────────┘ └──────────────┘     │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ ControlPlane  │ │  ToolBridge   │
//! │ (ARM REST)    │ │ (python CLI)  │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! Concrete collaborators live in `fleetml-cloud-azureml`.

pub mod config;
pub mod control_plane;
pub mod env_store;
pub mod error;
pub mod kind;
pub mod orchestrator;
pub mod overrides;
pub mod probe;
pub mod publish;
pub mod resource;
pub mod scope;
pub mod step;
pub mod steps;
pub mod template;
pub mod tool;
pub mod version;

// Re-exports
pub use config::{ComponentConfig, EndpointDeploymentConfig};
pub use control_plane::{ControlPlane, ControlPlaneError, ControlPlaneFactory, VersionFamily};
pub use env_store::{DotenvEnvStore, EnvStore, EnvStoreError, MemoryEnvStore};
pub use error::{ProvisionError, Result};
pub use kind::ResourceKind;
pub use orchestrator::Orchestrator;
pub use overrides::{Overrides, apply_overrides};
pub use probe::FlowVerb;
pub use resource::{
    ArmResource, EnvironmentVersion, Flow, ModelVersion, OnlineDeployment, OnlineEndpoint,
    VersionContainer, Workspace,
};
pub use scope::Scope;
pub use step::{Invocation, Planned, ProvisionStep, StepContext};
pub use template::{ExpandableString, TemplateError};
pub use tool::{ToolArgs, ToolBridge, ToolError, ToolOutput, ToolProgram};
pub use version::{VersionRef, VersionResolver};

pub use tokio_util::sync::CancellationToken;
