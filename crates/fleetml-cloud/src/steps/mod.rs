//! Per-kind provisioning steps

mod deployment;
mod endpoint;
mod environment;
mod flow;
mod model;

pub use deployment::{DEPLOYMENT_NAME_PREFIX, DeploymentStep, deployment_name};
pub use endpoint::EndpointStep;
pub use environment::EnvironmentStep;
pub use flow::{FlowStep, unique_flow_name};
pub use model::ModelStep;

use crate::env_store::EnvStore;
use crate::error::{ProvisionError, Result};
use crate::kind::ResourceKind;
use crate::overrides::{Overrides, apply_overrides};
use crate::template::ExpandableString;
use std::path::{Path, PathBuf};

/// Join `relative` to the service directory and make sure it exists
pub(crate) fn definition_path(
    kind: ResourceKind,
    service_path: &Path,
    relative: &Path,
) -> Result<PathBuf> {
    let path = service_path.join(relative);
    std::fs::metadata(&path).map_err(|source| ProvisionError::FileNotFound {
        kind,
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub(crate) fn resolve_name(
    kind: ResourceKind,
    template: &ExpandableString,
    env: &dyn EnvStore,
) -> Result<String> {
    template
        .expand(|key| env.get(key))
        .map_err(|source| ProvisionError::template(format!("{} name value", kind), source))
}

/// Expand overrides up front so template errors surface before any call
pub(crate) fn resolve_overrides(overrides: &Overrides, env: &dyn EnvStore) -> Result<Vec<String>> {
    Ok(apply_overrides(Vec::new(), overrides, |key| env.get(key))?)
}
