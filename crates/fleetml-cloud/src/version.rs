//! Version resolution for environment and model families
//!
//! Creation asks for the *next* version; binding a deployment asks for the
//! *latest existing* one. Mixing them up either collides with a version that
//! is being created or binds a stale one.

use crate::control_plane::{ControlPlane, ControlPlaneError, VersionFamily};
use crate::scope::Scope;

/// Version used when a family has no container yet
pub const INITIAL_VERSION: &str = "1";

/// A concrete version of a named family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub name: String,
    pub version: String,
}

impl VersionRef {
    /// Asset reference understood by the ML client (`azureml:<name>:<version>`)
    pub fn asset_id(&self) -> String {
        format!("azureml:{}:{}", self.name, self.version)
    }
}

impl std::fmt::Display for VersionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

pub struct VersionResolver<'a> {
    control_plane: &'a dyn ControlPlane,
    scope: &'a Scope,
}

impl<'a> VersionResolver<'a> {
    pub fn new(control_plane: &'a dyn ControlPlane, scope: &'a Scope) -> Self {
        Self {
            control_plane,
            scope,
        }
    }

    /// Version the next create of `name` should use
    ///
    /// A missing container means the family is new and starts at
    /// [`INITIAL_VERSION`]. Any other read failure is returned.
    pub async fn next_version(
        &self,
        family: VersionFamily,
        name: &str,
    ) -> Result<String, ControlPlaneError> {
        match self.control_plane.get_container(self.scope, family, name).await {
            Ok(container) => Ok(container
                .properties
                .next_version
                .unwrap_or_else(|| INITIAL_VERSION.to_string())),
            Err(e) if e.is_not_found() => {
                tracing::debug!(family = %family, name = %name, "No container yet, starting at version {}", INITIAL_VERSION);
                Ok(INITIAL_VERSION.to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Latest existing version of `name`; the container must exist
    pub async fn latest(
        &self,
        family: VersionFamily,
        name: &str,
    ) -> Result<VersionRef, ControlPlaneError> {
        let container = self
            .control_plane
            .get_container(self.scope, family, name)
            .await?;

        Ok(VersionRef {
            name: container.name_or(name).to_string(),
            version: container
                .properties
                .latest_version
                .unwrap_or_else(|| INITIAL_VERSION.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id() {
        let version = VersionRef {
            name: "env-prod".to_string(),
            version: "7".to_string(),
        };
        assert_eq!(version.asset_id(), "azureml:env-prod:7");
        assert_eq!(version.to_string(), "env-prod:7");
    }
}
