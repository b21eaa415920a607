//! Deployment scope

use serde::{Deserialize, Serialize};

/// The control-plane namespace every operation targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    subscription_id: String,
    resource_group: String,
    workspace: String,
}

impl Scope {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        workspace: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            workspace: workspace.into(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Same subscription and resource group, different workspace
    pub fn with_workspace(&self, workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subscription_id, self.resource_group, self.workspace
        )
    }
}
