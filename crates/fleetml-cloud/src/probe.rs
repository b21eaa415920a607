//! Existence probes
//!
//! Probes are read-only checks whose only purpose is to pick a branch.

use crate::control_plane::{ControlPlane, ControlPlaneError};
use crate::scope::Scope;
use crate::tool::{ToolArgs, ToolBridge, ToolError, ToolProgram};

/// Verb used for the mutating prompt-flow call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowVerb {
    Create,
    Update,
}

impl std::fmt::Display for FlowVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowVerb::Create => write!(f, "create"),
            FlowVerb::Update => write!(f, "update"),
        }
    }
}

/// Whether an online endpoint already exists
///
/// Not-found is an answer, not an error; every other failure is returned.
pub async fn endpoint_exists(
    control_plane: &dyn ControlPlane,
    scope: &Scope,
    name: &str,
) -> Result<bool, ControlPlaneError> {
    match control_plane.get_online_endpoint(scope, name).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Arguments of the prompt-flow `show` probe
pub fn flow_show_args(scope: &Scope, flow_name: &str) -> ToolArgs {
    ToolArgs::new()
        .arg("show")
        .flag("-s", scope.subscription_id())
        .flag("-w", scope.workspace())
        .flag("-g", scope.resource_group())
        .flag("-n", flow_name)
}

/// Ask the prompt-flow client whether `flow_name` exists.
///
/// A run that completes with a failing status means the flow is absent and
/// selects [`FlowVerb::Create`]. Failures to run the client at all are
/// returned, since they say nothing about the flow.
pub async fn probe_flow(
    tools: &dyn ToolBridge,
    scope: &Scope,
    flow_name: &str,
) -> Result<FlowVerb, ToolError> {
    let args = flow_show_args(scope, flow_name);
    match tools.run(ToolProgram::PromptFlowClient, args.as_slice()).await {
        Ok(_) => Ok(FlowVerb::Update),
        Err(e) if e.is_failed_run() => {
            tracing::debug!(flow = %flow_name, error = %e, "Flow probe failed, treating flow as absent");
            Ok(FlowVerb::Create)
        }
        Err(e) => Err(e),
    }
}
