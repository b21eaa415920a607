use super::{Session, default_root, report};
use crate::ScopeArgs;
use colored::Colorize;
use fleetml_cloud::CancellationToken;

pub async fn handle_check(args: &ScopeArgs, cancel: &CancellationToken) -> anyhow::Result<()> {
    let session = Session::open(args, &default_root()?)?;

    println!("🔍 Checking workspace: {}", session.scope.to_string().dimmed());

    let workspace = session
        .orchestrator
        .ensure_workspace(&session.scope, cancel)
        .await
        .map_err(report)?;

    if let Some(friendly_name) = &workspace.properties.friendly_name {
        println!("   Friendly name: {}", friendly_name);
    }
    if let Some(state) = &workspace.properties.provisioning_state {
        println!("   State: {}", state);
    }
    println!(
        "{}",
        format!("✓ Workspace {} is reachable", session.scope.workspace())
            .green()
            .bold()
    );

    Ok(())
}
