use super::{Session, default_root, report};
use crate::ScopeArgs;
use colored::Colorize;
use fleetml_cloud::CancellationToken;

pub async fn handle_show(
    args: &ScopeArgs,
    name: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let session = Session::open(args, &default_root()?)?;

    let endpoint = session
        .orchestrator
        .get_endpoint(&session.scope, name, cancel)
        .await
        .map_err(report)?;

    let properties = &endpoint.properties;
    let unknown = || "-".to_string();

    println!("🔎 Endpoint: {}", endpoint.name_or(name).cyan());
    println!(
        "   State:       {}",
        properties.provisioning_state.clone().unwrap_or_else(unknown)
    );
    println!(
        "   Auth mode:   {}",
        properties.auth_mode.clone().unwrap_or_else(unknown)
    );
    println!(
        "   Scoring URI: {}",
        properties.scoring_uri.clone().unwrap_or_else(unknown)
    );

    match &properties.traffic {
        Some(traffic) if !traffic.is_empty() => {
            println!("   Traffic:");
            let mut entries: Vec<_> = traffic.iter().collect();
            entries.sort();
            for (deployment, percent) in entries {
                println!("     {} {}%", deployment, percent);
            }
        }
        _ => println!("   Traffic:     {}", "none".dimmed()),
    }

    Ok(())
}
