use super::{Session, report};
use crate::ScopeArgs;
use anyhow::Context as _;
use colored::Colorize;
use fleetml_cloud::publish::ENDPOINT_NAME_KEY;
use fleetml_cloud::{CancellationToken, EnvStore, Orchestrator, ResourceKind};

pub async fn handle(
    args: &ScopeArgs,
    service_name: &str,
    only: &[ResourceKind],
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let project = fleetml_config::discover_project()?;
    let service = project.service(service_name)?;
    let service_path = project.service_path(service);
    let config = &service.config;
    let deployment = config.deployment_config(service_name)?;

    let kinds: Vec<ResourceKind> = config
        .kinds()
        .into_iter()
        .filter(|kind| only.is_empty() || only.contains(kind))
        .collect();
    if kinds.is_empty() {
        println!(
            "{}",
            format!("Service '{}' has nothing to provision", service_name).yellow()
        );
        return Ok(());
    }

    let session = Session::open(args, &project.root)?;
    let orchestrator = &session.orchestrator;
    let scope = orchestrator
        .resolve_scope(&session.scope, config.workspace.as_ref())
        .map_err(report)?;

    println!("🚀 Provisioning service: {}", service_name.cyan());
    println!("   Workspace: {}", scope.to_string().dimmed());
    println!();

    orchestrator
        .ensure_workspace(&scope, cancel)
        .await
        .map_err(report)?;
    println!("  {} workspace {}", "✓".green(), scope.workspace());

    let mut endpoint_name: Option<String> = None;

    for kind in kinds {
        match kind {
            ResourceKind::Environment => {
                let Some(component) = &config.environment else {
                    continue;
                };
                let version = orchestrator
                    .create_environment_version(&scope, &service_path, component, cancel)
                    .await
                    .map_err(report)?;
                print_versioned(kind, &published(orchestrator, kind), version.name.as_deref());
            }
            ResourceKind::Model => {
                let Some(component) = &config.model else {
                    continue;
                };
                let version = orchestrator
                    .create_model_version(&scope, &service_path, component, cancel)
                    .await
                    .map_err(report)?;
                print_versioned(kind, &published(orchestrator, kind), version.name.as_deref());
            }
            ResourceKind::Endpoint => {
                let Some(component) = &config.endpoint else {
                    continue;
                };
                let endpoint = orchestrator
                    .create_or_update_endpoint(&scope, &service_path, component, cancel)
                    .await
                    .map_err(report)?;
                let name = published(orchestrator, kind);
                println!("  {} endpoint {}", "✓".green(), name.cyan());
                if let Some(uri) = &endpoint.properties.scoring_uri {
                    println!("      {}", uri.dimmed());
                }
                endpoint_name = Some(name);
            }
            ResourceKind::Deployment => {
                let Some(deployment) = &deployment else {
                    continue;
                };
                let endpoint = endpoint_name
                    .clone()
                    .or_else(|| orchestrator.env().get(ENDPOINT_NAME_KEY))
                    .with_context(|| {
                        format!(
                            "Deployment needs an endpoint: configure one for '{}' or set {}",
                            service_name, ENDPOINT_NAME_KEY
                        )
                    })?;
                let record = orchestrator
                    .deploy_to_endpoint(&scope, &service_path, &endpoint, deployment, cancel)
                    .await
                    .map_err(report)?;
                println!(
                    "  {} deployment {} → {}",
                    "✓".green(),
                    published(orchestrator, kind).cyan(),
                    endpoint
                );
                let properties = &record.properties;
                if let (Some(environment), Some(model)) =
                    (&properties.environment_id, &properties.model)
                {
                    println!("      {} {}", environment.dimmed(), model.dimmed());
                }
            }
            ResourceKind::Flow => {
                let Some(component) = &config.flow else {
                    continue;
                };
                let flow = orchestrator
                    .create_or_update_flow(&scope, &service_path, component, cancel)
                    .await
                    .map_err(report)?;
                println!(
                    "  {} flow {}",
                    "✓".green(),
                    published(orchestrator, kind).cyan()
                );
                if let Some(url) = &flow.flow_portal_url {
                    println!("      {}", url.dimmed());
                }
            }
            ResourceKind::Workspace => {}
        }
    }

    println!();
    println!("{}", "✓ Provisioning complete".green().bold());

    Ok(())
}

/// Name the step published for `kind`
fn published(orchestrator: &Orchestrator, kind: ResourceKind) -> String {
    kind.publish_key()
        .and_then(|key| orchestrator.env().get(key))
        .unwrap_or_default()
}

fn print_versioned(kind: ResourceKind, name: &str, version: Option<&str>) {
    match version {
        Some(version) => println!(
            "  {} {} {} version {}",
            "✓".green(),
            kind,
            name.cyan(),
            version
        ),
        None => println!("  {} {} {}", "✓".green(), kind, name.cyan()),
    }
}
