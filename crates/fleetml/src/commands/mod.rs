pub mod endpoint;
pub mod provision;
pub mod workspace;

use crate::ScopeArgs;
use anyhow::Context as _;
use colored::Colorize;
use fleetml_cloud::{DotenvEnvStore, EnvStore, Orchestrator, ProvisionError, Scope};
use std::path::Path;
use std::sync::Arc;

/// Orchestrator and base scope for one CLI invocation
pub struct Session {
    pub orchestrator: Orchestrator,
    pub scope: Scope,
}

impl Session {
    /// Open the environment's dotenv store under `root` and build the scope
    ///
    /// Scope values missing from the flags and process environment are
    /// looked up in the store.
    pub fn open(args: &ScopeArgs, root: &Path) -> anyhow::Result<Self> {
        let store = DotenvEnvStore::open(root, &args.environment)
            .with_context(|| format!("Failed to open environment '{}'", args.environment))?;
        tracing::debug!("Using env file {}", store.path().display());

        let require = |flag: &Option<String>, key: &str, flag_name: &str| {
            scope_value(flag.as_deref(), &store, key, flag_name)
        };
        let scope = Scope::new(
            require(&args.subscription, "AZURE_SUBSCRIPTION_ID", "--subscription")?,
            require(&args.resource_group, "AZURE_RESOURCE_GROUP", "--resource-group")?,
            require(&args.workspace, "AZUREML_WORKSPACE_NAME", "--workspace")?,
        );

        let orchestrator = fleetml_cloud_azureml::orchestrator_from_env(Arc::new(store))
            .context("Failed to set up Azure ML clients")?;

        Ok(Self {
            orchestrator,
            scope,
        })
    }
}

fn scope_value(
    flag: Option<&str>,
    store: &dyn EnvStore,
    key: &str,
    flag_name: &str,
) -> anyhow::Result<String> {
    flag.map(str::to_string)
        .or_else(|| store.get(key))
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("{} or {} is required", flag_name, key))
}

/// Print captured tool output for a failed step before the error propagates
pub fn report(err: ProvisionError) -> anyhow::Error {
    if err.is_cancelled() {
        eprintln!("{}", "Cancelled".yellow());
    }
    if let Some((stdout, stderr)) = err.tool_output() {
        if !stdout.trim().is_empty() {
            eprintln!("{}", "--- tool stdout ---".dimmed());
            eprintln!("{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            eprintln!("{}", "--- tool stderr ---".dimmed());
            eprintln!("{}", stderr.trim_end());
        }
    }
    err.into()
}

/// Directory that holds `.fleetml/<env>/.env` when no project file is needed
pub fn default_root() -> anyhow::Result<std::path::PathBuf> {
    match fleetml_config::find_project_file() {
        Ok(path) => Ok(path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ".".into())),
        Err(_) => std::env::current_dir().context("Failed to read current directory"),
    }
}
