use super::{definition_path, resolve_name, resolve_overrides};
use crate::config::ComponentConfig;
use crate::env_store::EnvStore;
use crate::error::{ProvisionError, Result};
use crate::kind::ResourceKind;
use crate::probe::{FlowVerb, probe_flow};
use crate::publish::FLOW_NAME_KEY;
use crate::resource::Flow;
use crate::scope::Scope;
use crate::step::{Invocation, Planned, ProvisionStep, StepContext};
use crate::tool::{ToolArgs, ToolOutput};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Flow names get a timestamp suffix so repeated runs do not clash
pub fn unique_flow_name(name: &str, unix_secs: i64) -> String {
    format!("{}-{}", name, unix_secs)
}

/// Creates or updates a prompt flow
///
/// Existence is decided by the prompt-flow client's own `show` command,
/// and the resulting record is whatever the client prints.
#[derive(Debug, Clone)]
pub struct FlowStep {
    name: String,
    directory: PathBuf,
    overrides: Vec<String>,
}

impl FlowStep {
    pub fn prepare(
        service_path: &Path,
        config: &ComponentConfig,
        env: &dyn EnvStore,
        unix_secs: i64,
    ) -> Result<Self> {
        let kind = ResourceKind::Flow;
        let name = resolve_name(kind, &config.name, env)?;
        let directory = definition_path(kind, service_path, &config.path)?;
        let overrides = resolve_overrides(&config.overrides, env)?;

        Ok(Self {
            name: unique_flow_name(&name, unix_secs),
            directory,
            overrides,
        })
    }

    fn args(&self, verb: FlowVerb, scope: &Scope) -> Vec<String> {
        let args = ToolArgs::new().arg(verb.to_string()).flag("-n", &self.name);
        let args = match verb {
            FlowVerb::Create => args.flag("-f", self.directory.display().to_string()),
            FlowVerb::Update => args,
        };

        args.flag("-s", scope.subscription_id())
            .flag("-w", scope.workspace())
            .flag("-g", scope.resource_group())
            .extend(self.overrides.iter().cloned())
            .into_vec()
    }
}

#[async_trait]
impl ProvisionStep for FlowStep {
    type Decision = FlowVerb;
    type Output = Flow;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Flow
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, cx: &StepContext<'_>) -> Result<Planned<FlowVerb>> {
        let verb = cx
            .cancellable(
                self.kind(),
                &self.name,
                probe_flow(cx.tools, cx.scope, &self.name),
            )
            .await?
            .map_err(|source| ProvisionError::ToolInvocation {
                kind: self.kind(),
                name: self.name.clone(),
                source,
            })?;

        tracing::info!(verb = %verb, "Provisioning flow {}", self.name);

        let args = self.args(verb, cx.scope);
        Ok(Planned::invoke(
            verb,
            Invocation::new(self.kind().program(), args),
        ))
    }

    async fn confirm(
        &self,
        _cx: &StepContext<'_>,
        _verb: FlowVerb,
        output: Option<ToolOutput>,
    ) -> Result<Flow> {
        let stdout = output.map(|o| o.stdout).unwrap_or_default();

        serde_json::from_str(stdout.trim()).map_err(|source| ProvisionError::ResultParse {
            kind: self.kind(),
            name: self.name.clone(),
            stdout,
            source,
        })
    }

    fn published(&self) -> Vec<(&'static str, String)> {
        vec![(FLOW_NAME_KEY, self.name.clone())]
    }
}
