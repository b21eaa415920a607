use super::{definition_path, resolve_name, resolve_overrides};
use crate::config::ComponentConfig;
use crate::control_plane::VersionFamily;
use crate::env_store::EnvStore;
use crate::error::Result;
use crate::kind::ResourceKind;
use crate::publish::ENVIRONMENT_NAME_KEY;
use crate::resource::EnvironmentVersion;
use crate::step::{Invocation, Planned, ProvisionStep, StepContext};
use crate::tool::{ToolArgs, ToolOutput};
use crate::version::VersionResolver;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// ML client `-t` value
const TOOL_TYPE: &str = "environment";

/// Creates a new environment version
///
/// Always creates: the version number comes from the container's
/// advertised next version.
#[derive(Debug, Clone)]
pub struct EnvironmentStep {
    name: String,
    definition: PathBuf,
    overrides: Vec<String>,
}

impl EnvironmentStep {
    pub fn prepare(
        service_path: &Path,
        config: &ComponentConfig,
        env: &dyn EnvStore,
    ) -> Result<Self> {
        let kind = ResourceKind::Environment;
        let definition = definition_path(kind, service_path, &config.path)?;
        let name = resolve_name(kind, &config.name, env)?;
        let overrides = resolve_overrides(&config.overrides, env)?;

        Ok(Self {
            name,
            definition,
            overrides,
        })
    }
}

#[async_trait]
impl ProvisionStep for EnvironmentStep {
    type Decision = String;
    type Output = EnvironmentVersion;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Environment
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, cx: &StepContext<'_>) -> Result<Planned<String>> {
        let resolver = VersionResolver::new(cx.control_plane, cx.scope);
        let next_version = cx
            .read(
                self.kind(),
                &self.name,
                resolver.next_version(VersionFamily::Environment, &self.name),
            )
            .await?;

        tracing::info!("Creating environment {} version {}", self.name, next_version);

        let args = ToolArgs::ml(TOOL_TYPE, cx.scope, &self.definition)
            .set("name", &self.name)
            .set("version", &next_version)
            .extend(self.overrides.iter().cloned())
            .into_vec();

        Ok(Planned::invoke(
            next_version,
            Invocation::new(self.kind().program(), args),
        ))
    }

    async fn confirm(
        &self,
        cx: &StepContext<'_>,
        version: String,
        _output: Option<ToolOutput>,
    ) -> Result<EnvironmentVersion> {
        cx.read(
            self.kind(),
            &self.name,
            cx.control_plane
                .get_environment_version(cx.scope, &self.name, &version),
        )
        .await
    }

    fn published(&self) -> Vec<(&'static str, String)> {
        vec![(ENVIRONMENT_NAME_KEY, self.name.clone())]
    }
}
