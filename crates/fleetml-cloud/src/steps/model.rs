use super::{definition_path, resolve_name, resolve_overrides};
use crate::config::ComponentConfig;
use crate::control_plane::VersionFamily;
use crate::env_store::EnvStore;
use crate::error::Result;
use crate::kind::ResourceKind;
use crate::publish::MODEL_NAME_KEY;
use crate::resource::ModelVersion;
use crate::step::{Invocation, Planned, ProvisionStep, StepContext};
use crate::tool::{ToolArgs, ToolOutput};
use crate::version::VersionResolver;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// ML client `-t` value
const TOOL_TYPE: &str = "model";

/// Registers a model version
///
/// The tool picks the version number; the result is read back through the
/// container's latest version.
#[derive(Debug, Clone)]
pub struct ModelStep {
    name: String,
    definition: PathBuf,
    overrides: Vec<String>,
}

impl ModelStep {
    pub fn prepare(
        service_path: &Path,
        config: &ComponentConfig,
        env: &dyn EnvStore,
    ) -> Result<Self> {
        let kind = ResourceKind::Model;
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
impl ProvisionStep for ModelStep {
    type Decision = ();
    type Output = ModelVersion;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Model
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, cx: &StepContext<'_>) -> Result<Planned<()>> {
        let args = ToolArgs::ml(TOOL_TYPE, cx.scope, &self.definition)
            .set("name", &self.name)
            .extend(self.overrides.iter().cloned())
            .into_vec();

        Ok(Planned::invoke((), Invocation::new(self.kind().program(), args)))
    }

    async fn confirm(
        &self,
        cx: &StepContext<'_>,
        _decision: (),
        _output: Option<ToolOutput>,
    ) -> Result<ModelVersion> {
        let resolver = VersionResolver::new(cx.control_plane, cx.scope);
        let latest = cx
            .read(
                self.kind(),
                &self.name,
                resolver.latest(VersionFamily::Model, &self.name),
            )
            .await?;

        cx.read(
            self.kind(),
            &self.name,
            cx.control_plane
                .get_model_version(cx.scope, &self.name, &latest.version),
        )
        .await
    }

    fn published(&self) -> Vec<(&'static str, String)> {
        vec![(MODEL_NAME_KEY, self.name.clone())]
    }
}
