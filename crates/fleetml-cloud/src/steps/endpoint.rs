use super::{definition_path, resolve_name, resolve_overrides};
use crate::config::ComponentConfig;
use crate::env_store::EnvStore;
use crate::error::Result;
use crate::kind::ResourceKind;
use crate::probe::endpoint_exists;
use crate::publish::ENDPOINT_NAME_KEY;
use crate::resource::OnlineEndpoint;
use crate::step::{Invocation, Planned, ProvisionStep, StepContext};
use crate::tool::{ToolArgs, ToolOutput};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// ML client `-t` value
const TOOL_TYPE: &str = "online-endpoint";

/// Creates an online endpoint unless one already exists
///
/// Endpoints are create-once: an existing endpoint is never updated, but it
/// is still read back and returned.
#[derive(Debug, Clone)]
pub struct EndpointStep {
    name: String,
    definition: PathBuf,
    overrides: Vec<String>,
}

impl EndpointStep {
    pub fn prepare(
        service_path: &Path,
        config: &ComponentConfig,
        env: &dyn EnvStore,
    ) -> Result<Self> {
        let kind = ResourceKind::Endpoint;
        let name = resolve_name(kind, &config.name, env)?;
        let definition = definition_path(kind, service_path, &config.path)?;
        let overrides = resolve_overrides(&config.overrides, env)?;

        Ok(Self {
            name,
            definition,
            overrides,
        })
    }
}

#[async_trait]
impl ProvisionStep for EndpointStep {
    type Decision = ();
    type Output = OnlineEndpoint;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Endpoint
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, cx: &StepContext<'_>) -> Result<Planned<()>> {
        let exists = cx
            .read(
                self.kind(),
                &self.name,
                endpoint_exists(cx.control_plane, cx.scope, &self.name),
            )
            .await?;

        if exists {
            return Ok(Planned::skip(()));
        }

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
    ) -> Result<OnlineEndpoint> {
        cx.read(
            self.kind(),
            &self.name,
            cx.control_plane.get_online_endpoint(cx.scope, &self.name),
        )
        .await
    }

    fn published(&self) -> Vec<(&'static str, String)> {
        vec![(ENDPOINT_NAME_KEY, self.name.clone())]
    }
}
