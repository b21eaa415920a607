//! Provisioning orchestrator
//!
//! Entry point for callers: one method per resource kind, each resolving
//! its inputs, lazily connecting to the control plane and then driving the
//! matching [`ProvisionStep`] to completion.

use crate::config::{ComponentConfig, EndpointDeploymentConfig};
use crate::control_plane::{ControlPlane, ControlPlaneFactory};
use crate::env_store::EnvStore;
use crate::error::{ProvisionError, Result};
use crate::kind::ResourceKind;
use crate::resource::{
    EnvironmentVersion, Flow, ModelVersion, OnlineDeployment, OnlineEndpoint, Workspace,
};
use crate::scope::Scope;
use crate::step::{ProvisionStep, StepContext, execute};
use crate::steps::{DeploymentStep, EndpointStep, EnvironmentStep, FlowStep, ModelStep};
use crate::template::ExpandableString;
use crate::tool::ToolBridge;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

pub struct Orchestrator {
    factory: Arc<dyn ControlPlaneFactory>,
    tools: Arc<dyn ToolBridge>,
    env: Arc<dyn EnvStore>,
    control_plane: OnceCell<Arc<dyn ControlPlane>>,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<dyn ControlPlaneFactory>,
        tools: Arc<dyn ToolBridge>,
        env: Arc<dyn EnvStore>,
    ) -> Self {
        Self {
            factory,
            tools,
            env,
            control_plane: OnceCell::new(),
        }
    }

    pub fn env(&self) -> &dyn EnvStore {
        self.env.as_ref()
    }

    /// Scope for a service, switching workspace when the service names one
    pub fn resolve_scope(
        &self,
        base: &Scope,
        workspace: Option<&ExpandableString>,
    ) -> Result<Scope> {
        match workspace.filter(|w| !w.is_empty()) {
            Some(template) => {
                let name = template
                    .expand(|key| self.env.get(key))
                    .map_err(|e| ProvisionError::template("workspace name value", e))?;
                Ok(base.with_workspace(name))
            }
            None => Ok(base.clone()),
        }
    }

    /// Read the scope's workspace and check it is the one asked for
    #[instrument(skip_all, fields(scope = %scope))]
    pub async fn ensure_workspace(
        &self,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<Workspace> {
        let kind = ResourceKind::Workspace;
        let control_plane = self.init(kind, scope.workspace(), scope, cancel).await?;
        let cx = self.context(scope, control_plane.as_ref(), cancel);

        let workspace = cx
            .read(kind, scope.workspace(), control_plane.get_workspace(scope))
            .await?;

        // ARM names are case-insensitive
        let actual = workspace.name_or(scope.workspace());
        if !actual.eq_ignore_ascii_case(scope.workspace()) {
            return Err(ProvisionError::WorkspaceMismatch {
                expected: scope.workspace().to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(workspace)
    }

    #[instrument(skip_all, fields(service = %service_path.display()))]
    pub async fn create_environment_version(
        &self,
        scope: &Scope,
        service_path: &Path,
        config: &ComponentConfig,
        cancel: &CancellationToken,
    ) -> Result<EnvironmentVersion> {
        let step = EnvironmentStep::prepare(service_path, config, self.env())?;
        self.run(scope, &step, cancel).await
    }

    #[instrument(skip_all, fields(service = %service_path.display()))]
    pub async fn create_model_version(
        &self,
        scope: &Scope,
        service_path: &Path,
        config: &ComponentConfig,
        cancel: &CancellationToken,
    ) -> Result<ModelVersion> {
        let step = ModelStep::prepare(service_path, config, self.env())?;
        self.run(scope, &step, cancel).await
    }

    /// Create the endpoint if it is missing; an existing one is returned as-is
    #[instrument(skip_all, fields(service = %service_path.display()))]
    pub async fn create_or_update_endpoint(
        &self,
        scope: &Scope,
        service_path: &Path,
        config: &ComponentConfig,
        cancel: &CancellationToken,
    ) -> Result<OnlineEndpoint> {
        let step = EndpointStep::prepare(service_path, config, self.env())?;
        self.run(scope, &step, cancel).await
    }

    pub async fn get_endpoint(
        &self,
        scope: &Scope,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<OnlineEndpoint> {
        let kind = ResourceKind::Endpoint;
        let control_plane = self.init(kind, name, scope, cancel).await?;
        let cx = self.context(scope, control_plane.as_ref(), cancel);

        cx.read(kind, name, control_plane.get_online_endpoint(scope, name))
            .await
    }

    /// Deploy the latest environment and model versions to `endpoint_name`
    ///
    /// The deployment gets a fresh `fleetml-<unix seconds>` name on every call.
    /// Two calls for the same endpoint within one second share a name, and
    /// the second updates the first deployment.
    #[instrument(skip_all, fields(service = %service_path.display(), endpoint = %endpoint_name))]
    pub async fn deploy_to_endpoint(
        &self,
        scope: &Scope,
        service_path: &Path,
        endpoint_name: &str,
        config: &EndpointDeploymentConfig,
        cancel: &CancellationToken,
    ) -> Result<OnlineDeployment> {
        let step = DeploymentStep::prepare(
            service_path,
            endpoint_name,
            config,
            self.env(),
            unix_now(),
        )?;
        self.run(scope, &step, cancel).await
    }

    #[instrument(skip_all, fields(service = %service_path.display()))]
    pub async fn create_or_update_flow(
        &self,
        scope: &Scope,
        service_path: &Path,
        config: &ComponentConfig,
        cancel: &CancellationToken,
    ) -> Result<Flow> {
        let step = FlowStep::prepare(service_path, config, self.env(), unix_now())?;
        self.run(scope, &step, cancel).await
    }

    async fn run<S>(&self, scope: &Scope, step: &S, cancel: &CancellationToken) -> Result<S::Output>
    where
        S: ProvisionStep,
    {
        let control_plane = self.init(step.kind(), step.name(), scope, cancel).await?;
        let cx = self.context(scope, control_plane.as_ref(), cancel);
        execute(step, &cx).await
    }

    fn context<'a>(
        &'a self,
        scope: &'a Scope,
        control_plane: &'a dyn ControlPlane,
        cancel: &'a CancellationToken,
    ) -> StepContext<'a> {
        StepContext {
            scope,
            control_plane,
            tools: self.tools.as_ref(),
            env: self.env.as_ref(),
            cancel,
        }
    }

    /// Connect to the control plane and initialize the tool bridge, once
    ///
    /// Concurrent first calls share one initialization. A failed attempt
    /// leaves the cell empty so the next call retries.
    async fn init(
        &self,
        kind: ResourceKind,
        name: &str,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn ControlPlane>> {
        let init = self.control_plane.get_or_try_init(|| async {
            tracing::debug!(
                "Connecting to control plane for subscription {}",
                scope.subscription_id()
            );
            let control_plane = self
                .factory
                .connect(scope.subscription_id())
                .await
                .map_err(ProvisionError::ControlPlaneInit)?;

            self.tools
                .initialize()
                .await
                .map_err(ProvisionError::ToolInit)?;

            Ok::<_, ProvisionError>(control_plane)
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProvisionError::Cancelled {
                kind,
                name: name.to_string(),
            }),
            control_plane = init => control_plane.map(Arc::clone),
        }
    }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
