use super::{definition_path, resolve_overrides};
use crate::config::EndpointDeploymentConfig;
use crate::control_plane::VersionFamily;
use crate::env_store::EnvStore;
use crate::error::{ProvisionError, Result};
use crate::kind::ResourceKind;
use crate::publish::{DEPLOYMENT_NAME_KEY, ENDPOINT_NAME_KEY};
use crate::resource::OnlineDeployment;
use crate::step::{Invocation, Planned, ProvisionStep, StepContext};
use crate::tool::{ToolArgs, ToolOutput};
use crate::version::{VersionRef, VersionResolver};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// ML client `-t` value
const TOOL_TYPE: &str = "online-deployment";

/// Prefix of generated deployment names
pub const DEPLOYMENT_NAME_PREFIX: &str = "fleetml";

/// `<prefix>-<unix seconds>`
///
/// Two deployments created within the same second get the same name.
pub fn deployment_name(prefix: &str, unix_secs: i64) -> String {
    format!("{}-{}", prefix, unix_secs)
}

/// Deploys the latest environment and model versions to an endpoint
#[derive(Debug, Clone)]
pub struct DeploymentStep {
    name: String,
    endpoint: String,
    environment: String,
    model: String,
    definition: PathBuf,
    overrides: Vec<String>,
}

impl DeploymentStep {
    /// Resolve every input; `unix_secs` seeds the fresh deployment name
    pub fn prepare(
        service_path: &Path,
        endpoint_name: &str,
        config: &EndpointDeploymentConfig,
        env: &dyn EnvStore,
        unix_secs: i64,
    ) -> Result<Self> {
        let lookup = |key: &str| env.get(key);

        let environment = config
            .environment
            .name
            .expand(lookup)
            .map_err(|e| ProvisionError::template("environment name value", e))?;
        let model = config
            .model
            .name
            .expand(lookup)
            .map_err(|e| ProvisionError::template("model name value", e))?;

        let definition = definition_path(
            ResourceKind::Deployment,
            service_path,
            &config.deployment.path,
        )?;
        let overrides = resolve_overrides(&config.deployment.overrides, env)?;

        Ok(Self {
            name: deployment_name(DEPLOYMENT_NAME_PREFIX, unix_secs),
            endpoint: endpoint_name.to_string(),
            environment,
            model,
            definition,
            overrides,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Version refs bound into the deployment
#[derive(Debug, Clone)]
pub struct Bindings {
    pub environment: VersionRef,
    pub model: VersionRef,
}

#[async_trait]
impl ProvisionStep for DeploymentStep {
    type Decision = Bindings;
    type Output = OnlineDeployment;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployment
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, cx: &StepContext<'_>) -> Result<Planned<Bindings>> {
        let resolver = VersionResolver::new(cx.control_plane, cx.scope);

        let environment = cx
            .read(
                ResourceKind::Environment,
                &self.environment,
                resolver.latest(VersionFamily::Environment, &self.environment),
            )
            .await?;
        let model = cx
            .read(
                ResourceKind::Model,
                &self.model,
                resolver.latest(VersionFamily::Model, &self.model),
            )
            .await?;

        tracing::info!(
            "Deploying {} and {} to endpoint {} as {}",
            environment,
            model,
            self.endpoint,
            self.name
        );

        let args = ToolArgs::ml(TOOL_TYPE, cx.scope, &self.definition)
            .set("name", &self.name)
            .set("environment", environment.asset_id())
            .set("model", model.asset_id())
            .set("endpoint_name", &self.endpoint)
            .extend(self.overrides.iter().cloned())
            .into_vec();

        Ok(Planned::invoke(
            Bindings { environment, model },
            Invocation::new(self.kind().program(), args),
        ))
    }

    async fn confirm(
        &self,
        cx: &StepContext<'_>,
        _bindings: Bindings,
        _output: Option<ToolOutput>,
    ) -> Result<OnlineDeployment> {
        cx.read(
            self.kind(),
            &self.name,
            cx.control_plane
                .get_online_deployment(cx.scope, &self.endpoint, &self.name),
        )
        .await
    }

    fn published(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENDPOINT_NAME_KEY, self.endpoint.clone()),
            (DEPLOYMENT_NAME_KEY, self.name.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComponentConfig;
    use crate::env_store::MemoryEnvStore;
    use tempfile::TempDir;

    fn config() -> EndpointDeploymentConfig {
        EndpointDeploymentConfig {
            workspace: None,
            environment: ComponentConfig::new("env-${ENV}", "environment.yaml"),
            model: ComponentConfig::new("model-${ENV}", "model.yaml"),
            deployment: ComponentConfig::new("", "deployment.yaml")
                .with_override("instance_count", "${COUNT:-1}"),
        }
    }

    #[test]
    fn test_deployment_name() {
        assert_eq!(deployment_name("fleetml", 1700000000), "fleetml-1700000000");
        assert_ne!(
            deployment_name(DEPLOYMENT_NAME_PREFIX, 1700000000),
            deployment_name(DEPLOYMENT_NAME_PREFIX, 1700000001)
        );
    }

    #[test]
    fn test_same_second_shares_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("deployment.yaml"), "").unwrap();
        let env = MemoryEnvStore::new().with("ENV", "dev");
        let prepare = |secs| {
            DeploymentStep::prepare(dir.path(), "ep-dev", &config(), &env, secs).unwrap()
        };

        assert_eq!(prepare(1700000000).name(), prepare(1700000000).name());
        assert_ne!(prepare(1700000000).name(), prepare(1700000001).name());
    }

    #[test]
    fn test_prepare_resolves_names() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("deployment.yaml"), "").unwrap();
        let env = MemoryEnvStore::new().with("ENV", "dev");

        let step = DeploymentStep::prepare(dir.path(), "ep-dev", &config(), &env, 42).unwrap();

        assert_eq!(step.name(), "fleetml-42");
        assert_eq!(step.endpoint(), "ep-dev");
        assert_eq!(step.environment, "env-dev");
        assert_eq!(step.model, "model-dev");
        assert_eq!(step.overrides, vec!["--set", "instance_count=1"]);
        assert_eq!(
            step.published(),
            vec![
                (ENDPOINT_NAME_KEY, "ep-dev".to_string()),
                (DEPLOYMENT_NAME_KEY, "fleetml-42".to_string()),
            ]
        );
    }

    #[test]
    fn test_prepare_reports_unresolved_model_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("deployment.yaml"), "").unwrap();
        let mut config = config();
        config.environment.name = "env".into();
        let env = MemoryEnvStore::new();

        let err = DeploymentStep::prepare(dir.path(), "ep", &config, &env, 0).unwrap_err();

        match err {
            ProvisionError::Template { what, source } => {
                assert_eq!(what, "model name value");
                assert_eq!(source.variable(), Some("ENV"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prepare_requires_definition() {
        let dir = TempDir::new().unwrap();
        let env = MemoryEnvStore::new().with("ENV", "dev");

        let err = DeploymentStep::prepare(dir.path(), "ep", &config(), &env, 0).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::FileNotFound {
                kind: ResourceKind::Deployment,
                ..
            }
        ));
    }
}
