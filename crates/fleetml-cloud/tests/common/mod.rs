#![allow(dead_code)]

use async_trait::async_trait;
use fleetml_cloud::resource::{
    ContainerProperties, EnvironmentVersionProperties, ModelVersionProperties,
    OnlineDeploymentProperties, OnlineEndpointProperties, WorkspaceProperties,
};
use fleetml_cloud::{
    ArmResource, ControlPlane, ControlPlaneError, ControlPlaneFactory, EnvStore,
    EnvironmentVersion, MemoryEnvStore, ModelVersion, OnlineDeployment, OnlineEndpoint,
    Orchestrator, Scope, ToolBridge, ToolError, ToolOutput, ToolProgram, VersionContainer,
    VersionFamily, Workspace,
};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub fn scope() -> Scope {
    Scope::new("sub-123", "rg-ml", "ws-ml")
}

/// Service directory with the usual definition files
pub struct TestService {
    pub root: TempDir,
}

impl TestService {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let deployment = root.path().join("deployment");
        std::fs::create_dir_all(&deployment).unwrap();
        for file in [
            "environment.yaml",
            "model.yaml",
            "endpoint.yaml",
            "deployment.yaml",
        ] {
            std::fs::write(deployment.join(file), "$schema: placeholder\n").unwrap();
        }
        std::fs::create_dir_all(root.path().join("flow")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }
}

#[derive(Default)]
struct State {
    workspace: Option<Workspace>,
    containers: HashMap<(VersionFamily, String), VersionContainer>,
    environment_versions: HashMap<(String, String), EnvironmentVersion>,
    model_versions: HashMap<(String, String), ModelVersion>,
    endpoints: HashMap<String, OnlineEndpoint>,
    deployments: HashMap<(String, String), OnlineDeployment>,
    /// Errors returned for the next read of a given call, keyed by call name
    failures: HashMap<&'static str, ControlPlaneError>,
}

/// In-memory control plane
#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<State>,
    reads: Mutex<Vec<String>>,
}

impl FakeControlPlane {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_workspace(self: Arc<Self>, name: &str) -> Arc<Self> {
        self.state.lock().unwrap().workspace =
            Some(ArmResource::new(name, WorkspaceProperties::default()));
        self
    }

    pub fn add_container(&self, family: VersionFamily, name: &str, latest: &str, next: &str) {
        let container = ArmResource::new(
            name,
            ContainerProperties {
                latest_version: Some(latest.to_string()),
                next_version: Some(next.to_string()),
                ..Default::default()
            },
        );
        self.state
            .lock()
            .unwrap()
            .containers
            .insert((family, name.to_string()), container);
    }

    pub fn add_endpoint(&self, name: &str) {
        let endpoint = ArmResource::new(
            name,
            OnlineEndpointProperties {
                auth_mode: Some("key".to_string()),
                provisioning_state: Some("Succeeded".to_string()),
                ..Default::default()
            },
        );
        self.state
            .lock()
            .unwrap()
            .endpoints
            .insert(name.to_string(), endpoint);
    }

    /// Make the next `call` fail with `error`
    pub fn fail_next(&self, call: &'static str, error: ControlPlaneError) {
        self.state.lock().unwrap().failures.insert(call, error);
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn container(&self, family: VersionFamily, name: &str) -> Option<VersionContainer> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(&(family, name.to_string()))
            .cloned()
    }

    fn record(&self, call: &'static str, detail: &str) -> Result<(), ControlPlaneError> {
        self.reads.lock().unwrap().push(format!("{} {}", call, detail));
        match self.state.lock().unwrap().failures.remove(call) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Apply the effect of a successful ML client run
    fn apply(&self, args: &[String]) {
        let resource_type = flag(args, "-t").unwrap_or_default();
        let sets = set_values(args);
        let name = sets.get("name").cloned().unwrap_or_default();
        let mut state = self.state.lock().unwrap();

        match resource_type.as_str() {
            "environment" => {
                let version = sets.get("version").cloned().unwrap_or_default();
                let next = version.parse::<u32>().map(|v| v + 1).unwrap_or(1);
                bump(&mut state, VersionFamily::Environment, &name, &version, next);
                state.environment_versions.insert(
                    (name.clone(), version.clone()),
                    ArmResource::new(version, EnvironmentVersionProperties::default()),
                );
            }
            "model" => {
                let key = (VersionFamily::Model, name.clone());
                let latest = state
                    .containers
                    .get(&key)
                    .and_then(|c| c.properties.next_version.clone())
                    .unwrap_or_else(|| "1".to_string());
                let next = latest.parse::<u32>().map(|v| v + 1).unwrap_or(2);
                bump(&mut state, VersionFamily::Model, &name, &latest, next);
                state.model_versions.insert(
                    (name.clone(), latest.clone()),
                    ArmResource::new(
                        latest,
                        ModelVersionProperties {
                            model_uri: Some(format!("azureml://models/{}", name)),
                            ..Default::default()
                        },
                    ),
                );
            }
            "online-endpoint" => {
                state.endpoints.insert(
                    name.clone(),
                    ArmResource::new(name, OnlineEndpointProperties::default()),
                );
            }
            "online-deployment" => {
                let endpoint = sets.get("endpoint_name").cloned().unwrap_or_default();
                state.deployments.insert(
                    (endpoint, name.clone()),
                    ArmResource::new(
                        name,
                        OnlineDeploymentProperties {
                            model: sets.get("model").cloned(),
                            environment_id: sets.get("environment").cloned(),
                            ..Default::default()
                        },
                    ),
                );
            }
            _ => {}
        }
    }
}

fn bump(state: &mut State, family: VersionFamily, name: &str, latest: &str, next: u32) {
    state.containers.insert(
        (family, name.to_string()),
        ArmResource::new(
            name,
            ContainerProperties {
                latest_version: Some(latest.to_string()),
                next_version: Some(next.to_string()),
                ..Default::default()
            },
        ),
    );
}

fn not_found(what: String) -> ControlPlaneError {
    ControlPlaneError::NotFound(what)
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn get_workspace(&self, scope: &Scope) -> Result<Workspace, ControlPlaneError> {
        self.record("get_workspace", scope.workspace())?;
        self.state
            .lock()
            .unwrap()
            .workspace
            .clone()
            .ok_or_else(|| not_found(scope.workspace().to_string()))
    }

    async fn get_container(
        &self,
        _scope: &Scope,
        family: VersionFamily,
        name: &str,
    ) -> Result<VersionContainer, ControlPlaneError> {
        self.record("get_container", &format!("{} {}", family, name))?;
        self.container(family, name)
            .ok_or_else(|| not_found(format!("{} {}", family, name)))
    }

    async fn get_environment_version(
        &self,
        _scope: &Scope,
        name: &str,
        version: &str,
    ) -> Result<EnvironmentVersion, ControlPlaneError> {
        self.record("get_environment_version", &format!("{}:{}", name, version))?;
        self.state
            .lock()
            .unwrap()
            .environment_versions
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{}:{}", name, version)))
    }

    async fn get_model_version(
        &self,
        _scope: &Scope,
        name: &str,
        version: &str,
    ) -> Result<ModelVersion, ControlPlaneError> {
        self.record("get_model_version", &format!("{}:{}", name, version))?;
        self.state
            .lock()
            .unwrap()
            .model_versions
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{}:{}", name, version)))
    }

    async fn get_online_endpoint(
        &self,
        _scope: &Scope,
        name: &str,
    ) -> Result<OnlineEndpoint, ControlPlaneError> {
        self.record("get_online_endpoint", name)?;
        self.state
            .lock()
            .unwrap()
            .endpoints
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name.to_string()))
    }

    async fn get_online_deployment(
        &self,
        _scope: &Scope,
        endpoint: &str,
        deployment: &str,
    ) -> Result<OnlineDeployment, ControlPlaneError> {
        self.record("get_online_deployment", &format!("{}/{}", endpoint, deployment))?;
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(&(endpoint.to_string(), deployment.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{}/{}", endpoint, deployment)))
    }
}

pub fn flag(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// `--set key=value` pairs of an argument vector
pub fn set_values(args: &[String]) -> HashMap<String, String> {
    args.windows(2)
        .filter(|w| w[0] == "--set")
        .filter_map(|w| w[1].split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Scripted result of one tool run
pub enum Script {
    Succeed(String),
    Fail { stdout: String, stderr: String },
    Unavailable(String),
    Hang,
}

/// Tool bridge that records invocations and applies ML client effects to a
/// [`FakeControlPlane`]
pub struct FakeToolBridge {
    control_plane: Arc<FakeControlPlane>,
    invocations: Mutex<Vec<(ToolProgram, Vec<String>)>>,
    scripts: Mutex<VecDeque<Script>>,
    initializations: AtomicUsize,
    fail_initialize: AtomicBool,
}

impl FakeToolBridge {
    pub fn new(control_plane: Arc<FakeControlPlane>) -> Arc<Self> {
        Arc::new(Self {
            control_plane,
            invocations: Mutex::new(Vec::new()),
            scripts: Mutex::new(VecDeque::new()),
            initializations: AtomicUsize::new(0),
            fail_initialize: AtomicBool::new(false),
        })
    }

    /// Queue the result of the next run; unscripted runs succeed with empty output
    pub fn script(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    pub fn invocations(&self) -> Vec<(ToolProgram, Vec<String>)> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolBridge for FakeToolBridge {
    async fn initialize(&self) -> Result<(), ToolError> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(ToolError::Unavailable("python not found".to_string()));
        }
        Ok(())
    }

    async fn run(&self, program: ToolProgram, args: &[String]) -> Result<ToolOutput, ToolError> {
        self.invocations
            .lock()
            .unwrap()
            .push((program, args.to_vec()));

        let script = self.scripts.lock().unwrap().pop_front();
        match script.unwrap_or(Script::Succeed(String::new())) {
            Script::Succeed(stdout) => {
                if program == ToolProgram::MlClient {
                    self.control_plane.apply(args);
                }
                Ok(ToolOutput::new(stdout))
            }
            Script::Fail { stdout, stderr } => Err(ToolError::Failed {
                program,
                exit_code: Some(1),
                stdout,
                stderr,
            }),
            Script::Unavailable(message) => Err(ToolError::Unavailable(message)),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Factory that counts connections and can be made to fail or stall
pub struct CountingFactory {
    control_plane: Arc<FakeControlPlane>,
    connects: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl CountingFactory {
    pub fn new(control_plane: Arc<FakeControlPlane>) -> Arc<Self> {
        Self::with_delay(control_plane, Duration::ZERO)
    }

    pub fn with_delay(control_plane: Arc<FakeControlPlane>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            control_plane,
            connects: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
        })
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlaneFactory for CountingFactory {
    async fn connect(
        &self,
        _subscription_id: &str,
    ) -> Result<Arc<dyn ControlPlane>, ControlPlaneError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ControlPlaneError::Authentication(
                "az login required".to_string(),
            ));
        }
        Ok(self.control_plane.clone())
    }
}

/// Orchestrator wired to fakes
pub struct Harness {
    pub control_plane: Arc<FakeControlPlane>,
    pub tools: Arc<FakeToolBridge>,
    pub factory: Arc<CountingFactory>,
    pub env: Arc<MemoryEnvStore>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_env(MemoryEnvStore::new())
    }

    pub fn with_env(env: MemoryEnvStore) -> Self {
        let control_plane = FakeControlPlane::new().with_workspace("ws-ml");
        let factory = CountingFactory::new(control_plane.clone());
        Self::assemble(control_plane, factory, env)
    }

    pub fn assemble(
        control_plane: Arc<FakeControlPlane>,
        factory: Arc<CountingFactory>,
        env: MemoryEnvStore,
    ) -> Self {
        let tools = FakeToolBridge::new(control_plane.clone());
        let env = Arc::new(env);
        let orchestrator = Orchestrator::new(
            factory.clone(),
            tools.clone(),
            env.clone() as Arc<dyn EnvStore>,
        );
        Self {
            control_plane,
            tools,
            factory,
            env,
            orchestrator,
        }
    }

    pub fn published(&self, key: &str) -> Option<String> {
        self.env.get(key)
    }
}
