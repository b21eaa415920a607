//! External provisioning tool bridge

use crate::scope::Scope;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Program run through the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolProgram {
    /// Provisions environments, models, endpoints and deployments
    MlClient,
    /// Shows, creates and updates prompt flows
    PromptFlowClient,
}

impl ToolProgram {
    /// Script file the bridge executes for this program
    pub fn script_name(&self) -> &'static str {
        match self {
            ToolProgram::MlClient => "ml_client.py",
            ToolProgram::PromptFlowClient => "pf_client.py",
        }
    }
}

impl std::fmt::Display for ToolProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolProgram::MlClient => write!(f, "ml-client"),
            ToolProgram::PromptFlowClient => write!(f, "prompt-flow-client"),
        }
    }
}

/// Captured output of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ToolError {
    /// The program ran and reported failure
    #[error("{program} exited with {}: {}", describe_status(.exit_code), .stderr.trim())]
    Failed {
        program: ToolProgram,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The program could not be started at all
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: ToolProgram,
        #[source]
        source: std::io::Error,
    },

    #[error("tool bridge unavailable: {0}")]
    Unavailable(String),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl ToolError {
    /// Whether the program ran to completion and reported failure
    pub fn is_failed_run(&self) -> bool {
        matches!(self, ToolError::Failed { .. })
    }

    /// `(stdout, stderr)` captured from a failed run
    pub fn captured_output(&self) -> Option<(&str, &str)> {
        match self {
            ToolError::Failed { stdout, stderr, .. } => Some((stdout.as_str(), stderr.as_str())),
            _ => None,
        }
    }
}

/// Runs the provisioning programs
#[async_trait]
pub trait ToolBridge: Send + Sync {
    /// Prepare the bridge; called at most once per orchestrator
    async fn initialize(&self) -> Result<(), ToolError>;

    /// Run `program` with `args` and capture its output.
    ///
    /// A non-zero exit must be reported as [`ToolError::Failed`].
    async fn run(&self, program: ToolProgram, args: &[String]) -> Result<ToolOutput, ToolError>;
}

/// Argument vector builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    args: Vec<String>,
}

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an ML client vector: `-t <type> -s <sub> -g <group> -w <workspace> -f <file>`
    pub fn ml(resource_type: &str, scope: &Scope, file: &Path) -> Self {
        Self::new()
            .flag("-t", resource_type)
            .flag("-s", scope.subscription_id())
            .flag("-g", scope.resource_group())
            .flag("-w", scope.workspace())
            .flag("-f", file.display().to_string())
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn set(self, key: &str, value: impl std::fmt::Display) -> Self {
        self.flag("--set", format!("{}={}", key, value))
    }

    /// Append pre-expanded `--set` pairs
    pub fn extend(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args
    }
}
