//! Python tool bridge
//!
//! Runs the ML client and prompt-flow client scripts with a Python
//! interpreter, capturing their output.

use crate::error::{AzureMlError, Result};
use async_trait::async_trait;
use fleetml_cloud::{ToolBridge, ToolError, ToolOutput, ToolProgram};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Interpreter override
pub const PYTHON_ENV: &str = "FLEETML_PYTHON";

/// Directory holding `ml_client.py` and `pf_client.py`
pub const SCRIPTS_DIR_ENV: &str = "FLEETML_SCRIPTS_DIR";

const DEFAULT_PYTHON: &str = "python3";

/// Bridge to the Python provisioning scripts
#[derive(Debug, Clone)]
pub struct PythonBridge {
    python: PathBuf,
    scripts_dir: PathBuf,
}

impl PythonBridge {
    pub fn new(python: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Interpreter from `FLEETML_PYTHON` (default `python3`), scripts from
    /// `FLEETML_SCRIPTS_DIR` (default `<data dir>/fleetml/scripts`)
    pub fn from_env() -> Result<Self> {
        let python = std::env::var(PYTHON_ENV).unwrap_or_else(|_| DEFAULT_PYTHON.to_string());

        let scripts_dir = match std::env::var(SCRIPTS_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .map(|d| d.join("fleetml").join("scripts"))
                .ok_or_else(|| {
                    AzureMlError::InvalidConfig(format!(
                        "cannot determine scripts directory; set {}",
                        SCRIPTS_DIR_ENV
                    ))
                })?,
        };

        Ok(Self::new(python, scripts_dir))
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn script_path(&self, program: ToolProgram) -> PathBuf {
        self.scripts_dir.join(program.script_name())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Dropping the future (cancellation) must not leave the script running
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ToolBridge for PythonBridge {
    /// Check the interpreter runs and both scripts are present
    async fn initialize(&self) -> std::result::Result<(), ToolError> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                ToolError::Unavailable(format!(
                    "cannot run {}: {}",
                    self.python.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ToolError::Unavailable(format!(
                "{} --version failed: {}",
                self.python.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        for program in [ToolProgram::MlClient, ToolProgram::PromptFlowClient] {
            let script = self.script_path(program);
            if !script.is_file() {
                return Err(ToolError::Unavailable(format!(
                    "{} script not found: {}",
                    program,
                    script.display()
                )));
            }
        }

        tracing::debug!(
            "Python bridge ready: {} with scripts in {}",
            self.python.display(),
            self.scripts_dir.display()
        );
        Ok(())
    }

    async fn run(
        &self,
        program: ToolProgram,
        args: &[String],
    ) -> std::result::Result<ToolOutput, ToolError> {
        let script = self.script_path(program);

        tracing::debug!(
            "Running: {} {} {}",
            self.python.display(),
            script.display(),
            args.join(" ")
        );

        let output = self
            .command()
            .arg(&script)
            .args(args)
            .output()
            .await
            .map_err(|source| ToolError::Launch { program, source })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ToolError::Failed {
                program,
                exit_code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}
