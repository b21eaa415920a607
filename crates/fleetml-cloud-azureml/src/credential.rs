//! Azure Resource Manager credentials
//!
//! Tokens come either from the Azure CLI (`az account get-access-token`) or
//! from a pre-issued token in `AZURE_ACCESS_TOKEN`.

use crate::error::{AzureMlError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Token audience for ARM
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

/// Environment variable holding a pre-issued ARM token
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Refresh this many seconds before the token expires
const EXPIRY_MARGIN_SECS: i64 = 300;

#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Bearer token for ARM requests
    async fn token(&self) -> Result<String>;
}

/// Token taken verbatim from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .map_err(|_| AzureMlError::MissingEnvVar(ACCESS_TOKEN_ENV.to_string()))?;
        if token.trim().is_empty() {
            return Err(AzureMlError::MissingEnvVar(ACCESS_TOKEN_ENV.to_string()));
        }
        Ok(Self::new(token.trim()))
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Output of `az account get-access-token -o json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
    /// Unix timestamp; only reported by newer CLI versions
    #[serde(default, rename = "expires_on")]
    pub expires_on: Option<i64>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
}

impl AccessToken {
    fn is_fresh(&self, now: i64) -> bool {
        match self.expires_on {
            Some(expires_on) => expires_on - EXPIRY_MARGIN_SECS > now,
            None => false,
        }
    }
}

/// Azure CLI credential
///
/// Tokens are cached until shortly before they expire.
pub struct AzureCliCredential {
    subscription_id: String,
    program: String,
    cached: Mutex<Option<AccessToken>>,
}

impl AzureCliCredential {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self::with_program("az", subscription_id)
    }

    /// Use a specific `az` executable
    pub fn with_program(program: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            program: program.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn args(&self) -> Vec<&str> {
        vec![
            "account",
            "get-access-token",
            "--subscription",
            self.subscription_id.as_str(),
            "--resource",
            ARM_RESOURCE,
            "-o",
            "json",
        ]
    }

    async fn fetch(&self) -> Result<AccessToken> {
        let args = self.args();
        tracing::debug!("Running: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AzureMlError::AzureCliNotFound,
                _ => AzureMlError::IoError(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureMlError::CommandFailed(stderr.trim().to_string()));
        }

        let token: AccessToken = serde_json::from_slice(&output.stdout)?;
        Ok(token)
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}
