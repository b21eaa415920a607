//! Azure ML provider error types

use fleetml_cloud::ControlPlaneError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureMlError {
    #[error("Azure CLI not found. Please install: https://aka.ms/azure-cli")]
    AzureCliNotFound,

    #[error("az command failed: {0}")]
    CommandFailed(String),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<AzureMlError> for ControlPlaneError {
    fn from(err: AzureMlError) -> Self {
        match err {
            AzureMlError::AzureCliNotFound
            | AzureMlError::CommandFailed(_)
            | AzureMlError::MissingEnvVar(_) => ControlPlaneError::Authentication(err.to_string()),
            AzureMlError::IoError(_) | AzureMlError::InvalidConfig(_) => {
                ControlPlaneError::Transport(err.to_string())
            }
            AzureMlError::JsonError(_) => ControlPlaneError::Decode(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AzureMlError>;
