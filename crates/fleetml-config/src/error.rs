use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "project file not found. Looked in:\n\
        - current directory: fleetml.local.yaml, .fleetml.local.yaml, fleetml.yaml, .fleetml.yaml\n\
        - ./.fleetml/ directory\n\
        - ~/.config/fleetml/fleetml.yaml\n\
        Set FLEETML_CONFIG_PATH to point at a file directly"
    )]
    ProjectFileNotFound,

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("service '{0}' is not defined in the project file")]
    UnknownService(String),

    #[error("service '{service}' has an incomplete deployment: missing {missing}")]
    IncompleteDeployment {
        service: String,
        missing: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
