pub mod error;
pub mod project;

pub use error::*;
pub use project::{MlServiceConfig, Project, ProjectConfig, ServiceConfig, load_project};

use std::path::PathBuf;

/// Environment variable pointing directly at a project file
pub const CONFIG_PATH_ENV: &str = "FLEETML_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "fleetml.local.yaml",
    ".fleetml.local.yaml",
    "fleetml.yaml",
    ".fleetml.yaml",
];

/// Locate the project file
///
/// Search order:
/// 1. `FLEETML_CONFIG_PATH`
/// 2. Current directory: fleetml.local.yaml, .fleetml.local.yaml, fleetml.yaml, .fleetml.yaml
/// 3. `./.fleetml/`, same order
/// 4. `~/.config/fleetml/fleetml.yaml`
pub fn find_project_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points at {}, which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let fleetml_dir = current_dir.join(".fleetml");
    if fleetml_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = fleetml_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("fleetml").join("fleetml.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ProjectFileNotFound)
}

/// Find and parse the project file
pub fn discover_project() -> Result<Project> {
    let path = find_project_file()?;
    load_project(&path)
}
