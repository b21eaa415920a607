//! Environment store
//!
//! Key/value storage that provisioning results are published into, and that
//! templates are expanded against. The file-backed store keeps its values in
//! `.fleetml/<environment>/.env` under the project root.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

const ENV_DIR: &str = ".fleetml";
const ENV_FILE: &str = ".env";
const ENV_BACKUP: &str = ".env.backup";

#[derive(Error, Debug)]
pub enum EnvStoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dotenv file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid key '{0}'")]
    InvalidKey(String),
}

/// Key/value sink shared between pipeline steps
pub trait EnvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), EnvStoreError>;

    /// Write several values as one update
    fn set_all(&self, values: &[(&str, &str)]) -> Result<(), EnvStoreError> {
        for (key, value) in values {
            self.set(key, value)?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), EnvStoreError> {
    let mut chars = key.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(EnvStoreError::InvalidKey(key.to_string()))
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryEnvStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryEnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        self
    }

    /// Copy of every stored value
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FromIterator<(String, String)> for MemoryEnvStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl EnvStore for MemoryEnvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EnvStoreError> {
        validate_key(key)?;
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Dotenv-file store
///
/// Lookups consult the file first and fall back to the process environment.
/// Every write rewrites the file, keeping the previous contents as a backup.
/// A `set_all` batch is one write, so its backup is the state before the batch.
#[derive(Debug)]
pub struct DotenvEnvStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl DotenvEnvStore {
    /// Path of the dotenv file for `environment` under `project_root`
    pub fn env_file(project_root: &Path, environment: &str) -> PathBuf {
        project_root.join(ENV_DIR).join(environment).join(ENV_FILE)
    }

    /// Open the store for a named environment; a missing file is an empty store
    pub fn open(project_root: &Path, environment: &str) -> Result<Self, EnvStoreError> {
        Self::load(Self::env_file(project_root, environment))
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EnvStoreError> {
        let path = path.into();
        let mut values = BTreeMap::new();

        if path.exists() {
            let iter = dotenvy::from_path_iter(&path).map_err(|e| EnvStoreError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
            for item in iter {
                let (key, value) = item.map_err(|e| EnvStoreError::Parse {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                values.insert(key, value);
            }
            tracing::debug!("Loaded {} values from {}", values.len(), path.display());
        } else {
            tracing::debug!("Env file {} not found, starting empty", path.display());
        }

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), EnvStoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        }

        if self.path.exists() {
            let backup = self.path.with_file_name(ENV_BACKUP);
            std::fs::copy(&self.path, &backup).map_err(io_err(&backup))?;
        }

        let mut content = String::new();
        for (key, value) in values {
            content.push_str(&format!("{}=\"{}\"\n", key, escape(value)));
        }
        std::fs::write(&self.path, content).map_err(io_err(&self.path))?;

        tracing::debug!("Saved {} values to {}", values.len(), self.path.display());
        Ok(())
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> EnvStoreError + use<> {
    let path = path.to_path_buf();
    move |source| EnvStoreError::Io { path, source }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('\n', "\\n")
}

impl EnvStore for DotenvEnvStore {
    fn get(&self, key: &str) -> Option<String> {
        let stored = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        stored.or_else(|| std::env::var(key).ok())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EnvStoreError> {
        validate_key(key)?;
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), EnvStoreError> {
        for (key, _) in pairs {
            validate_key(key)?;
        }
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in pairs {
            values.insert(key.to_string(), value.to_string());
        }
        self.save(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let store = MemoryEnvStore::new().with("ENV", "prod");
        assert_eq!(store.get("ENV").as_deref(), Some("prod"));

        store.set("AZUREML_MODEL_NAME", "model-prod").unwrap();
        assert_eq!(store.snapshot().len(), 2);
        assert!(matches!(
            store.set("not a key", "x"),
            Err(EnvStoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_dotenv_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = DotenvEnvStore::open(temp_dir.path(), "dev").unwrap();

        store.set("AZUREML_ENDPOINT_NAME", "ep-dev").unwrap();
        store.set("NOTE", "say \"hi\"\\now").unwrap();
        store.set("TEMPLATE", "${NOT_EXPANDED}").unwrap();

        let reloaded = DotenvEnvStore::open(temp_dir.path(), "dev").unwrap();
        assert_eq!(reloaded.get("AZUREML_ENDPOINT_NAME").as_deref(), Some("ep-dev"));
        assert_eq!(reloaded.get("NOTE").as_deref(), Some("say \"hi\"\\now"));
        assert_eq!(reloaded.get("TEMPLATE").as_deref(), Some("${NOT_EXPANDED}"));
        assert!(temp_dir.path().join(".fleetml/dev/.env.backup").exists());
    }

    #[test]
    fn test_dotenv_batch_backs_up_once() {
        let temp_dir = tempdir().unwrap();
        let store = DotenvEnvStore::open(temp_dir.path(), "dev").unwrap();
        store.set("AZUREML_ENDPOINT_NAME", "ep-old").unwrap();

        store
            .set_all(&[
                ("AZUREML_ENDPOINT_NAME", "ep-new"),
                ("AZUREML_DEPLOYMENT_NAME", "fleetml-1700000000"),
            ])
            .unwrap();

        let backup =
            std::fs::read_to_string(temp_dir.path().join(".fleetml/dev/.env.backup")).unwrap();
        assert!(backup.contains("ep-old"));
        assert!(!backup.contains("ep-new"));
        assert!(!backup.contains("AZUREML_DEPLOYMENT_NAME"));

        let current = std::fs::read_to_string(store.path()).unwrap();
        assert!(current.contains("ep-new"));
        assert!(current.contains("fleetml-1700000000"));
    }

    #[test]
    fn test_dotenv_batch_rejects_bad_key_before_writing() {
        let temp_dir = tempdir().unwrap();
        let store = DotenvEnvStore::open(temp_dir.path(), "dev").unwrap();

        assert!(matches!(
            store.set_all(&[("GOOD", "1"), ("bad key", "2")]),
            Err(EnvStoreError::InvalidKey(_))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_dotenv_empty_when_missing() {
        let temp_dir = tempdir().unwrap();
        let store = DotenvEnvStore::open(temp_dir.path(), "none").unwrap();
        assert!(store.get("FLEETML_TEST_SURELY_UNSET_KEY").is_none());
        assert!(!store.path().exists());
    }
}
