//! Result publishing
//!
//! Resolved identifiers are written to the environment store so later
//! pipeline steps can use them without resolving the templates again.

use crate::env_store::{EnvStore, EnvStoreError};

pub const ENVIRONMENT_NAME_KEY: &str = "AZUREML_ENVIRONMENT_NAME";
pub const MODEL_NAME_KEY: &str = "AZUREML_MODEL_NAME";
pub const ENDPOINT_NAME_KEY: &str = "AZUREML_ENDPOINT_NAME";
pub const DEPLOYMENT_NAME_KEY: &str = "AZUREML_DEPLOYMENT_NAME";
pub const FLOW_NAME_KEY: &str = "AZUREML_FLOW_NAME";

/// Write every `(key, value)` pair as one store update
pub fn publish(store: &dyn EnvStore, values: &[(&'static str, String)]) -> Result<(), EnvStoreError> {
    let pairs: Vec<(&str, &str)> = values
        .iter()
        .map(|(key, value)| (*key, value.as_str()))
        .collect();
    store.set_all(&pairs)?;

    for (key, value) in values {
        tracing::debug!(key = %key, value = %value, "Published");
    }
    Ok(())
}
