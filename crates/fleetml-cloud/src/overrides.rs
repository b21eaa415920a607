//! Override application
//!
//! Overrides are `key → template` pairs forwarded to the provisioning tool as
//! `--set key=value`. The map has no defined iteration order and nothing may
//! rely on the order the pairs come out in.

use crate::template::{ExpandableString, TemplateError};
use std::collections::HashMap;
use thiserror::Error;

/// Override templates keyed by the definition field they replace
pub type Overrides = HashMap<String, ExpandableString>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed parsing override '{key}': {source}")]
pub struct OverrideError {
    pub key: String,
    #[source]
    pub source: TemplateError,
}

/// Expand every override and append it to `args` as a `--set key=value` pair.
///
/// Stops at the first template that fails to resolve.
pub fn apply_overrides<F>(
    mut args: Vec<String>,
    overrides: &Overrides,
    lookup: F,
) -> Result<Vec<String>, OverrideError>
where
    F: Fn(&str) -> Option<String>,
{
    args.reserve(overrides.len() * 2);

    for (key, value) in overrides {
        let expanded = value.expand(&lookup).map_err(|source| OverrideError {
            key: key.clone(),
            source,
        })?;
        args.push("--set".to_string());
        args.push(format!("{}={}", key, expanded));
    }

    Ok(args)
}
