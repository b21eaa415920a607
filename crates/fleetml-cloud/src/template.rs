//! Template expansion for names and override values
//!
//! Supported syntax:
//!
//! - `${NAME}` or `$NAME`: value of `NAME`, which must resolve
//! - `${NAME:-fallback}`: value of `NAME`, or `fallback` when unset or empty
//! - `$$`: a literal `$`
//!
//! A `$` not followed by `{`, `$` or a variable name is copied as-is.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$|\$\{([^}]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unresolved variable '{variable}' in '{template}'")]
    UnresolvedVariable { variable: String, template: String },

    #[error("malformed template '{template}'")]
    Malformed { template: String },
}

impl TemplateError {
    /// Name of the unresolved variable, if that is what failed
    pub fn variable(&self) -> Option<&str> {
        match self {
            TemplateError::UnresolvedVariable { variable, .. } => Some(variable),
            TemplateError::Malformed { .. } => None,
        }
    }
}

/// Expand `template`, looking variables up through `lookup`.
pub fn resolve<F>(template: &str, lookup: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in REFERENCE.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        match (caps.get(1), caps.get(2)) {
            (Some(expr), _) => out.push_str(&substitute(expr.as_str(), template, &lookup)?),
            (None, Some(name)) => out.push_str(&substitute(name.as_str(), template, &lookup)?),
            (None, None) => out.push('$'),
        }
    }

    let rest = &template[last..];
    if rest.contains("${") {
        return Err(TemplateError::Malformed {
            template: template.to_string(),
        });
    }
    out.push_str(rest);

    Ok(out)
}

fn substitute<F>(expr: &str, template: &str, lookup: &F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<String>,
{
    let (name, fallback) = match expr.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (expr, None),
    };

    if !VARIABLE_NAME.is_match(name) {
        return Err(TemplateError::Malformed {
            template: template.to_string(),
        });
    }

    match (lookup(name), fallback) {
        (Some(value), Some(fallback)) if value.is_empty() => Ok(fallback.to_string()),
        (Some(value), _) => Ok(value),
        (None, Some(fallback)) => Ok(fallback.to_string()),
        (None, None) => Err(TemplateError::UnresolvedVariable {
            variable: name.to_string(),
            template: template.to_string(),
        }),
    }
}

/// A string that is expanded against an environment before use
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandableString {
    template: String,
}

impl ExpandableString {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw, unexpanded template
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    pub fn expand<F>(&self, lookup: F) -> Result<String, TemplateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        resolve(&self.template, lookup)
    }
}

impl From<&str> for ExpandableString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExpandableString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for ExpandableString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}
