//! Configuration types for ragops.
//!
//! Project settings arrive as a flat string mapping. The mapping is built from
//! a YAML settings file (optional) overlaid with trailing `--key value` pairs
//! from the command line, then converted into a typed per-command config:
//!
//! - [`CleanupConfig`]: the resources torn down by `ragops cleanup`
//! - [`IndexConfig`]: vector index provisioning, with its [`PollConfig`]
//! - [`RollbackConfig`]: model alias rollback
//!
//! Workspace connection details (host, token) live in [`WorkspaceConfig`] and
//! come from the fixed CLI surface or the environment, never from flag pairs.

pub mod cleanup;
pub mod index;
pub mod rollback;
pub mod workspace;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use cleanup::CleanupConfig;
pub use index::{IndexConfig, PollConfig};
pub use rollback::RollbackConfig;
pub use workspace::WorkspaceConfig;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing configuration key(s): {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Interpret command-line tokens as `--key value` pairs.
///
/// Even-indexed tokens are keys with their leading dashes stripped, the token
/// after each key is its value. A trailing key without a value is dropped.
/// Later occurrences of a key overwrite earlier ones.
pub fn parse_flag_pairs<I, S>(tokens: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<S> = tokens.into_iter().collect();
    let mut pairs = BTreeMap::new();
    for chunk in tokens.chunks(2) {
        if let [key, value] = chunk {
            let key = key.as_ref().trim_start_matches('-');
            pairs.insert(key.to_string(), value.as_ref().to_string());
        }
    }
    pairs
}

/// Flat string settings for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from trailing `--key value` command-line tokens.
    pub fn from_flag_pairs<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: parse_flag_pairs(tokens),
        }
    }

    /// Load settings from a YAML file containing a flat mapping.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a flat YAML mapping.
    ///
    /// Scalars are stored in their string form. A null value is stored as an
    /// empty string so the key still counts as present; a sequence or mapping
    /// is rejected.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: Option<BTreeMap<String, serde_yaml::Value>> = serde_yaml::from_str(content)?;
        let mut values = BTreeMap::new();
        for (key, value) in raw.unwrap_or_default() {
            let value = match value {
                serde_yaml::Value::Null => String::new(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::String(s) => s,
                _ => return Err(ConfigError::invalid(key, "expected a scalar value")),
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overlay `other` on top of these settings; keys in `other` win.
    pub fn merge(&mut self, other: Settings) {
        self.values.extend(other.values);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail with every missing key at once rather than the first one found.
    pub fn require_all(&self, keys: &[&str]) -> Result<(), ConfigError> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !self.values.contains_key(**k))
            .map(|k| k.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    pub(crate) fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingKeys(vec![key.to_string()]))
    }

    /// Parse an optional key, failing if it is present but malformed.
    pub fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::invalid(key, e.to_string())),
        }
    }
}

impl FromIterator<(String, String)> for Settings {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
