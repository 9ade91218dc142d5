//! Layered environment lookup.
//!
//! Values from a `.env` file take precedence over the process environment, and the
//! process environment is never modified.

use std::collections::HashMap;
use std::ffi::OsString;
use std::str::FromStr;

use tracing::debug;

use super::dotenv::EnvEntry;
use crate::error::SidekickError;

#[derive(Debug, Clone, Default)]
pub struct EnvLayers {
    /// Highest precedence first
    layers: Vec<HashMap<String, String>>,
}

impl EnvLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Single layer from raw variables. Pairs that are not valid UTF-8 are skipped.
    pub fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let layer = vars
            .into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    debug!(key = %key, "Skipping environment variable with non-UTF-8 value");
                    None
                }
                (Err(key), _) => {
                    debug!(key = ?key, "Skipping environment variable with non-UTF-8 name");
                    None
                }
            })
            .collect();
        Self::new().with_lower_layer(layer)
    }

    /// Put dotenv entries above every existing layer (later duplicates win).
    pub fn with_dotenv(mut self, entries: Vec<EnvEntry>) -> Self {
        let layer = entries.into_iter().map(|e| (e.key, e.value)).collect();
        self.layers.insert(0, layer);
        self
    }

    /// Add a layer below every existing one.
    pub fn with_lower_layer(mut self, layer: HashMap<String, String>) -> Self {
        self.layers.push(layer);
        self
    }

    /// First non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Value for `key`, or a configuration error naming it.
    pub fn require(&self, key: &str) -> Result<String, SidekickError> {
        self.get(key).ok_or_else(|| {
            SidekickError::ConfigurationError(format!("{key} not found in environment variables"))
        })
    }

    /// Parse `key` when present.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, SidekickError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
                SidekickError::ConfigurationError(format!("Invalid value for {key} ('{raw}'): {e}"))
            }),
            None => Ok(None),
        }
    }
}
