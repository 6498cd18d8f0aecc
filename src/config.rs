use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::finalizer::ChainConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMapConfig {
    pub capacity_hint: usize,
    /// Value stored under the all-zero key before the probe loop runs.
    pub seed: Option<i64>,
}

impl Default for KeyMapConfig {
    fn default() -> Self {
        Self {
            capacity_hint: 16,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryOutput {
    /// Pretty JSON on stdout.
    #[default]
    Json,
    /// Structured `tracing` events.
    Tracing,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub keymap: KeyMapConfig,
    pub chain: ChainConfig,
    pub telemetry: TelemetryOutput,
}

impl ProbeConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
