use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};

/// Agent tuning knobs.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Link hops allowed in a single path resolution.
    pub max_resolution_depth: usize,
    /// Recompute and check CIDs for blocks whose key arrives with them.
    pub verify_blocks: bool,
    /// Envelopes larger than this are rejected before decoding.
    pub max_message_bytes: usize,
    /// Diagnostics kept in memory; older entries are dropped first.
    pub max_diagnostics: usize,
    /// Upper bound on one host-driven validation, in milliseconds.
    pub validation_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: dagvet_store::DEFAULT_MAX_DEPTH,
            verify_blocks: true,
            max_message_bytes: dagvet_protocol::MAX_MESSAGE_SIZE,
            max_diagnostics: 256,
            validation_timeout_ms: 5_000,
        }
    }
}

impl AgentConfig {
    /// Store blocks as given, without recomputing their CIDs.
    pub fn trusting() -> Self {
        Self {
            verify_blocks: false,
            ..Default::default()
        }
    }

    /// `validation_timeout_ms` as a [`Duration`].
    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> AgentResult<Self> {
        toml::from_str(s).map_err(|e| AgentError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> AgentResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render the full configuration, defaults included.
    pub fn to_toml_string(&self) -> AgentResult<String> {
        toml::to_string_pretty(self).map_err(|e| AgentError::Config(e.to_string()))
    }
}
