//! Scan configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{LoreError, LoreResult};
use crate::triggers::TriggerMode;

/// Configuration for a lore scan.
///
/// Loadable from TOML; the storage-style `lore*` key names are accepted as
/// aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of most recent history messages in the keyword buffer.
    #[serde(alias = "loreScanDepth")]
    pub scan_depth: usize,

    /// Cap on the combined estimated tokens of injected lore.
    #[serde(alias = "loreTokenBudget")]
    pub token_budget: usize,

    /// Whether triggered entries can trigger further entries.
    #[serde(alias = "loreRecursion")]
    pub recursion: bool,

    /// Maximum number of recursion passes.
    #[serde(alias = "loreRecursionDepth")]
    pub recursion_depth: usize,

    /// Minimum cosine similarity for a vectorized match.
    #[serde(alias = "loreVectorThreshold")]
    pub vector_threshold: f32,

    /// Global scan strategy.
    #[serde(alias = "loreDefaultTriggerMode")]
    pub default_trigger_mode: TriggerMode,

    /// Timeout imposed on the embedding provider.
    pub embedding_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_depth: 4,
            token_budget: 2048,
            recursion: true,
            recursion_depth: 3,
            vector_threshold: 0.45,
            default_trigger_mode: TriggerMode::Keyword,
            embedding_timeout_ms: 10_000,
        }
    }
}

impl ScanConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> LoreResult<Self> {
        let config: ScanConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> LoreResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> LoreResult<()> {
        if !self.vector_threshold.is_finite() || !(-1.0..=1.0).contains(&self.vector_threshold) {
            return Err(LoreError::InvalidConfig {
                field: "vector_threshold",
                reason: format!("{} is outside [-1, 1]", self.vector_threshold),
            });
        }
        Ok(())
    }

    /// Recursion passes to run; zero when recursion is disabled.
    pub fn effective_recursion_depth(&self) -> usize {
        if self.recursion {
            self.recursion_depth
        } else {
            0
        }
    }

    /// Whether the global strategy is vector similarity.
    pub fn prefers_vectors(&self) -> bool {
        self.default_trigger_mode == TriggerMode::Vectorized
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }
}
