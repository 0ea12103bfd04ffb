//! Errors raised while ingesting lore data and configuration.

use thiserror::Error;

/// Errors produced by the lore data model.
#[derive(Debug, Error)]
pub enum LoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("import failed: {0}")]
    Import(String),

    #[error("unknown selective logic code {0}")]
    UnknownSelectiveLogic(i64),
}

pub type LoreResult<T> = Result<T, LoreError>;
