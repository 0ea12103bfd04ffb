//! Engine error types.

use lore_model::LoreError;
use thiserror::Error;

/// Errors surfaced by the session layer.
///
/// Nothing inside a scan produces these: matching, budgeting and assembly
/// degrade to including less instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a scan is already in flight for this conversation")]
    ScanInProgress,

    #[error("message is empty")]
    EmptyMessage,

    #[error("stale snapshot: expected revision {expected}, store has {found}")]
    StaleSnapshot { expected: u64, found: u64 },

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("no embedding provider configured")]
    NoEmbeddingProvider,

    #[error("unknown lorebook entry {0}")]
    UnknownEntry(String),

    #[error(transparent)]
    Model(#[from] LoreError),
}

/// Failures of the external embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(String),

    #[error("embedding timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("embedding provider returned an empty vector")]
    EmptyVector,
}

pub type EngineResult<T> = Result<T, EngineError>;
