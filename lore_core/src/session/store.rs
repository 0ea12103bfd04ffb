//! Persistence seam for conversation snapshots.
//!
//! Writes are checked against the timed-state revision the caller loaded, so
//! two overlapping turns over the same conversation cannot silently drop one
//! another's timer updates.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lore_model::{ConversationState, LoreError};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Read-then-write storage for one conversation.
pub trait ConversationStore: Send + Sync {
    /// Load the current snapshot. A store with nothing saved yields the
    /// default state.
    fn load(&self) -> EngineResult<ConversationState>;

    /// Replace the snapshot, provided the stored timed-state revision still
    /// equals `expected_revision`.
    fn save(&self, state: &ConversationState, expected_revision: u64) -> EngineResult<()>;
}

fn check_revision(stored: &ConversationState, expected: u64) -> EngineResult<()> {
    let found = stored.timed_state.revision;
    if found != expected {
        return Err(EngineError::StaleSnapshot { expected, found });
    }
    Ok(())
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<ConversationState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ConversationState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl ConversationStore for InMemoryStore {
    fn load(&self) -> EngineResult<ConversationState> {
        let state = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(state.clone())
    }

    fn save(&self, state: &ConversationState, expected_revision: u64) -> EngineResult<()> {
        let mut stored = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
        check_revision(&stored, expected_revision)?;
        *stored = state.clone();
        Ok(())
    }
}

/// One pretty-printed JSON document per conversation.
///
/// Saves go through a sibling `.tmp` file and a rename. The revision check
/// and the write are serialized by an in-process lock only.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> EngineError {
        LoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
        .into()
    }

    fn read(&self) -> EngineResult<ConversationState> {
        if !self.path.exists() {
            return Ok(ConversationState::default());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let state: ConversationState = serde_json::from_str(&text).map_err(LoreError::from)?;
        Ok(state)
    }
}

impl ConversationStore for JsonFileStore {
    fn load(&self) -> EngineResult<ConversationState> {
        self.read()
    }

    fn save(&self, state: &ConversationState, expected_revision: u64) -> EngineResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| EngineError::LockPoisoned)?;
        check_revision(&self.read()?, expected_revision)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let bytes = serde_json::to_vec_pretty(state).map_err(LoreError::from)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            revision = state.timed_state.revision,
            "conversation saved"
        );
        Ok(())
    }
}
