//! Session - the turn driver binding storage, embeddings and the scanner
//! for one conversation.
//!
//! A turn is load -> (embed) -> scan -> assemble -> record -> save. Every
//! operation that writes the snapshot holds the session's busy flag, so a
//! second operation started while one is in flight fails fast with
//! [`EngineError::ScanInProgress`] instead of racing the timed-state update.

mod store;

pub use store::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use lore_model::{BookId, ChatMessage, EntryId, Role, ScanConfig};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context_assembler::PromptAssembler;
use crate::embedding::{embed_with_timeout, vectorize_books, EmbeddingProvider, VectorizeReport};
use crate::entry_store::EntryStore;
use crate::error::{EngineError, EngineResult};
use crate::matching::{RandomSource, ThreadRandom};
use crate::scanner::{LoreScanner, ScanRequest};
use crate::timed_effects::{TimedEffectTracker, TimedStatus};

/// What a processed user message produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// The assembled prompt, or `None` when no assembly happened.
    pub prompt: Option<String>,
    /// Text to send on: the prompt, or the raw message unmodified.
    pub outbound: String,
    /// Selected entry ids in injection priority order.
    pub selected: Vec<EntryId>,
    pub tokens_used: usize,
    pub used_embedding: bool,
}

impl TurnOutcome {
    fn passthrough(message: &str) -> Self {
        Self {
            prompt: None,
            outbound: message.to_string(),
            selected: Vec::new(),
            tokens_used: 0,
            used_embedding: false,
        }
    }
}

/// Clears the busy flag on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Lore engine bound to one conversation.
pub struct LoreSession<S: ConversationStore, R: RandomSource = ThreadRandom> {
    store: S,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    config: ScanConfig,
    scanner: Mutex<LoreScanner<R>>,
    assembler: PromptAssembler,
    busy: AtomicBool,
}

impl<S: ConversationStore> LoreSession<S, ThreadRandom> {
    pub fn new(store: S, config: ScanConfig) -> Self {
        Self::with_rng(store, config, ThreadRandom)
    }
}

impl<S: ConversationStore, R: RandomSource> LoreSession<S, R> {
    pub fn with_rng(store: S, config: ScanConfig, rng: R) -> Self {
        Self {
            store,
            embedder: None,
            scanner: Mutex::new(LoreScanner::new(config.clone(), rng)),
            config,
            assembler: PromptAssembler::new(),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn begin(&self) -> EngineResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| EngineError::ScanInProgress)?;
        Ok(BusyGuard(&self.busy))
    }

    /// Run one turn for a user message.
    pub async fn process_message(&self, raw: &str) -> EngineResult<TurnOutcome> {
        let message = raw.trim();
        if message.is_empty() {
            return Err(EngineError::EmptyMessage);
        }
        let _busy = self.begin()?;

        let mut state = self.store.load()?;
        if !state.enabled {
            debug!("lore engine disabled, passing message through");
            return Ok(TurnOutcome::passthrough(message));
        }
        if state.active_card().is_none() {
            debug!("no active character card, passing message through");
            return Ok(TurnOutcome::passthrough(message));
        }
        let expected_revision = state.timed_state.revision;

        let wants_embedding = EntryStore::from_books(&state.lore_books)
            .wants_user_embedding(self.config.default_trigger_mode);
        let embedding = if wants_embedding {
            self.embed_user_message(message).await
        } else {
            None
        };

        let (prompt, selected, tokens_used, next_timed_state) = {
            let mut scanner = self.scanner.lock().map_err(|_| EngineError::LockPoisoned)?;
            let mut request = ScanRequest::new(
                message,
                &state.chat_history,
                &state.lore_books,
                &state.timed_state,
                state.total_message_count,
            );
            if let Some(embedding) = &embedding {
                request = request.with_embedding(embedding);
            }

            let outcome = scanner.scan(&request);
            let prompt = self.assembler.assemble(
                message,
                &outcome.selected,
                state.active_card(),
                &state.author_note,
            );
            let selected: Vec<EntryId> = outcome.selected.iter().map(|e| e.id.clone()).collect();
            (prompt, selected, outcome.tokens_used, outcome.next_timed_state)
        };

        state.timed_state = next_timed_state;
        state.push_message(ChatMessage::user(message));
        if let Some(prompt) = &prompt {
            state.last_assembled_prompt = prompt.clone();
        }
        self.store.save(&state, expected_revision)?;

        info!(
            entries = selected.len(),
            tokens = tokens_used,
            assembled = prompt.is_some(),
            counter = state.total_message_count,
            "turn processed"
        );

        Ok(TurnOutcome {
            outbound: prompt.clone().unwrap_or_else(|| message.to_string()),
            prompt,
            selected,
            tokens_used,
            used_embedding: embedding.is_some(),
        })
    }

    async fn embed_user_message(&self, message: &str) -> Option<Vec<f32>> {
        let provider = self.embedder.as_ref()?;
        match embed_with_timeout(&**provider, message, self.config.embedding_timeout()).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    error = %e,
                    "user embedding failed, scanning keyword-only"
                );
                None
            }
        }
    }

    /// Record a model reply. A reply repeating the model message that ends the
    /// history is ignored; returns whether it was recorded.
    pub async fn record_model_reply(&self, text: &str) -> EngineResult<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        let _busy = self.begin()?;

        let mut state = self.store.load()?;
        let last = state.chat_history.last();
        if last.is_some_and(|m| m.role == Role::Model && m.text == text) {
            return Ok(false);
        }

        let expected_revision = state.timed_state.revision;
        state.push_message(ChatMessage::model(text));
        self.store.save(&state, expected_revision)?;
        Ok(true)
    }

    /// Empty the history and reset the message counter and every timer.
    pub async fn clear_history(&self) -> EngineResult<()> {
        let _busy = self.begin()?;
        let mut state = self.store.load()?;
        let expected_revision = state.timed_state.revision;
        state.clear_history();
        self.store.save(&state, expected_revision)?;
        info!("conversation history cleared");
        Ok(())
    }

    /// Import a SillyTavern lorebook as a new book.
    pub async fn import_sillytavern(&self, json: &str) -> EngineResult<BookId> {
        let book = lore_model::import_sillytavern(json)?;
        let _busy = self.begin()?;
        let mut state = self.store.load()?;
        let expected_revision = state.timed_state.revision;

        info!(book = %book.name, entries = book.entry_count(), "lorebook imported");
        let id = state.add_book(book);
        self.store.save(&state, expected_revision)?;
        Ok(id)
    }

    /// Vectorize every enabled entry of every enabled book.
    pub async fn vectorize_all(&self) -> EngineResult<VectorizeReport> {
        let provider = self.embedder.clone().ok_or(EngineError::NoEmbeddingProvider)?;
        let _busy = self.begin()?;
        let mut state = self.store.load()?;
        let expected_revision = state.timed_state.revision;

        let report = vectorize_books(
            &*provider,
            &mut state.lore_books,
            self.config.embedding_timeout(),
        )
        .await;
        self.store.save(&state, expected_revision)?;

        info!(vectorized = report.vectorized, failed = report.failed, "vectorization finished");
        Ok(report)
    }

    /// Clear one entry's timers. Returns whether anything was tracked.
    pub async fn reset_timer(&self, id: &EntryId) -> EngineResult<bool> {
        let _busy = self.begin()?;
        let mut state = self.store.load()?;
        if state.find_entry(id).is_none() && state.timed_state.get(id).is_none() {
            return Err(EngineError::UnknownEntry(id.to_string()));
        }

        let expected_revision = state.timed_state.revision;
        if !state.timed_state.reset(id) {
            return Ok(false);
        }
        state.timed_state.revision += 1;
        self.store.save(&state, expected_revision)?;
        Ok(true)
    }

    /// Remaining timed effects of an entry at the current counter.
    pub fn timed_status(&self, id: &EntryId) -> EngineResult<TimedStatus> {
        let state = self.store.load()?;
        let entry = state
            .find_entry(id)
            .ok_or_else(|| EngineError::UnknownEntry(id.to_string()))?;
        Ok(TimedEffectTracker::status(entry, &state.timed_state, state.total_message_count))
    }
}
