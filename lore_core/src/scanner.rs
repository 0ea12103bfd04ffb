//! Lore scanner - the per-turn pipeline over one conversation's inputs.
//!
//! match -> recursion -> budget -> timed update. Pure with respect to its
//! inputs apart from the random source; the next timed snapshot is returned
//! for the caller to persist.

use lore_model::{ChatMessage, LoreBook, LoreEntry, ScanConfig, TimedState};
use tracing::info;

use crate::budget::{triggered_entries, BudgetAllocator};
use crate::entry_store::EntryStore;
use crate::matching::{MatchEngine, RandomSource, ScanContext, ThreadRandom, TriggeredSet};
use crate::recursion::RecursionExpander;
use crate::timed_effects::TimedEffectTracker;

/// Everything one scan reads.
#[derive(Debug, Clone, Copy)]
pub struct ScanRequest<'a> {
    pub user_message: &'a str,
    /// Chat history before the current message, oldest first.
    pub history: &'a [ChatMessage],
    pub books: &'a [LoreBook],
    pub timed_state: &'a TimedState,
    pub total_message_count: u64,
    pub user_embedding: Option<&'a [f32]>,
}

impl<'a> ScanRequest<'a> {
    pub fn new(
        user_message: &'a str,
        history: &'a [ChatMessage],
        books: &'a [LoreBook],
        timed_state: &'a TimedState,
        total_message_count: u64,
    ) -> Self {
        Self {
            user_message,
            history,
            books,
            timed_state,
            total_message_count,
            user_embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: &'a [f32]) -> Self {
        self.user_embedding = Some(embedding);
        self
    }
}

/// Result of one scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome<'a> {
    /// Budgeted selection, constants first then by `order`.
    pub selected: Vec<&'a LoreEntry>,
    /// Every triggered entry and why, before budgeting.
    pub triggered: TriggeredSet,
    pub tokens_used: usize,
    pub next_timed_state: TimedState,
}

/// Runs the scan pipeline with a fixed config and random source.
pub struct LoreScanner<R: RandomSource = ThreadRandom> {
    config: ScanConfig,
    rng: R,
}

impl LoreScanner<ThreadRandom> {
    pub fn with_config(config: ScanConfig) -> Self {
        Self::new(config, ThreadRandom)
    }
}

impl<R: RandomSource> LoreScanner<R> {
    pub fn new(config: ScanConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan<'a>(&mut self, request: &ScanRequest<'a>) -> ScanOutcome<'a> {
        let store = EntryStore::from_books(request.books);
        let counter = request.total_message_count;
        let mut ctx =
            ScanContext::new(request.history, request.user_message, self.config.scan_depth);

        let direct = MatchEngine::new(&self.config).run(
            &store,
            &mut ctx,
            request.user_embedding,
            request.timed_state,
            counter,
            &mut self.rng,
        );
        let triggered = RecursionExpander::new(&store, request.timed_state, counter).expand(
            &direct,
            self.config.effective_recursion_depth(),
            &mut self.rng,
        );

        let allocation = BudgetAllocator::new(self.config.token_budget)
            .allocate(triggered_entries(&store, &triggered));
        let next_timed_state = TimedEffectTracker::update(
            request.timed_state,
            counter,
            &allocation.selected,
            &triggered,
            &store,
        );

        info!(
            entries = allocation.selected.len(),
            triggered = triggered.len(),
            dropped = allocation.dropped.len(),
            tokens = allocation.tokens_used,
            "lore scan complete"
        );

        ScanOutcome {
            selected: allocation.selected,
            triggered,
            tokens_used: allocation.tokens_used,
            next_timed_state,
        }
    }
}
