//! Recursion expander - passes 2..N, using the content of already-triggered
//! entries as a secondary search corpus.

use lore_model::{LoreEntry, TimedState, TriggerMode};
use tracing::debug;

use crate::entry_store::EntryStore;
use crate::matching::{keyword_match, passes_probability, Activation, RandomSource, TriggeredSet};
use crate::timed_effects::{TimedEffectTracker, TimedGate};

/// Extends a triggered set by keyword matching over triggered content.
///
/// Stops after `max_depth` passes, when the corpus is empty, or at the first
/// pass that adds nothing. The set only grows.
pub struct RecursionExpander<'s, 'a> {
    store: &'s EntryStore<'a>,
    timed: &'s TimedState,
    counter: u64,
}

impl<'s, 'a> RecursionExpander<'s, 'a> {
    pub fn new(store: &'s EntryStore<'a>, timed: &'s TimedState, counter: u64) -> Self {
        Self { store, timed, counter }
    }

    pub fn expand<R: RandomSource + ?Sized>(
        &self,
        triggered: &TriggeredSet,
        max_depth: usize,
        rng: &mut R,
    ) -> TriggeredSet {
        let mut expanded = triggered.clone();

        for pass in 1..=max_depth {
            let corpus = self.corpus(&expanded);
            if corpus.trim().is_empty() {
                break;
            }

            let added: Vec<&LoreEntry> = self
                .store
                .scannable()
                .filter(|e| self.is_candidate(e, &expanded))
                .filter(|e| keyword_match(e, &corpus) && passes_probability(e, rng))
                .collect();

            if added.is_empty() {
                break;
            }
            debug!(pass, added = added.len(), "recursion pass triggered entries");
            for entry in added {
                expanded.insert(entry.id.clone(), Activation::Recursion { pass });
            }
        }

        expanded
    }

    /// Lowercased contents of triggered entries that allow recursion, in
    /// store order.
    fn corpus(&self, triggered: &TriggeredSet) -> String {
        self.store
            .iter()
            .filter(|e| triggered.contains(&e.id) && !e.exclude_recursion)
            .map(|e| e.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    fn is_candidate(&self, entry: &LoreEntry, triggered: &TriggeredSet) -> bool {
        !triggered.contains(&entry.id)
            && !entry.is_constant()
            && entry.trigger_mode != TriggerMode::Vectorized
            && !matches!(
                TimedEffectTracker::gate(entry, self.timed, self.counter),
                TimedGate::Blocked(_)
            )
    }
}
