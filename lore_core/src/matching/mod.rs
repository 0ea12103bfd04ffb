//! Match engine - pass-1 direct triggering of entries against the current
//! message and recent history.
//!
//! Each scannable entry is evaluated in this order:
//! 1. **Timed gate**: delay or cooldown blocks the entry outright
//! 2. **Constant**: included if the probability gate passes
//! 3. **Sticky**: an active sticky window forces inclusion
//! 4. **Vector**: max cosine similarity over the entry's chunks
//! 5. **Keyword**: primary + selective keywords over the scan buffer

mod activation;
mod context;
mod keywords;
mod probability;
mod vector;

pub use activation::*;
pub use context::*;
pub use keywords::*;
pub use probability::*;
pub use vector::*;

use lore_model::{LoreEntry, ScanConfig, TimedState, TriggerMode};
use tracing::debug;

use crate::entry_store::EntryStore;
use crate::timed_effects::{TimedEffectTracker, TimedGate};

/// Direct (first pass) matcher.
pub struct MatchEngine<'c> {
    config: &'c ScanConfig,
}

impl<'c> MatchEngine<'c> {
    pub fn new(config: &'c ScanConfig) -> Self {
        Self { config }
    }

    /// Evaluate every scannable entry and collect the triggered set.
    ///
    /// Without a `user_embedding` every entry is evaluated keyword-only.
    pub fn run<R: RandomSource + ?Sized>(
        &self,
        store: &EntryStore<'_>,
        ctx: &mut ScanContext<'_>,
        user_embedding: Option<&[f32]>,
        timed: &TimedState,
        counter: u64,
        rng: &mut R,
    ) -> TriggeredSet {
        let mut triggered = TriggeredSet::new();

        for entry in store.scannable() {
            let gate = TimedEffectTracker::gate(entry, timed, counter);
            if let Some(activation) = self.evaluate(entry, gate, ctx, user_embedding, rng) {
                debug!(entry = %entry.id, ?activation, "lore entry triggered");
                triggered.insert(entry.id.clone(), activation);
            }
        }

        triggered
    }

    fn evaluate<R: RandomSource + ?Sized>(
        &self,
        entry: &LoreEntry,
        gate: TimedGate,
        ctx: &mut ScanContext<'_>,
        user_embedding: Option<&[f32]>,
        rng: &mut R,
    ) -> Option<Activation> {
        if let TimedGate::Blocked(reason) = gate {
            debug!(entry = %entry.id, ?reason, "lore entry timed out of this scan");
            return None;
        }

        if entry.is_constant() {
            return passes_probability(entry, rng).then_some(Activation::Constant);
        }

        if gate == TimedGate::Sticky {
            return Some(Activation::Sticky);
        }

        let strictly_vectorized = entry.trigger_mode == TriggerMode::Vectorized;
        if let (Some(chunks), Some(query)) = (entry.chunks(), user_embedding) {
            if strictly_vectorized || self.config.prefers_vectors() {
                let similarity = max_similarity(query, chunks);
                if similarity >= self.config.vector_threshold && passes_probability(entry, rng) {
                    return Some(Activation::Vector { similarity });
                }
                if strictly_vectorized {
                    return None;
                }
            }
        }

        let buffer = ctx.buffer(entry.scan_depth);
        (keyword_match(entry, buffer) && passes_probability(entry, rng))
            .then_some(Activation::Keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_model::{ChatMessage, EntryId, LoreBook, TimedEntryState};

    fn run(
        books: &[LoreBook],
        history: &[ChatMessage],
        message: &str,
        embedding: Option<&[f32]>,
        config: &ScanConfig,
        timed: &TimedState,
        counter: u64,
    ) -> TriggeredSet {
        let store = EntryStore::from_books(books);
        let mut ctx = ScanContext::new(history, message, config.scan_depth);
        MatchEngine::new(config).run(
            &store,
            &mut ctx,
            embedding,
            timed,
            counter,
            &mut FixedRoll(50.0),
        )
    }

    /// Default config, no timers, no history.
    fn run_fresh(books: &[LoreBook], message: &str, embedding: Option<&[f32]>) -> TriggeredSet {
        let config = ScanConfig::default();
        run(books, &[], message, embedding, &config, &TimedState::new(), 0)
    }

    fn id(s: &str) -> EntryId {
        EntryId::from(s)
    }

    #[test]
    fn test_keyword_trigger_from_current_message() {
        let books = vec![LoreBook::new("w")
            .with_entry(LoreEntry::new("Dragons").with_id("dragon").with_keywords(["dragon"]))
            .with_entry(LoreEntry::new("Elves").with_id("elf").with_keywords(["elf"]))];

        let triggered = run_fresh(&books, "A DRAGON appears", None);
        assert!(triggered.contains(&id("dragon")));
        assert!(!triggered.contains(&id("elf")));
        assert_eq!(triggered.activation(&id("dragon")), Some(Activation::Keyword));
    }

    #[test]
    fn test_entry_scan_depth_override() {
        let books = vec![LoreBook::new("w").with_entry(
            LoreEntry::new("Dragons")
                .with_id("dragon")
                .with_keywords(["dragon"])
                .with_scan_depth(1),
        )];
        let history: Vec<_> = ["dragon talk", "weather"]
            .iter()
            .map(|t| ChatMessage::user(*t))
            .collect();

        let config = ScanConfig::default();
        let triggered = run(&books, &history, "hello", None, &config, &TimedState::new(), 0);
        assert!(triggered.is_empty());
    }

    #[test]
    fn test_disabled_and_pending_entries_skipped() {
        let mut pending = LoreEntry::new("p").with_id("pending").with_keywords(["dragon"]);
        pending.pending = true;
        let books = vec![LoreBook::new("w")
            .with_entry(pending)
            .with_entry(
                LoreEntry::new("d")
                    .with_id("disabled")
                    .with_keywords(["dragon"])
                    .disabled(),
            )];

        let triggered = run_fresh(&books, "dragon", None);
        assert!(triggered.is_empty());
    }

    #[test]
    fn test_constant_ignores_keywords_but_not_probability() {
        let books = vec![LoreBook::new("w")
            .with_entry(
                LoreEntry::new("always")
                    .with_id("c1")
                    .with_trigger_mode(TriggerMode::Constant),
            )
            .with_entry(
                LoreEntry::new("rarely")
                    .with_id("c2")
                    .with_trigger_mode(TriggerMode::Constant)
                    .with_probability(10),
            )];

        let triggered = run_fresh(&books, "nothing relevant", None);
        assert_eq!(triggered.activation(&id("c1")), Some(Activation::Constant));
        assert!(!triggered.contains(&id("c2")));
    }

    #[test]
    fn test_sticky_forces_inclusion() {
        let books = vec![LoreBook::new("w").with_entry(
            LoreEntry::new("Dragons").with_id("dragon").with_keywords(["dragon"]).with_sticky(3),
        )];
        let mut timed = TimedState::new();
        timed.insert(id("dragon"), TimedEntryState::sticky_until(13));

        let triggered = run(&books, &[], "unrelated", None, &ScanConfig::default(), &timed, 12);
        assert_eq!(triggered.activation(&id("dragon")), Some(Activation::Sticky));
    }

    #[test]
    fn test_cooldown_and_delay_block() {
        let books = vec![LoreBook::new("w")
            .with_entry(LoreEntry::new("a").with_id("cooling").with_keywords(["dragon"]))
            .with_entry(
                LoreEntry::new("b")
                    .with_id("delayed")
                    .with_keywords(["dragon"])
                    .with_delay(5),
            )];
        let mut timed = TimedState::new();
        timed.insert(id("cooling"), TimedEntryState::cooldown_until(4));

        let early = run(&books, &[], "dragon", None, &ScanConfig::default(), &timed, 3);
        assert!(early.is_empty());

        let later = run(&books, &[], "dragon", None, &ScanConfig::default(), &timed, 5);
        assert!(later.contains(&id("cooling")));
        assert!(later.contains(&id("delayed")));
    }

    #[test]
    fn test_vectorized_entry_matches_by_similarity() {
        let books = vec![LoreBook::new("w").with_entry(
            LoreEntry::new("Sea lore")
                .with_id("sea")
                .with_keywords(["ocean"])
                .with_trigger_mode(TriggerMode::Vectorized)
                .with_embedding_chunks(vec![vec![0.0, 1.0], vec![1.0, 0.0]]),
        )];
        let hit = run_fresh(&books, "waves", Some(&[0.9, 0.1][..]));
        assert!(matches!(hit.activation(&id("sea")), Some(Activation::Vector { .. })));

        // Strictly vectorized: a miss does not fall back to keywords.
        let miss = run_fresh(&books, "ocean", Some(&[-1.0, 0.0][..]));
        assert!(miss.is_empty());
    }

    #[test]
    fn test_vectorized_entry_falls_back_to_keywords_without_embedding() {
        let books = vec![LoreBook::new("w").with_entry(
            LoreEntry::new("Sea lore")
                .with_id("sea")
                .with_keywords(["ocean"])
                .with_trigger_mode(TriggerMode::Vectorized)
                .with_embedding_chunks(vec![vec![1.0, 0.0]]),
        )];

        let triggered = run_fresh(&books, "the ocean", None);
        assert_eq!(triggered.activation(&id("sea")), Some(Activation::Keyword));
    }

    #[test]
    fn test_global_vector_mode_falls_through_to_keywords() {
        let books = vec![LoreBook::new("w").with_entry(
            LoreEntry::new("Sea lore")
                .with_id("sea")
                .with_keywords(["ocean"])
                .with_embedding_chunks(vec![vec![1.0, 0.0]]),
        )];
        let config = ScanConfig {
            default_trigger_mode: TriggerMode::Vectorized,
            ..ScanConfig::default()
        };

        let embedding = Some(&[0.0, 1.0][..]);
        let triggered = run(&books, &[], "the ocean", embedding, &config, &TimedState::new(), 0);
        assert_eq!(triggered.activation(&id("sea")), Some(Activation::Keyword));
    }

    #[test]
    fn test_dimension_mismatch_is_zero_similarity() {
        let books = vec![LoreBook::new("w").with_entry(
            LoreEntry::new("Sea lore")
                .with_id("sea")
                .with_trigger_mode(TriggerMode::Vectorized)
                .with_embedding_chunks(vec![vec![1.0, 0.0, 0.0]]),
        )];

        let triggered = run_fresh(&books, "waves", Some(&[1.0, 0.0][..]));
        assert!(triggered.is_empty());
    }
}
