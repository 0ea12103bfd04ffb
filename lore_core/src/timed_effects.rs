//! Timed effects - the per-entry sticky / cooldown / delay state machine.
//!
//! The tracker never mutates state in place. [`TimedEffectTracker::update`]
//! computes the next snapshot from the previous one, the counter and the
//! final selection; the caller persists it.

use lore_model::{EntryId, LoreEntry, TimedEntryState, TimedState};
use serde::Serialize;
use tracing::debug;

use crate::entry_store::EntryStore;
use crate::matching::{Activation, TriggeredSet};

/// Why an entry is blocked from matching this scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Delay,
    Cooldown,
}

/// Result of the timed gate for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedGate {
    /// Normal matching applies.
    Open,
    /// Force-included.
    Sticky,
    /// Skipped entirely.
    Blocked(BlockReason),
}

/// Remaining message counts for each timed effect of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedStatus {
    pub sticky_remaining: u64,
    pub cooldown_remaining: u64,
    pub delay_remaining: u64,
}

impl TimedStatus {
    pub fn is_idle(&self) -> bool {
        self.sticky_remaining == 0 && self.cooldown_remaining == 0 && self.delay_remaining == 0
    }
}

/// Stateless evaluator and updater of [`TimedState`].
pub struct TimedEffectTracker;

impl TimedEffectTracker {
    /// Gate an entry at `counter`. Delay is checked first, then cooldown,
    /// then sticky.
    pub fn gate(entry: &LoreEntry, state: &TimedState, counter: u64) -> TimedGate {
        if entry.delay > 0 && counter < entry.delay {
            return TimedGate::Blocked(BlockReason::Delay);
        }

        match state.get(&entry.id) {
            Some(timers) if timers.is_cooling_at(counter) => {
                TimedGate::Blocked(BlockReason::Cooldown)
            }
            Some(timers) if timers.is_sticky_at(counter) => TimedGate::Sticky,
            _ => TimedGate::Open,
        }
    }

    /// Compute the next snapshot after a scan at `counter`.
    ///
    /// `selected` is the post-budget selection. Entries that were only
    /// force-included by their sticky window do not re-arm it.
    pub fn update(
        previous: &TimedState,
        counter: u64,
        selected: &[&LoreEntry],
        triggered: &TriggeredSet,
        store: &EntryStore<'_>,
    ) -> TimedState {
        let mut next = previous.clone();

        for entry in selected {
            let forced = triggered.activation(&entry.id) == Some(Activation::Sticky);
            if entry.sticky > 0 {
                if !forced {
                    let timers = TimedEntryState::sticky_until(counter + entry.sticky);
                    next.insert(entry.id.clone(), timers);
                }
            } else if entry.cooldown > 0 {
                let mut timers = next.get(&entry.id).copied().unwrap_or_default();
                timers.cooldown_until = Some(counter + 1 + entry.cooldown);
                next.insert(entry.id.clone(), timers);
            }
        }

        let selected_ids: Vec<&EntryId> = selected.iter().map(|e| &e.id).collect();
        next.retain(|id, timers| {
            let elapsed = timers.sticky_until.is_some_and(|until| counter > until);
            if !elapsed || selected_ids.contains(&id) {
                return true;
            }
            match store.get(id).map(|e| e.cooldown).filter(|&c| c > 0) {
                Some(cooldown) => {
                    debug!(
                        entry = %id,
                        until = counter + cooldown,
                        "sticky elapsed, entering cooldown"
                    );
                    *timers = TimedEntryState::cooldown_until(counter + cooldown);
                    true
                }
                None => false,
            }
        });

        next.retain(|_, timers| !timers.is_expired_at(counter));
        next.revision = previous.revision + 1;
        next
    }

    /// Remaining sticky, cooldown and delay counts at `counter`.
    pub fn status(entry: &LoreEntry, state: &TimedState, counter: u64) -> TimedStatus {
        let timers = state.get(&entry.id).copied().unwrap_or_default();
        TimedStatus {
            sticky_remaining: timers
                .sticky_until
                .filter(|&until| counter <= until)
                .map_or(0, |until| until - counter + 1),
            cooldown_remaining: timers
                .cooldown_until
                .map_or(0, |until| until.saturating_sub(counter)),
            delay_remaining: entry.delay.saturating_sub(counter),
        }
    }
}
