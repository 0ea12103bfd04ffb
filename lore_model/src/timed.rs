//! Timed-effect state: per-entry sticky and cooldown windows.
//!
//! Both windows are stored as absolute values of the conversation's
//! monotonic message counter. The state is a versioned snapshot: every
//! tracker update produces a new value with a bumped `revision`, and the
//! caller persists it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entries::EntryId;

/// Timers for one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEntryState {
    /// Last counter value (inclusive) at which the entry is force-included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky_until: Option<u64>,

    /// Counter value (exclusive) until which the entry cannot trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<u64>,
}

impl TimedEntryState {
    pub fn sticky_until(until: u64) -> Self {
        Self {
            sticky_until: Some(until),
            cooldown_until: None,
        }
    }

    pub fn cooldown_until(until: u64) -> Self {
        Self {
            sticky_until: None,
            cooldown_until: Some(until),
        }
    }

    /// Whether the sticky window covers `counter`.
    pub fn is_sticky_at(&self, counter: u64) -> bool {
        self.sticky_until.is_some_and(|until| counter <= until)
    }

    /// Whether the cooldown window covers `counter`.
    pub fn is_cooling_at(&self, counter: u64) -> bool {
        self.cooldown_until.is_some_and(|until| counter < until)
    }

    /// Whether both windows are absent or elapsed at `counter`.
    pub fn is_expired_at(&self, counter: u64) -> bool {
        !self.is_sticky_at(counter) && !self.is_cooling_at(counter)
    }
}

/// Timers for every tracked entry of a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedState {
    /// Bumped on every tracker update.
    #[serde(default)]
    pub revision: u64,

    #[serde(default)]
    entries: BTreeMap<EntryId, TimedEntryState>,
}

impl TimedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &EntryId) -> Option<&TimedEntryState> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: EntryId, timers: TimedEntryState) {
        self.entries.insert(id, timers);
    }

    /// Clear an entry's timers. Returns whether anything was tracked.
    pub fn reset(&mut self, id: &EntryId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Drop every timer, bumping the revision.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.revision += 1;
    }

    pub fn retain(&mut self, keep: impl FnMut(&EntryId, &mut TimedEntryState) -> bool) {
        self.entries.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryId, &TimedEntryState)> {
        self.entries.iter()
    }

    pub fn tracked_ids(&self) -> Vec<EntryId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
