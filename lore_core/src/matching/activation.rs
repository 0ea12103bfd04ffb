//! Triggered set - which entries activated during a scan, and why.

use std::collections::HashMap;

use lore_model::EntryId;
use serde::Serialize;

/// Why an entry was activated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Activation {
    /// Constant entry, included regardless of keywords.
    Constant,
    /// Forced by an active sticky window.
    Sticky,
    /// Vector similarity met the threshold.
    Vector { similarity: f32 },
    /// Keyword match against the scan buffer.
    Keyword,
    /// Keyword match against the recursion corpus on the given pass.
    Recursion { pass: usize },
}

/// The set of triggered entry ids. Only ever grows: re-inserting an id keeps
/// its first activation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggeredSet {
    activations: HashMap<EntryId, Activation>,
}

impl TriggeredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an activation. Returns false if the id was already present.
    pub fn insert(&mut self, id: EntryId, activation: Activation) -> bool {
        if self.activations.contains_key(&id) {
            return false;
        }
        self.activations.insert(id, activation);
        true
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.activations.contains_key(id)
    }

    pub fn activation(&self, id: &EntryId) -> Option<Activation> {
        self.activations.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntryId> {
        self.activations.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryId, &Activation)> {
        self.activations.iter()
    }

    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }
}
