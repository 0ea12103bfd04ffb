//! Entry store - the read-only, per-scan view over the caller's lorebooks.
//!
//! Flattens enabled books into one ordered list (book order, then entry order
//! within a book). That position is the stable tie-break used everywhere an
//! ordering is needed.

use std::collections::HashMap;

use lore_model::{EntryId, LoreBook, LoreEntry, TriggerMode};
use tracing::warn;

/// Indexed view of every entry contributed by enabled books.
#[derive(Debug, Clone, Default)]
pub struct EntryStore<'a> {
    entries: Vec<&'a LoreEntry>,
    index: HashMap<&'a EntryId, usize>,
}

impl<'a> EntryStore<'a> {
    /// Build the store from books. Disabled books are skipped; a repeated id
    /// keeps its first occurrence.
    pub fn from_books(books: &'a [LoreBook]) -> Self {
        let mut store = Self::default();

        for book in books.iter().filter(|b| b.enabled) {
            for entry in &book.entries {
                if store.index.contains_key(&entry.id) {
                    warn!(
                        entry = %entry.id,
                        book = %book.name,
                        "duplicate lore entry id, ignoring"
                    );
                    continue;
                }
                store.index.insert(&entry.id, store.entries.len());
                store.entries.push(entry);
            }
        }

        store
    }

    /// Get an entry by id.
    pub fn get(&self, id: &EntryId) -> Option<&'a LoreEntry> {
        self.index.get(id).map(|&i| self.entries[i])
    }

    /// Iterate entries in stable order.
    pub fn iter(&self) -> impl Iterator<Item = &'a LoreEntry> + '_ {
        self.entries.iter().copied()
    }

    /// Entries that can take part in matching.
    pub fn scannable(&self) -> impl Iterator<Item = &'a LoreEntry> + '_ {
        self.iter().filter(|e| e.is_scannable())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a scan could use a user-message embedding at all.
    pub fn wants_user_embedding(&self, default_mode: TriggerMode) -> bool {
        default_mode == TriggerMode::Vectorized
            || self.scannable().any(|e| {
                e.trigger_mode == TriggerMode::Vectorized && e.chunks().is_some()
            })
    }
}
