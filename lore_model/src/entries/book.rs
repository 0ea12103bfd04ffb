//! Lorebooks - named, independently enable-able collections of entries.

use serde::{Deserialize, Serialize};

use super::{BookId, EntryId, LoreEntry};

/// A named collection of lore entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreBook {
    #[serde(default)]
    pub id: BookId,

    #[serde(default)]
    pub name: String,

    /// Disabled books contribute no entries to a scan.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub entries: Vec<LoreEntry>,
}

fn default_enabled() -> bool {
    true
}

impl LoreBook {
    /// Create a new, empty, enabled book.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BookId::new(),
            name: name.into(),
            enabled: true,
            entries: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<BookId>) -> Self {
        self.id = id.into();
        self
    }

    /// Add an entry to this book.
    pub fn with_entry(mut self, entry: LoreEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add multiple entries to this book.
    pub fn with_entries(mut self, entries: impl IntoIterator<Item = LoreEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Append an entry, returning its id.
    pub fn add_entry(&mut self, entry: LoreEntry) -> EntryId {
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    pub fn get_entry(&self, id: &EntryId) -> Option<&LoreEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn get_entry_mut(&mut self, id: &EntryId) -> Option<&mut LoreEntry> {
        self.entries.iter_mut().find(|e| &e.id == id)
    }

    /// Remove an entry from the book.
    pub fn remove_entry(&mut self, id: &EntryId) -> Option<LoreEntry> {
        let index = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
