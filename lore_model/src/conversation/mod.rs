//! Conversation state - the persisted snapshot a lore scan reads and writes.

mod card;
mod message;

pub use card::*;
pub use message::*;

use serde::{Deserialize, Serialize};

use crate::entries::{BookId, CardId, EntryId, LoreBook, LoreEntry};
use crate::timed::TimedState;

/// Everything persisted for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationState {
    /// Master switch; when off, messages pass through untouched.
    pub enabled: bool,

    pub character_cards: Vec<CharacterCard>,

    pub active_card: Option<CardId>,

    pub lore_books: Vec<LoreBook>,

    pub chat_history: Vec<ChatMessage>,

    /// Monotonic message counter used by delay, sticky and cooldown.
    pub total_message_count: u64,

    #[serde(alias = "loreTimedState")]
    pub timed_state: TimedState,

    pub author_note: String,

    pub last_assembled_prompt: String,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            enabled: true,
            character_cards: Vec::new(),
            active_card: None,
            lore_books: Vec::new(),
            chat_history: Vec::new(),
            total_message_count: 0,
            timed_state: TimedState::default(),
            author_note: String::new(),
            last_assembled_prompt: String::new(),
        }
    }
}

impl ConversationState {
    /// Create a new empty conversation state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active character card, if one is selected and present.
    pub fn active_card(&self) -> Option<&CharacterCard> {
        let id = self.active_card.as_ref()?;
        self.character_cards.iter().find(|card| &card.id == id)
    }

    /// Add a card and make it the active persona.
    pub fn activate_card(&mut self, card: CharacterCard) -> CardId {
        let id = card.id.clone();
        self.character_cards.retain(|c| c.id != id);
        self.character_cards.push(card);
        self.active_card = Some(id.clone());
        id
    }

    pub fn add_book(&mut self, book: LoreBook) -> BookId {
        let id = book.id.clone();
        self.lore_books.push(book);
        id
    }

    /// Find an entry across all books.
    pub fn find_entry(&self, id: &EntryId) -> Option<&LoreEntry> {
        self.lore_books.iter().find_map(|b| b.get_entry(id))
    }

    /// Append a message and advance the message counter.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat_history.push(message);
        self.total_message_count += 1;
    }

    /// Drop history, the message counter and every timer.
    pub fn clear_history(&mut self) {
        self.chat_history.clear();
        self.total_message_count = 0;
        self.timed_state.clear();
    }
}
