//! # Lore Model
//!
//! The "Lorebook" crate - holds every piece of data the lore engine reads:
//! entries, books, character cards, chat history, timed-effect state and scan
//! configuration. This crate is the single source of truth for persisted
//! conversation state and does not contain any matching logic.

pub mod config;
pub mod conversation;
pub mod entries;
pub mod error;
pub mod import;
pub mod timed;
pub mod triggers;

pub use config::*;
pub use conversation::*;
pub use entries::*;
pub use error::*;
pub use import::*;
pub use timed::*;
pub use triggers::*;
