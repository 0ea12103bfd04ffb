//! # Lore Core
//!
//! The retrieval-and-assembly engine. Given the latest user message of a
//! conversation it selects a bounded set of lore entries, orders them, fits
//! them into a token budget, tracks per-entry timed effects across turns and
//! renders the augmented prompt.
//!
//! ## Core Components
//!
//! - **entry_store**: Flattened, indexed view over the enabled lorebooks
//! - **matching**: Pass-1 keyword / selective / vector / constant triggering
//! - **recursion**: Re-triggering against the content of triggered entries
//! - **timed_effects**: Sticky, cooldown and delay state machine
//! - **budget**: Greedy token-budget selection
//! - **context_assembler**: Positional prompt rendering
//! - **scanner**: The per-turn pipeline tying the above together
//! - **embedding**: Embedding provider seam and entry vectorization
//! - **session**: Turn driver over a persisted conversation snapshot
//!
//! ## Design Philosophy
//!
//! - **Pure pipeline**: a scan reads its inputs and returns the next timed
//!   state; persistence belongs to the caller
//! - **Degrade, don't fail**: embedding failures, budget exhaustion and a
//!   missing persona all mean "include less"

pub mod budget;
pub mod context_assembler;
pub mod embedding;
pub mod entry_store;
pub mod error;
pub mod matching;
pub mod recursion;
pub mod scanner;
pub mod session;
pub mod timed_effects;

pub use budget::*;
pub use context_assembler::*;
pub use embedding::*;
pub use entry_store::*;
pub use error::*;
pub use matching::*;
pub use recursion::*;
pub use scanner::*;
pub use session::*;
pub use timed_effects::*;
