//! Prompt assembler - groups the selected entries by insertion position and
//! renders the composed prompt around the character card and author's note.
//!
//! Block order is fixed:
//! 1. `before_char` lore
//! 2. the character block
//! 3. `after_char` lore
//! 4. the author's note (`an_top` lore, note text, `an_bottom` lore)
//! 5. `at_depth` lore

use lore_model::{CharacterCard, LoreEntry, Position};
use tracing::debug;

use crate::budget::estimate_tokens;

/// Selected entries grouped by insertion position, each in selection order.
#[derive(Debug, Clone, Default)]
pub struct PositionBuckets<'a> {
    pub before_char: Vec<&'a LoreEntry>,
    pub after_char: Vec<&'a LoreEntry>,
    pub at_depth: Vec<&'a LoreEntry>,
    pub an_top: Vec<&'a LoreEntry>,
    pub an_bottom: Vec<&'a LoreEntry>,
}

impl<'a> PositionBuckets<'a> {
    pub fn group(selected: &[&'a LoreEntry]) -> Self {
        let mut buckets = Self::default();
        for &entry in selected {
            let bucket = match entry.position {
                Position::BeforeChar => &mut buckets.before_char,
                Position::AfterChar => &mut buckets.after_char,
                Position::AtDepth => &mut buckets.at_depth,
                Position::AnTop => &mut buckets.an_top,
                Position::AnBottom => &mut buckets.an_bottom,
            };
            bucket.push(entry);
        }
        buckets
    }
}

/// The rendered blocks of one turn, before final composition.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub blocks: Vec<String>,
    pub user_message: String,
}

impl AssembledPrompt {
    /// Compose the final text: all blocks inside a `<context>` wrapper,
    /// followed by the user message verbatim.
    pub fn to_prompt_string(&self) -> String {
        format!("<context>\n{}\n</context>\n\n{}", self.blocks.join("\n\n"), self.user_message)
    }
}

/// Renders the selection into prompt text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Render the final prompt. `None` means "no assembly": there is no
    /// active card, or nothing at all to render.
    pub fn assemble(
        &self,
        user_message: &str,
        selected: &[&LoreEntry],
        card: Option<&CharacterCard>,
        author_note: &str,
    ) -> Option<String> {
        let assembled = self.build(user_message, selected, card, author_note)?;
        let prompt = assembled.to_prompt_string();
        debug!(
            blocks = assembled.blocks.len(),
            tokens = estimate_tokens(&prompt),
            "assembled prompt"
        );
        Some(prompt)
    }

    /// Group and render the blocks without composing the final text.
    pub fn build(
        &self,
        user_message: &str,
        selected: &[&LoreEntry],
        card: Option<&CharacterCard>,
        author_note: &str,
    ) -> Option<AssembledPrompt> {
        let card = card?;
        let buckets = PositionBuckets::group(selected);
        let mut blocks = Vec::new();

        if !buckets.before_char.is_empty() {
            blocks.push(lore_block(Some("before_char"), &buckets.before_char, keyed_line));
        }
        if let Some(block) = character_block(card) {
            blocks.push(block);
        }
        if !buckets.after_char.is_empty() {
            blocks.push(lore_block(None, &buckets.after_char, keyed_line));
        }
        if let Some(block) = author_note_block(&buckets, author_note) {
            blocks.push(block);
        }
        if !buckets.at_depth.is_empty() {
            blocks.push(lore_block(Some("at_depth"), &buckets.at_depth, depth_line));
        }

        if blocks.is_empty() {
            return None;
        }
        Some(AssembledPrompt {
            blocks,
            user_message: user_message.to_string(),
        })
    }
}

fn keyed_line(entry: &LoreEntry) -> String {
    format!("[{}]: {}", entry.label(), entry.content)
}

fn depth_line(entry: &LoreEntry) -> String {
    format!("[{} @d{}]: {}", entry.label(), entry.depth, entry.content)
}

fn lore_block(
    position: Option<&str>,
    entries: &[&LoreEntry],
    line: fn(&LoreEntry) -> String,
) -> String {
    let open = match position {
        Some(position) => format!("<lorebook position=\"{position}\">"),
        None => "<lorebook>".to_string(),
    };
    let body = entries.iter().map(|e| line(e)).collect::<Vec<_>>().join("\n");
    format!("{open}\n{body}\n</lorebook>")
}

fn character_block(card: &CharacterCard) -> Option<String> {
    let fields = [
        ("", &card.system_prompt),
        ("Name: ", &card.name),
        ("Description: ", &card.description),
        ("Personality: ", &card.personality),
        ("Scenario: ", &card.scenario),
    ];
    let lines: Vec<String> = fields
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{label}{value}"))
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(format!("<character>\n{}\n</character>", lines.join("\n")))
}

fn joined_contents(entries: &[&LoreEntry]) -> String {
    entries.iter().map(|e| e.content.as_str()).collect::<Vec<_>>().join("\n")
}

fn author_note_block(buckets: &PositionBuckets<'_>, note: &str) -> Option<String> {
    let mut parts = Vec::new();
    if !buckets.an_top.is_empty() {
        parts.push(joined_contents(&buckets.an_top));
    }
    if !note.trim().is_empty() {
        parts.push(note.to_string());
    }
    if !buckets.an_bottom.is_empty() {
        parts.push(joined_contents(&buckets.an_bottom));
    }

    if parts.is_empty() {
        return None;
    }
    Some(format!("<author_note>\n{}\n</author_note>", parts.join("\n")))
}
