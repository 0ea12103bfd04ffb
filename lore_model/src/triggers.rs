//! Trigger mechanics: how an entry is activated, how its secondary keywords
//! combine, and where its content lands in the prompt.

use serde::{Deserialize, Serialize};

use crate::error::LoreError;

/// How an entry gets activated during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Substring keyword matching against the recent conversation.
    #[default]
    Keyword,
    /// Always included, independent of keywords.
    Constant,
    /// Cosine similarity against the user message embedding.
    Vectorized,
}

/// Logic used to combine secondary keywords with the primary match.
///
/// Stored either by name or by the numeric codes used in lorebook exports
/// (0 = AND, 1 = NOT_ANY, 2 = NOT_ALL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "SelectiveLogicRepr", into = "&'static str")]
pub enum SelectiveLogic {
    /// Every secondary keyword must be present.
    #[default]
    And,
    /// None of the secondary keywords may be present.
    NotAny,
    /// At least one secondary keyword must be missing.
    NotAll,
}

impl SelectiveLogic {
    /// Resolve a numeric export code.
    pub fn from_code(code: i64) -> Result<Self, LoreError> {
        match code {
            0 => Ok(SelectiveLogic::And),
            1 => Ok(SelectiveLogic::NotAny),
            2 => Ok(SelectiveLogic::NotAll),
            other => Err(LoreError::UnknownSelectiveLogic(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectiveLogic::And => "AND",
            SelectiveLogic::NotAny => "NOT_ANY",
            SelectiveLogic::NotAll => "NOT_ALL",
        }
    }

    /// Decide the secondary match given how many of `total` keywords hit.
    pub fn evaluate(&self, hits: usize, total: usize) -> bool {
        match self {
            SelectiveLogic::And => hits == total,
            SelectiveLogic::NotAny => hits == 0,
            SelectiveLogic::NotAll => hits < total,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectiveLogicRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<SelectiveLogicRepr> for SelectiveLogic {
    type Error = LoreError;

    fn try_from(repr: SelectiveLogicRepr) -> Result<Self, Self::Error> {
        match repr {
            SelectiveLogicRepr::Code(code) => SelectiveLogic::from_code(code),
            SelectiveLogicRepr::Name(name) => match name.to_ascii_uppercase().as_str() {
                "AND" => Ok(SelectiveLogic::And),
                "NOT_ANY" => Ok(SelectiveLogic::NotAny),
                "NOT_ALL" => Ok(SelectiveLogic::NotAll),
                _ => Err(LoreError::Import(format!("unknown selective logic `{}`", name))),
            },
        }
    }
}

impl From<SelectiveLogic> for &'static str {
    fn from(logic: SelectiveLogic) -> Self {
        logic.as_str()
    }
}

impl std::fmt::Display for SelectiveLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entry's content is spliced into the assembled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Before the character block.
    BeforeChar,
    /// After the character block.
    #[default]
    AfterChar,
    /// Rendered with its configured depth annotation.
    AtDepth,
    /// Top of the author's note.
    AnTop,
    /// Bottom of the author's note.
    AnBottom,
}

impl Position {
    /// Map a SillyTavern position code. Unknown codes land after the character.
    pub fn from_sillytavern_code(code: i64) -> Self {
        match code {
            0 => Position::BeforeChar,
            1 => Position::AfterChar,
            4 => Position::AtDepth,
            5 => Position::AnTop,
            6 => Position::AnBottom,
            _ => Position::AfterChar,
        }
    }
}
