//! Lore entry definitions - the unit of injectable knowledge.

use serde::{Deserialize, Serialize};

use super::EntryId;
use crate::triggers::{Position, SelectiveLogic, TriggerMode};

/// Default sort key for entries.
pub const DEFAULT_ORDER: i32 = 100;

/// Default render depth for `at_depth` entries.
pub const DEFAULT_DEPTH: u32 = 4;

/// A lore entry: a knowledge snippet with trigger conditions and an
/// insertion position.
///
/// Entries deserialize through a permissive raw shape and are normalized once
/// on ingestion, so read sites can rely on the documented ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawLoreEntry")]
pub struct LoreEntry {
    pub id: EntryId,

    /// Primary trigger keywords.
    pub keyword: Vec<String>,

    /// Secondary (selective) keywords.
    pub keysecondary: Vec<String>,

    /// Text spliced into the prompt.
    pub content: String,

    pub enabled: bool,

    pub trigger_mode: TriggerMode,

    /// Legacy constant flag; equivalent to `TriggerMode::Constant`.
    pub constant: bool,

    /// Whether `keysecondary` participates in matching.
    pub selective: bool,

    pub selective_logic: SelectiveLogic,

    /// Override of the global scan depth (`None` uses the global value).
    pub scan_depth: Option<usize>,

    pub position: Position,

    /// Only used when rendering `at_depth` entries.
    pub depth: u32,

    /// Sort key, lower first.
    pub order: i32,

    /// Keep this entry's content out of the recursion corpus.
    pub exclude_recursion: bool,

    /// Activation chance in percent (0 - 100).
    pub probability: u8,

    pub use_probability: bool,

    /// Messages the entry stays force-included after triggering.
    pub sticky: u64,

    /// Messages the entry is blocked after triggering.
    pub cooldown: u64,

    /// Total messages that must elapse before the entry can trigger.
    pub delay: u64,

    /// Opaque grouping label, carried through untouched.
    pub group: String,

    /// Entry is still being produced and must not be matched.
    pub pending: bool,

    /// One embedding vector per text chunk.
    pub embedding_chunks: Option<Vec<Vec<f32>>>,
}

impl LoreEntry {
    /// Create a new keyword entry with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            keyword: Vec::new(),
            keysecondary: Vec::new(),
            content: content.into(),
            enabled: true,
            trigger_mode: TriggerMode::Keyword,
            constant: false,
            selective: false,
            selective_logic: SelectiveLogic::And,
            scan_depth: None,
            position: Position::AfterChar,
            depth: DEFAULT_DEPTH,
            order: DEFAULT_ORDER,
            exclude_recursion: false,
            probability: 100,
            use_probability: false,
            sticky: 0,
            cooldown: 0,
            delay: 0,
            group: String::new(),
            pending: false,
            embedding_chunks: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the primary keywords. Blank keywords are dropped.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyword = clean_keywords(keywords.into_iter().map(Into::into));
        self
    }

    /// Enable selective matching with the given secondary keywords.
    pub fn with_secondary<I, S>(mut self, logic: SelectiveLogic, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selective = true;
        self.selective_logic = logic;
        self.keysecondary = clean_keywords(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the sort key. Zero means "unset" and becomes [`DEFAULT_ORDER`].
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = normalize_order(order);
        self
    }

    /// Override the scan depth. Zero falls back to the global depth.
    pub fn with_scan_depth(mut self, depth: usize) -> Self {
        self.scan_depth = (depth > 0).then_some(depth);
        self
    }

    /// Enable the probability gate with a clamped percentage.
    pub fn with_probability(mut self, probability: i64) -> Self {
        self.probability = clamp_probability(probability);
        self.use_probability = true;
        self
    }

    pub fn with_sticky(mut self, messages: u64) -> Self {
        self.sticky = messages;
        self
    }

    pub fn with_cooldown(mut self, messages: u64) -> Self {
        self.cooldown = messages;
        self
    }

    pub fn with_delay(mut self, messages: u64) -> Self {
        self.delay = messages;
        self
    }

    pub fn excluding_recursion(mut self) -> Self {
        self.exclude_recursion = true;
        self
    }

    pub fn with_embedding_chunks(mut self, chunks: Vec<Vec<f32>>) -> Self {
        self.embedding_chunks = (!chunks.is_empty()).then_some(chunks);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the entry is matched independent of keywords.
    pub fn is_constant(&self) -> bool {
        self.constant || self.trigger_mode == TriggerMode::Constant
    }

    /// Whether the entry can take part in a scan at all.
    pub fn is_scannable(&self) -> bool {
        self.enabled && !self.pending
    }

    /// Stored embedding chunks, if any.
    pub fn chunks(&self) -> Option<&[Vec<f32>]> {
        self.embedding_chunks
            .as_deref()
            .filter(|chunks| !chunks.is_empty())
    }

    /// Human-readable label, used in logs and rendered blocks.
    pub fn label(&self) -> String {
        self.keyword.join(", ")
    }
}

impl Default for LoreEntry {
    fn default() -> Self {
        Self::new("")
    }
}

fn normalize_order(order: i32) -> i32 {
    if order == 0 {
        DEFAULT_ORDER
    } else {
        order
    }
}

fn clamp_probability(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn clean_keywords(keywords: impl Iterator<Item = String>) -> Vec<String> {
    keywords.filter(|k| !k.trim().is_empty()).collect()
}

/// Permissive on-disk shape of an entry, normalized into [`LoreEntry`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawLoreEntry {
    id: Option<EntryId>,
    keyword: Vec<String>,
    keysecondary: Vec<String>,
    content: String,
    enabled: bool,
    trigger_mode: TriggerMode,
    constant: bool,
    selective: bool,
    selective_logic: SelectiveLogic,
    scan_depth: Option<i64>,
    position: Position,
    depth: i64,
    order: i32,
    exclude_recursion: bool,
    probability: i64,
    use_probability: bool,
    sticky: i64,
    cooldown: i64,
    delay: i64,
    group: String,
    pending: bool,
    #[serde(alias = "embeddings")]
    embedding_chunks: Option<Vec<Vec<f32>>>,
    /// Legacy single-vector embedding.
    embedding: Option<Vec<f32>>,
}

impl Default for RawLoreEntry {
    fn default() -> Self {
        Self {
            id: None,
            keyword: Vec::new(),
            keysecondary: Vec::new(),
            content: String::new(),
            enabled: true,
            trigger_mode: TriggerMode::Keyword,
            constant: false,
            selective: false,
            selective_logic: SelectiveLogic::And,
            scan_depth: None,
            position: Position::AfterChar,
            depth: DEFAULT_DEPTH as i64,
            order: DEFAULT_ORDER,
            exclude_recursion: false,
            probability: 100,
            use_probability: false,
            sticky: 0,
            cooldown: 0,
            delay: 0,
            group: String::new(),
            pending: false,
            embedding_chunks: None,
            embedding: None,
        }
    }
}

impl From<RawLoreEntry> for LoreEntry {
    fn from(raw: RawLoreEntry) -> Self {
        let chunks = match (raw.embedding_chunks, raw.embedding) {
            (Some(chunks), _) if !chunks.is_empty() => Some(chunks),
            (_, Some(single)) if !single.is_empty() => Some(vec![single]),
            _ => None,
        };

        Self {
            id: raw.id.unwrap_or_default(),
            keyword: clean_keywords(raw.keyword.into_iter()),
            keysecondary: clean_keywords(raw.keysecondary.into_iter()),
            content: raw.content,
            enabled: raw.enabled,
            trigger_mode: raw.trigger_mode,
            constant: raw.constant,
            selective: raw.selective,
            selective_logic: raw.selective_logic,
            scan_depth: raw.scan_depth.filter(|d| *d > 0).map(|d| d as usize),
            position: raw.position,
            depth: raw.depth.max(0) as u32,
            order: normalize_order(raw.order),
            exclude_recursion: raw.exclude_recursion,
            probability: clamp_probability(raw.probability),
            use_probability: raw.use_probability,
            sticky: raw.sticky.max(0) as u64,
            cooldown: raw.cooldown.max(0) as u64,
            delay: raw.delay.max(0) as u64,
            group: raw.group,
            pending: raw.pending,
            embedding_chunks: chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = LoreEntry::new("Dragons hoard gold");
        assert_eq!(entry.content, "Dragons hoard gold");
        assert_eq!(entry.order, DEFAULT_ORDER);
        assert_eq!(entry.probability, 100);
        assert!(entry.enabled);
        assert!(!entry.is_constant());
        assert!(entry.chunks().is_none());
    }

    #[test]
    fn test_entry_builder() {
        let entry = LoreEntry::new("Secret society")
            .with_keywords(["guild", "", "  ", "order"])
            .with_secondary(SelectiveLogic::NotAny, ["public"])
            .with_order(5)
            .with_sticky(3)
            .with_position(Position::AnTop);

        assert_eq!(entry.keyword, vec!["guild", "order"]);
        assert!(entry.selective);
        assert_eq!(entry.selective_logic, SelectiveLogic::NotAny);
        assert_eq!(entry.order, 5);
        assert_eq!(entry.sticky, 3);
        assert_eq!(entry.label(), "guild, order");
    }

    #[test]
    fn test_probability_clamping() {
        assert_eq!(LoreEntry::new("x").with_probability(150).probability, 100);
        assert_eq!(LoreEntry::new("x").with_probability(-20).probability, 0);
    }

    #[test]
    fn test_constant_flag_or_mode() {
        let mut entry = LoreEntry::new("x");
        entry.constant = true;
        assert!(entry.is_constant());

        let by_mode = LoreEntry::new("x").with_trigger_mode(TriggerMode::Constant);
        assert!(by_mode.is_constant());
    }

    #[test]
    fn test_ingestion_normalizes_raw_fields() {
        let json = r#"{
            "id": "e1",
            "keyword": ["dragon", ""],
            "content": "Dragons are ancient.",
            "probability": 250,
            "sticky": -4,
            "scanDepth": 0,
            "selectiveLogic": 1,
            "position": "at_depth",
            "embedding": [0.1, 0.2]
        }"#;

        let entry: LoreEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, EntryId::from("e1"));
        assert_eq!(entry.keyword, vec!["dragon"]);
        assert_eq!(entry.probability, 100);
        assert_eq!(entry.sticky, 0);
        assert_eq!(entry.scan_depth, None);
        assert_eq!(entry.selective_logic, SelectiveLogic::NotAny);
        assert_eq!(entry.position, Position::AtDepth);
        assert_eq!(entry.chunks().map(|c| c.len()), Some(1));
        assert!(entry.enabled);
        assert_eq!(entry.order, DEFAULT_ORDER);
    }

    #[test]
    fn test_zero_order_means_default() {
        let entry: LoreEntry = serde_json::from_str(r#"{"order": 0}"#).unwrap();
        assert_eq!(entry.order, DEFAULT_ORDER);

        let negative: LoreEntry = serde_json::from_str(r#"{"order": -3}"#).unwrap();
        assert_eq!(negative.order, -3);

        assert_eq!(LoreEntry::new("x").with_order(0).order, DEFAULT_ORDER);
    }

    #[test]
    fn test_multi_chunk_embeddings_win_over_legacy() {
        let json = r#"{"embeddings": [[1.0], [0.5]], "embedding": [0.0]}"#;
        let entry: LoreEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.chunks().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_entry_round_trips_through_json() {
        let entry = LoreEntry::new("Round trip")
            .with_keywords(["trip"])
            .with_embedding_chunks(vec![vec![1.0, 0.0]]);

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"embeddingChunks\""));
        let back: LoreEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
