//! SillyTavern lorebook import.
//!
//! Exports keep their entries under `entries` or `data.entries`, either as an
//! array or as an object keyed by uid. Every imported entry gets a fresh id.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::entries::{LoreBook, LoreEntry, DEFAULT_DEPTH, DEFAULT_ORDER};
use crate::error::{LoreError, LoreResult};
use crate::triggers::{Position, SelectiveLogic, TriggerMode};

const DEFAULT_BOOK_NAME: &str = "ST Import";

/// Keys may be stored as a list or as one comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeyList {
    List(Vec<String>),
    Csv(String),
}

impl Default for KeyList {
    fn default() -> Self {
        KeyList::List(Vec::new())
    }
}

impl KeyList {
    fn into_keywords(self) -> Vec<String> {
        match self {
            KeyList::List(keys) => keys,
            KeyList::Csv(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StExtensions {
    sticky: Option<i64>,
    cooldown: Option<i64>,
    delay: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StEntry {
    key: KeyList,
    #[serde(alias = "keySecondary")]
    keysecondary: Vec<String>,
    content: Option<String>,
    disable: bool,
    constant: bool,
    vectorized: bool,
    selective: bool,
    selective_logic: Option<i64>,
    scan_depth: Option<i64>,
    position: Option<i64>,
    depth: Option<i64>,
    order: Option<i32>,
    exclude_recursion: bool,
    probability: Option<i64>,
    use_probability: bool,
    group: Option<String>,
    extensions: StExtensions,
}

impl StEntry {
    fn into_entry(self) -> LoreEntry {
        let trigger_mode = if self.vectorized {
            TriggerMode::Vectorized
        } else if self.constant {
            TriggerMode::Constant
        } else {
            TriggerMode::Keyword
        };

        let selective_logic = match self.selective_logic {
            None => SelectiveLogic::And,
            Some(code) => SelectiveLogic::from_code(code).unwrap_or_else(|_| {
                warn!(code, "unknown selective logic in import, using AND");
                SelectiveLogic::And
            }),
        };

        let mut entry = LoreEntry::new(self.content.unwrap_or_default())
            .with_keywords(self.key.into_keywords())
            .with_trigger_mode(trigger_mode)
            .with_position(
                self.position
                    .map(Position::from_sillytavern_code)
                    .unwrap_or_default(),
            )
            .with_depth(self.depth.unwrap_or(DEFAULT_DEPTH as i64).max(0) as u32)
            .with_order(self.order.unwrap_or(DEFAULT_ORDER))
            .with_scan_depth(self.scan_depth.unwrap_or(0).max(0) as usize)
            .with_probability(self.probability.unwrap_or(100))
            .with_sticky(self.extensions.sticky.unwrap_or(0).max(0) as u64)
            .with_cooldown(self.extensions.cooldown.unwrap_or(0).max(0) as u64)
            .with_delay(self.extensions.delay.unwrap_or(0).max(0) as u64);

        if !self.keysecondary.is_empty() {
            entry = entry.with_secondary(selective_logic, self.keysecondary);
        }
        entry.selective = self.selective;
        entry.selective_logic = selective_logic;
        entry.use_probability = self.use_probability;
        entry.constant = self.constant;
        entry.enabled = !self.disable;
        entry.exclude_recursion = self.exclude_recursion;
        entry.group = self.group.unwrap_or_default();
        entry
    }
}

/// Convert a SillyTavern lorebook export into a [`LoreBook`].
pub fn import_sillytavern(json: &str) -> LoreResult<LoreBook> {
    let document: Value = serde_json::from_str(json)?;

    let raw_entries = document
        .get("entries")
        .or_else(|| document.get("data").and_then(|d| d.get("entries")))
        .ok_or_else(|| LoreError::Import("cannot find entries".to_string()))?;

    let values: Vec<Value> = match raw_entries {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            // Numeric uids first, by value; any other key keeps document order.
            let mut keyed: Vec<(&String, &Value)> = map.iter().collect();
            keyed.sort_by_key(|(key, _)| key.parse::<u64>().map_or((1, 0), |uid| (0, uid)));
            keyed.into_iter().map(|(_, value)| value.clone()).collect()
        }
        _ => {
            return Err(LoreError::Import(
                "entries must be an array or object".to_string(),
            ))
        }
    };

    if values.is_empty() {
        return Err(LoreError::Import("no entries found".to_string()));
    }

    let entries = values
        .into_iter()
        .map(|value| serde_json::from_value::<StEntry>(value).map(StEntry::into_entry))
        .collect::<Result<Vec<_>, _>>()?;

    let name = document
        .get("name")
        .or_else(|| document.get("data").and_then(|d| d.get("name")))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_BOOK_NAME);

    Ok(LoreBook::new(name).with_entries(entries))
}
