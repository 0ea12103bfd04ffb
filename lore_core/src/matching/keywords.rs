//! Keyword matching: case-insensitive substring search with selective logic.
//!
//! Haystacks are expected to be lowercased already; keywords are lowercased
//! per comparison.

use lore_model::LoreEntry;

fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    !keyword.is_empty() && haystack.contains(&keyword.to_lowercase())
}

/// True iff any primary keyword occurs in the haystack.
pub fn primary_match(entry: &LoreEntry, haystack: &str) -> bool {
    entry.keyword.iter().any(|kw| contains_keyword(haystack, kw))
}

/// Evaluate secondary keywords with the entry's selective logic.
///
/// Trivially true when the entry is not selective or has no secondary keys.
pub fn secondary_match(entry: &LoreEntry, haystack: &str) -> bool {
    if !entry.selective {
        return true;
    }

    let valid: Vec<&String> = entry.keysecondary.iter().filter(|k| !k.is_empty()).collect();
    if valid.is_empty() {
        return true;
    }

    let hits = valid
        .iter()
        .filter(|kw| contains_keyword(haystack, kw))
        .count();
    entry.selective_logic.evaluate(hits, valid.len())
}

/// Primary and secondary keyword logic combined.
pub fn keyword_match(entry: &LoreEntry, haystack: &str) -> bool {
    primary_match(entry, haystack) && secondary_match(entry, haystack)
}
