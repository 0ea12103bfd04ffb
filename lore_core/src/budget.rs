//! Budget allocator - greedy token-budget selection over triggered entries.

use lore_model::LoreEntry;

use crate::entry_store::EntryStore;
use crate::matching::TriggeredSet;

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Triggered entries in stable store order.
pub fn triggered_entries<'a>(
    store: &EntryStore<'a>,
    triggered: &TriggeredSet,
) -> Vec<&'a LoreEntry> {
    store.iter().filter(|e| triggered.contains(&e.id)).collect()
}

/// Outcome of an allocation.
#[derive(Debug, Clone, Default)]
pub struct Allocation<'a> {
    /// Entries that fit, in consideration order.
    pub selected: Vec<&'a LoreEntry>,
    pub tokens_used: usize,
    /// Entries skipped for lack of budget.
    pub dropped: Vec<&'a LoreEntry>,
}

/// Greedy allocator: constants first, then everything else, each by
/// ascending `order`. An entry that does not fit is skipped and the walk
/// continues.
#[derive(Debug, Clone, Copy)]
pub struct BudgetAllocator {
    token_budget: usize,
}

impl BudgetAllocator {
    pub fn new(token_budget: usize) -> Self {
        Self { token_budget }
    }

    /// `triggered` must already be in stable store order; ties on `order`
    /// keep that order.
    pub fn allocate<'a>(&self, triggered: Vec<&'a LoreEntry>) -> Allocation<'a> {
        let (mut constants, mut others): (Vec<_>, Vec<_>) =
            triggered.into_iter().partition(|e| e.is_constant());
        constants.sort_by_key(|e| e.order);
        others.sort_by_key(|e| e.order);

        let mut allocation = Allocation::default();
        for entry in constants.into_iter().chain(others) {
            let cost = estimate_tokens(&entry.content);
            if allocation.tokens_used + cost <= self.token_budget {
                allocation.tokens_used += cost;
                allocation.selected.push(entry);
            } else {
                allocation.dropped.push(entry);
            }
        }
        allocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_model::TriggerMode;

    fn sized(id: &str, tokens: usize) -> LoreEntry {
        LoreEntry::new("x".repeat(tokens * 4)).with_id(id)
    }

    fn ids(entries: &[&LoreEntry]) -> Vec<String> {
        entries.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_greedy_in_order() {
        let entries = [sized("a", 20), sized("b", 20), sized("c", 20)];
        let allocation = BudgetAllocator::new(50).allocate(entries.iter().collect());

        assert_eq!(ids(&allocation.selected), vec!["a", "b"]);
        assert_eq!(allocation.tokens_used, 40);
        assert_eq!(ids(&allocation.dropped), vec!["c"]);
    }

    #[test]
    fn test_skip_and_continue() {
        let entries = [sized("big", 40), sized("bigger", 30), sized("small", 5)];
        let allocation = BudgetAllocator::new(50).allocate(entries.iter().collect());
        assert_eq!(ids(&allocation.selected), vec!["big", "small"]);
    }

    #[test]
    fn test_constants_precede_low_order() {
        let entries = [
            sized("low", 1).with_order(1),
            sized("const", 1).with_order(500).with_trigger_mode(TriggerMode::Constant),
            sized("mid", 1).with_order(50),
            sized("tie", 1).with_order(50),
        ];
        let allocation = BudgetAllocator::new(100).allocate(entries.iter().collect());
        assert_eq!(ids(&allocation.selected), vec!["const", "low", "mid", "tie"]);
    }

    #[test]
    fn test_zero_order_sorts_as_default() {
        let entries: Vec<LoreEntry> = serde_json::from_str(
            r#"[
                {"id": "unset", "content": "aaaa", "order": 0},
                {"id": "late", "content": "bbbb", "order": 150},
                {"id": "early", "content": "cccc", "order": 50}
            ]"#,
        )
        .unwrap();
        let allocation = BudgetAllocator::new(100).allocate(entries.iter().collect());
        assert_eq!(ids(&allocation.selected), vec!["early", "unset", "late"]);
    }

    #[test]
    fn test_never_exceeds_budget_and_prefix_stable() {
        let entries: Vec<LoreEntry> = (0..12)
            .map(|i| sized(&format!("e{i}"), (i * 7) % 13 + 1).with_order((i % 3) as i32))
            .collect();
        // Last considered: highest order, latest position.
        let last = entries
            .iter()
            .enumerate()
            .max_by_key(|(i, e)| (e.order, *i))
            .map(|(_, e)| e.id.clone())
            .unwrap();

        for budget in [0, 5, 17, 40, 200] {
            let full = BudgetAllocator::new(budget).allocate(entries.iter().collect());
            assert!(full.tokens_used <= budget);

            let trimmed = entries.iter().filter(|e| e.id != last).collect();
            let without_last = BudgetAllocator::new(budget).allocate(trimmed);

            let expected: Vec<&LoreEntry> =
                full.selected.iter().copied().filter(|e| e.id != last).collect();
            assert_eq!(ids(&expected), ids(&without_last.selected));
        }
    }
}
