//! End-to-end scan scenarios over the public pipeline.

use lore_core::{
    Activation, FixedRoll, LoreScanner, PromptAssembler, ScanOutcome, ScanRequest, SeededRandom,
};
use lore_model::{
    ChatMessage, EntryId, LoreBook, LoreEntry, ScanConfig, SelectiveLogic, TimedState, TriggerMode,
};

fn history(texts: &[&str]) -> Vec<ChatMessage> {
    texts.iter().map(|t| ChatMessage::user(*t)).collect()
}

fn ids(outcome: &ScanOutcome<'_>) -> Vec<String> {
    outcome.selected.iter().map(|e| e.id.to_string()).collect()
}

fn scanner() -> LoreScanner<FixedRoll> {
    LoreScanner::new(ScanConfig::default(), FixedRoll(0.0))
}

#[test]
fn test_entry_scan_depth_reads_history_tail() {
    let books = vec![LoreBook::new("World").with_entry(
        LoreEntry::new("Dragons hoard gold")
            .with_id("dragon")
            .with_keywords(["dragon"])
            .with_scan_depth(2),
    )];
    let history = history(&["a", "b", "dragon lore?"]);
    let timed = TimedState::new();

    let outcome = scanner().scan(&ScanRequest::new("tell me more", &history, &books, &timed, 3));
    assert_eq!(ids(&outcome), vec!["dragon"]);
}

#[test]
fn test_sticky_then_cooldown_across_turns() {
    let books = vec![LoreBook::new("World").with_entry(
        LoreEntry::new("Dragons hoard gold")
            .with_id("dragon")
            .with_keywords(["dragon"])
            .with_sticky(3)
            .with_cooldown(2),
    )];
    let mut scanner = scanner();
    let dragon = EntryId::from("dragon");

    let mut timed = TimedState::new();
    let mut turn = |message: &str, counter: u64, timed: &mut TimedState| -> Option<Activation> {
        let current = timed.clone();
        let outcome = scanner.scan(&ScanRequest::new(message, &[], &books, &current, counter));
        let activation = outcome.triggered.activation(&dragon);
        *timed = outcome.next_timed_state;
        activation
    };

    assert_eq!(turn("a dragon!", 10, &mut timed), Some(Activation::Keyword));
    assert_eq!(turn("weather", 11, &mut timed), Some(Activation::Sticky));
    assert_eq!(turn("weather", 12, &mut timed), Some(Activation::Sticky));
    assert_eq!(turn("weather", 13, &mut timed), Some(Activation::Sticky));
    // Window elapsed: normal matching, nothing matches, cooldown begins.
    assert_eq!(turn("weather", 14, &mut timed), None);
    assert_eq!(turn("dragon again", 15, &mut timed), None);
    assert_eq!(turn("dragon again", 16, &mut timed), Some(Activation::Keyword));
}

#[test]
fn test_greedy_budget_drops_third() {
    let entry = |id: &str| LoreEntry::new("x".repeat(80)).with_id(id).with_keywords(["go"]);
    let entries = [entry("first"), entry("second"), entry("third")];
    let books = vec![LoreBook::new("World").with_entries(entries)];
    let timed = TimedState::new();
    let config = ScanConfig {
        token_budget: 50,
        ..ScanConfig::default()
    };

    let outcome = LoreScanner::new(config, FixedRoll(0.0))
        .scan(&ScanRequest::new("go", &[], &books, &timed, 0));
    assert_eq!(ids(&outcome), vec!["first", "second"]);
    assert_eq!(outcome.tokens_used, 40);
    assert_eq!(outcome.triggered.len(), 3);
}

#[test]
fn test_no_active_card_means_no_assembly() {
    let books = vec![LoreBook::new("World")
        .with_entry(
            LoreEntry::new("Dragons hoard gold")
                .with_id("dragon")
                .with_keywords(["dragon"]),
        )];
    let timed = TimedState::new();

    let outcome = scanner().scan(&ScanRequest::new("dragon", &[], &books, &timed, 0));
    assert!(!outcome.selected.is_empty());
    assert_eq!(PromptAssembler::new().assemble("dragon", &outcome.selected, None, ""), None);
}

#[test]
fn test_constants_always_selected() {
    let books = vec![LoreBook::new("World")
        .with_entry(
            LoreEntry::new("Magic is rare")
                .with_id("magic")
                .with_trigger_mode(TriggerMode::Constant),
        )];
    let timed = TimedState::new();
    let mut scanner = scanner();

    for message in ["hello", "goodbye", "dragon"] {
        let outcome = scanner.scan(&ScanRequest::new(message, &[], &books, &timed, 0));
        assert_eq!(ids(&outcome), vec!["magic"]);
    }
}

#[test]
fn test_recursion_cycle_terminates() {
    let books = vec![LoreBook::new("World")
        .with_entry(LoreEntry::new("Night follows day").with_id("night").with_keywords(["night"]))
        .with_entry(LoreEntry::new("Day follows night").with_id("day").with_keywords(["day"]))
        .with_entry(LoreEntry::new("Unrelated").with_id("other").with_keywords(["zebra"]))];
    let timed = TimedState::new();
    let config = ScanConfig {
        recursion_depth: 1000,
        ..ScanConfig::default()
    };

    let outcome = LoreScanner::new(config, FixedRoll(0.0))
        .scan(&ScanRequest::new("night", &[], &books, &timed, 0));
    assert_eq!(ids(&outcome), vec!["night", "day"]);
    assert_eq!(
        outcome.triggered.activation(&EntryId::from("day")),
        Some(Activation::Recursion { pass: 1 })
    );
}

#[test]
fn test_selective_logic_through_scan() {
    let books = vec![LoreBook::new("World")
        .with_entry(
            LoreEntry::new("Sea dragons")
                .with_id("sea")
                .with_keywords(["dragon"])
                .with_secondary(SelectiveLogic::And, ["sea"]),
        )
        .with_entry(
            LoreEntry::new("Land dragons")
                .with_id("land")
                .with_keywords(["dragon"])
                .with_secondary(SelectiveLogic::NotAny, ["sea"]),
        )];
    let timed = TimedState::new();
    let mut scanner = scanner();

    let at_sea = scanner.scan(&ScanRequest::new("a dragon at sea", &[], &books, &timed, 0));
    assert_eq!(ids(&at_sea), vec!["sea"]);

    let on_land = scanner.scan(&ScanRequest::new("a dragon in the hills", &[], &books, &timed, 0));
    assert_eq!(ids(&on_land), vec!["land"]);
}

#[test]
fn test_seeded_probability_is_reproducible() {
    let books = vec![LoreBook::new("World").with_entries((0..20).map(|i| {
        LoreEntry::new(format!("entry {i}"))
            .with_id(format!("e{i}"))
            .with_keywords(["go"])
            .with_probability(50)
    }))];
    let timed = TimedState::new();
    let request = ScanRequest::new("go", &[], &books, &timed, 0);

    let mut a = LoreScanner::new(ScanConfig::default(), SeededRandom::new(7));
    let mut b = LoreScanner::new(ScanConfig::default(), SeededRandom::new(7));
    assert_eq!(ids(&a.scan(&request)), ids(&b.scan(&request)));
}

#[test]
fn test_vector_match_and_fallback() {
    let books = vec![LoreBook::new("World").with_entry(
        LoreEntry::new("The tides obey the moon")
            .with_id("tides")
            .with_keywords(["tide"])
            .with_trigger_mode(TriggerMode::Vectorized)
            .with_embedding_chunks(vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
    )];
    let timed = TimedState::new();
    let mut scanner = scanner();
    let query = [0.8_f32, 0.6];

    let by_vector =
        scanner.scan(&ScanRequest::new("the sea", &[], &books, &timed, 0).with_embedding(&query));
    assert!(matches!(
        by_vector.triggered.activation(&EntryId::from("tides")),
        Some(Activation::Vector { .. })
    ));

    let keyword_only = scanner.scan(&ScanRequest::new("high tide", &[], &books, &timed, 0));
    assert_eq!(
        keyword_only.triggered.activation(&EntryId::from("tides")),
        Some(Activation::Keyword)
    );
}
