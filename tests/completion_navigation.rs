use std::sync::Arc;

use pretty_assertions::assert_eq;
use tape_prompt::{completer, filter_has_prefix, Completion, CompletionManager, Document, Suggest};

/// Completer returning `texts` for every document; `#` marks a comment entry.
fn fixed(texts: &'static [&'static str], max: usize) -> CompletionManager {
    let mut manager = CompletionManager::new(
        completer(move |_: &Document| {
            texts
                .iter()
                .map(|text| match text.strip_prefix('#') {
                    Some(comment) => Suggest::comment(comment),
                    None => Suggest::new(*text, ""),
                })
                .collect()
        }),
        max,
    );
    manager.update(Arc::new(Document::new("", 0)));
    manager
}

fn assert_window(completion: &CompletionManager, step: usize) {
    let Some(selected) = completion.selected_index() else {
        return;
    };
    let scroll = completion.vertical_scroll();
    let visible = completion
        .max_suggestions()
        .min(completion.suggestions().len());
    assert!(
        scroll <= selected && selected < scroll + visible,
        "step {step}: selected {selected} outside window [{scroll}, {})",
        scroll + visible
    );
    assert!(
        !completion.suggestions()[selected].comment,
        "step {step}: comment {selected} became selected"
    );
}

#[test]
fn reset_is_idempotent() {
    let mut completion = fixed(&["a", "b", "c"], 2);
    completion.next();
    completion.next();
    completion.next();
    completion.reset();
    let once = (completion.selected_index(), completion.vertical_scroll());
    completion.reset();
    let twice = (completion.selected_index(), completion.vertical_scroll());
    assert_eq!(once, (None, 0));
    assert_eq!(once, twice);
}

#[test]
fn window_always_contains_the_selection() {
    let mut completion = fixed(&["#head", "a", "b", "#mid", "c", "d", "e", "f", "#tail"], 3);
    // Linear congruential sequence so the walk is varied but reproducible.
    let mut seed: u32 = 7;
    for step in 0..500 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        match (seed >> 16) % 5 {
            0 | 1 => completion.next(),
            2 | 3 => completion.previous(),
            _ => completion.reset(),
        }
        assert_window(&completion, step);
    }
}

#[test]
fn comments_are_skipped_going_forward() {
    let mut completion = fixed(&["A", "#B", "#C", "D"], 6);
    completion.next();
    assert_eq!(completion.selected_suggestion().map(|s| s.text), Some("A".to_string()));
    completion.next();
    assert_eq!(completion.selected_suggestion().map(|s| s.text), Some("D".to_string()));
    completion.next();
    assert_eq!(completion.selected_index(), None);
}

#[test]
fn previous_from_nothing_selects_the_last_visible_row() {
    let mut completion = fixed(&["a", "b", "c", "d", "e"], 2);
    completion.previous();
    assert_eq!(completion.selected_index(), Some(4));
    assert_eq!(completion.vertical_scroll(), 3);
    completion.previous();
    completion.previous();
    assert_eq!(completion.selected_index(), Some(2));
    assert_eq!(completion.vertical_scroll(), 2);
}

#[test]
fn update_with_a_filtering_completer_replaces_the_list() {
    let catalog = vec![
        Suggest::new("select", "query rows"),
        Suggest::new("set", "assign"),
        Suggest::new("from", "table"),
    ];
    let mut completion = CompletionManager::new(
        completer(move |document: &Document| {
            filter_has_prefix(&catalog, document.word_before_cursor(), true)
        }),
        6,
    );
    completion.update(Arc::new(Document::new("SE", 2)));
    let texts: Vec<String> = completion.suggestions().iter().map(|s| s.text.clone()).collect();
    assert_eq!(texts, vec!["select", "set"]);

    let before = completion.suggestions();
    completion.update(Arc::new(Document::new("fr", 2)));
    assert_eq!(before.len(), 2);
    assert_eq!(completion.suggestions().len(), 1);
}
