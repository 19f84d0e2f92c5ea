
use std::sync::{Arc, Mutex};

use fixture::RecordingTerminal;
use pretty_assertions::assert_eq;
use tape_prompt::render::format::format_texts;
use tape_prompt::render::renderer::{DEFAULT_MODE_HINT, WINDOW_TOO_SMALL};
use tape_prompt::{
    completer, Buffer, Completion, CompletionManager, CompletionMode, Document, RenderStyle,
    Renderer, Scrollbar, Suggest,
};

fn renderer(rows: u16, cols: u16) -> Renderer {
    let mut renderer = Renderer::new(RenderStyle::default());
    renderer.update_win_size(rows, cols);
    renderer
}

fn suggestions(items: &'static [(&'static str, &'static str)]) -> CompletionManager {
    let mut manager = CompletionManager::new(
        completer(move |_: &Document| {
            items
                .iter()
                .map(|(text, description)| Suggest::new(*text, *description))
                .collect()
        }),
        4,
    );
    manager.update(Arc::new(Document::new("", 0)));
    manager
}

fn empty_completion() -> CompletionManager {
    CompletionManager::new(completer(|_: &Document| Vec::new()), 4)
}

/// Drops SGR color sequences, keeping motion and text.
fn strip_sgr(output: &str) -> String {
    let mut out = String::new();
    let mut rest = output;
    while let Some(start) = rest.find("\x1b[") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let params = tail
            .find(|ch: char| !(ch.is_ascii_digit() || ch == ';'))
            .unwrap_or(tail.len());
        if tail[params..].starts_with('m') {
            rest = &tail[params + 1..];
        } else {
            out.push_str("\x1b[");
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}

/// Text of every row drawn after a one-row cursor-down, up to the next control char.
fn dropdown_rows(output: &str) -> Vec<String> {
    output
        .split("\x1b[1B")
        .skip(1)
        .map(|row| {
            row.chars()
                .take_while(|ch| !ch.is_control())
                .collect()
        })
        .collect()
}

fn buffer(text: &str) -> Buffer {
    let mut buffer = Buffer::new();
    buffer.insert_text(text, false, true);
    buffer
}

fn keywords(max: usize) -> CompletionManager {
    let mut manager = CompletionManager::new(
        completer(|_: &Document| {
            vec![
                Suggest::new("select", "query rows"),
                Suggest::new("from", "source table"),
            ]
        }),
        max,
    );
    manager.update(Arc::new(Document::new("", 0)));
    manager
}

#[test]
fn offsets_map_to_columns_and_rows() {
    for width in 1..=40u16 {
        let renderer = renderer(24, width);
        let width = usize::from(width);
        for offset in 0..400 {
            let (col, row) = renderer.to_pos(offset);
            assert!(col < width, "col {col} at width {width}");
            assert_eq!(row * width + col, offset, "offset {offset} at width {width}");
        }
    }
}

#[test]
fn cursor_motion_is_relative_across_wrapped_rows() {
    let mut terminal = RecordingTerminal::new(10, 24);
    let mut renderer = renderer(24, 10);

    assert_eq!(renderer.move_cursor(23, 5), 5);
    renderer.flush(&mut terminal);
    assert_eq!(terminal.take_output(), "\x1b[2A\x1b[2C");

    renderer.move_cursor(5, 23);
    renderer.flush(&mut terminal);
    assert_eq!(terminal.take_output(), "\x1b[2B\x1b[2D");

    renderer.move_cursor(7, 2);
    renderer.move_cursor(4, 4);
    renderer.flush(&mut terminal);
    assert_eq!(terminal.take_output(), "\x1b[5D");
}

#[test]
fn line_wrap_only_fires_on_the_right_margin() {
    let mut terminal = RecordingTerminal::new(10, 24);
    let mut renderer = renderer(24, 10);
    renderer.set_explicit_wrap(true);
    for offset in [0, 9, 11, 21] {
        renderer.line_wrap(offset);
    }
    renderer.flush(&mut terminal);
    assert_eq!(terminal.write_count(), 0);

    renderer.line_wrap(20);
    renderer.flush(&mut terminal);
    assert_eq!(terminal.take_output(), "\n");

    renderer.set_explicit_wrap(false);
    renderer.line_wrap(20);
    renderer.flush(&mut terminal);
    assert_eq!(terminal.take_output(), "");
}

#[test]
fn wrapped_line_is_redrawn_from_its_first_row() {
    let mut terminal = RecordingTerminal::new(10, 24);
    let mut renderer = renderer(24, 10);
    renderer.set_explicit_wrap(true);
    let none = empty_completion();

    let mut line = buffer("abcdefghijkl");
    renderer.render(&line, &none);
    renderer.flush(&mut terminal);
    assert_eq!(
        strip_sgr(&terminal.take_output()),
        "\x1b[?25l> abcdefghijkl\x1b[J\x1b[?25h"
    );
    assert_eq!(renderer.previous_cursor(), 14);

    line.set_cursor_position(2);
    renderer.render(&line, &none);
    renderer.flush(&mut terminal);
    assert_eq!(
        strip_sgr(&terminal.take_output()),
        "\x1b[1A\x1b[4D\x1b[?25l> abcdefghijkl\x1b[J\x1b[1A\x1b[?25h"
    );
    assert_eq!(renderer.previous_cursor(), 4);
}

#[test]
fn line_ending_on_the_margin_gets_an_explicit_newline() {
    let mut terminal = RecordingTerminal::new(10, 24);
    let mut renderer = renderer(24, 10);
    renderer.set_explicit_wrap(true);
    renderer.render(&buffer("abcdefgh"), &empty_completion());
    renderer.flush(&mut terminal);
    assert_eq!(
        strip_sgr(&terminal.take_output()),
        "\x1b[?25l> abcdefgh\n\x1b[J\x1b[?25h"
    );

    let mut unwrapped = Renderer::new(RenderStyle::default());
    unwrapped.update_win_size(24, 10);
    unwrapped.set_explicit_wrap(false);
    unwrapped.render(&buffer("abcdefgh"), &empty_completion());
    unwrapped.flush(&mut terminal);
    assert_eq!(
        strip_sgr(&terminal.take_output()),
        "\x1b[?25l> abcdefgh\x1b[J\x1b[?25h"
    );
}

#[test]
fn dropdown_near_the_right_edge_shifts_left_and_back() {
    let mut terminal = RecordingTerminal::new(20, 24);
    let mut renderer = renderer(24, 20);
    renderer.set_explicit_wrap(true);
    let completion = suggestions(&[("ab", "")]);

    renderer.render(&buffer("abcdefghijklmn"), &completion);
    renderer.flush(&mut terminal);
    // Row is 7 cells wide; starting at column 16 it overflows by 3.
    assert_eq!(
        strip_sgr(&terminal.take_output()),
        concat!(
            "\x1b[?25l> abcdefghijklmn\x1b[J",
            "\x1bD\x1bM",
            "\x1b[3D",
            "\x1b[1B   ab  \n\x1b[1A\x1b[13C",
            "\x1b[3C\x1b[1A",
            "\x1b[?25h",
        )
    );
    assert_eq!(renderer.previous_cursor(), 16);
}

#[test]
fn dropdown_rows_fit_the_terminal_without_a_prefix() {
    let mut terminal = RecordingTerminal::new(40, 24);
    let mut renderer = renderer(24, 40);
    renderer.set_prefix("");
    let completion = suggestions(&[(
        "select",
        "choose the columns a query returns, in order, with aliases",
    )]);

    renderer.render(&buffer("sel"), &completion);
    renderer.flush(&mut terminal);
    let rows = dropdown_rows(&strip_sgr(&terminal.take_output()));
    assert_eq!(rows.len(), 1);
    for row in rows {
        assert!(
            row.chars().count() <= 40,
            "drop-down row is {} cells on a 40-column terminal: {row:?}",
            row.chars().count()
        );
    }
}

#[test]
fn mode_header_is_drawn_above_the_suggestions() {
    let mut terminal = RecordingTerminal::new(60, 24);
    let mut renderer = renderer(24, 60);
    renderer.set_modes(vec![CompletionMode::new("sql", "")]);
    let completion = suggestions(&[("ab", "")]);

    renderer.render(&buffer(""), &completion);
    renderer.flush(&mut terminal);
    let output = strip_sgr(&terminal.take_output());
    let rows = dropdown_rows(&output);
    assert_eq!(rows.len(), 2, "output: {output:?}");
    assert_eq!(rows[0], format!(" sql  {DEFAULT_MODE_HINT}    "));
    assert!(rows[1].starts_with("   ab "), "row: {:?}", rows[1]);
    assert_eq!(rows[0].chars().count(), rows[1].chars().count());
    assert!(output.contains("\x1b[2A"), "output: {output:?}");
}

#[test]
fn scrollbar_thumb_stays_inside_the_window() {
    for content in 1..=20usize {
        for window in 1..=content {
            for scroll in 0..=(content - window) {
                let bar = Scrollbar::new(window, content, scroll);
                assert!(bar.height >= 1, "{window}/{content}@{scroll}: {bar:?}");
                assert!(
                    bar.top + bar.height <= window,
                    "{window}/{content}@{scroll}: {bar:?}"
                );
            }
        }
    }
    assert_eq!(Scrollbar::new(0, 5, 0).height, 0);
}

#[test]
fn columns_are_padded_to_the_widest_text() {
    let (formatted, width) = format_texts(&["select", "from", "insert", "where"], 20, " ", " ");
    assert_eq!(width, 8);
    assert_eq!(formatted, vec![" select ", " from   ", " insert ", " where  "]);
}

#[test]
fn unknown_geometry_draws_nothing() {
    let mut terminal = RecordingTerminal::new(0, 0);
    let mut renderer = Renderer::new(RenderStyle::default());
    renderer.render(&buffer("abc"), &keywords(4));
    renderer.flush(&mut terminal);
    assert_eq!(terminal.write_count(), 0);
}

#[test]
fn render_draws_prefix_line_and_dropdown() {
    let mut terminal = RecordingTerminal::new(80, 24);
    let mut renderer = renderer(24, 80);
    renderer.render(&buffer("sel"), &keywords(4));
    renderer.flush(&mut terminal);

    let output = terminal.take_output();
    assert_eq!(terminal.write_count(), 1);
    for needle in ["> ", "sel", "select", "query rows", "from", "source table"] {
        assert!(output.contains(needle), "missing {needle:?} in {output:?}");
    }
    assert_eq!(renderer.previous_cursor(), 5);
}

#[test]
fn selected_suggestion_is_previewed_in_the_line() {
    let mut terminal = RecordingTerminal::new(80, 24);
    let mut renderer = renderer(24, 80);
    let mut completion = keywords(4);
    completion.next();
    renderer.render(&buffer("sel"), &completion);
    renderer.flush(&mut terminal);

    // The preview replaces "sel" with "select", leaving the cursor after it.
    assert_eq!(renderer.previous_cursor(), 2 + "select".len());
}

#[test]
fn tiny_window_shows_the_banner() {
    let mut terminal = RecordingTerminal::new(80, 3);
    let mut renderer = renderer(3, 80);
    renderer.render(&buffer("abc"), &keywords(6));
    renderer.flush(&mut terminal);
    assert!(terminal.take_output().contains(WINDOW_TOO_SMALL));
    assert_eq!(renderer.previous_cursor(), WINDOW_TOO_SMALL.len());
}

#[test]
fn break_line_hands_the_document_to_the_callback() {
    let mut terminal = RecordingTerminal::new(80, 24);
    let mut renderer = renderer(24, 80);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    renderer.set_break_line_callback(Box::new(move |document: &Document| {
        sink.lock().unwrap().push(document.text().to_string());
    }));

    renderer.render(&buffer("done"), &keywords(4));
    renderer.break_line(&buffer("done"), &mut terminal);

    assert_eq!(*seen.lock().unwrap(), vec!["done".to_string()]);
    assert!(terminal.take_output().contains("done\n"));
    assert_eq!(renderer.previous_cursor(), 0);
}

#[test]
fn title_is_set_and_cleared() {
    let mut terminal = RecordingTerminal::new(80, 24);
    let mut renderer = renderer(24, 80);
    renderer.set_title(Some("sql shell".to_string()));
    renderer.setup();
    renderer.flush(&mut terminal);
    assert!(terminal.take_output().contains("sql shell"));

    renderer.tear_down();
    renderer.flush(&mut terminal);
    assert!(!terminal.take_output().is_empty());
}

#[test]
fn completion_state_is_untouched_by_rendering() {
    let mut renderer = renderer(24, 80);
    let mut completion = keywords(4);
    completion.next();
    renderer.render(&buffer("s"), &completion);
    assert_eq!(completion.selected_index(), Some(0));
    assert_eq!(completion.suggestions().len(), 2);
}
