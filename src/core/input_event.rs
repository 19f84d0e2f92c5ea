//! Structured input events.

use crate::core::input::{parse_key, parse_text};

const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

/// One decoded input chunk.
///
/// Printable text (including a lone space) is `Text`, so typing never has to go through the
/// key table. Sequences that are neither text nor a known key are `Unknown` and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key { raw: String, key_id: String },
    Text { text: String },
    Paste { text: String },
    Unknown { raw: String },
}

/// Splits one chunk into events, lifting out bracketed pastes.
pub fn parse_input_events(data: &str) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let mut remaining = data;
    while !remaining.is_empty() {
        let Some(start) = remaining.find(PASTE_START) else {
            events.extend(parse_non_paste(remaining));
            break;
        };
        events.extend(parse_non_paste(&remaining[..start]));

        let after_start = &remaining[start + PASTE_START.len()..];
        let Some(end) = after_start.find(PASTE_END) else {
            events.push(InputEvent::Unknown {
                raw: remaining[start..].to_string(),
            });
            break;
        };
        events.push(InputEvent::Paste {
            text: after_start[..end].to_string(),
        });
        remaining = &after_start[end + PASTE_END.len()..];
    }
    events
}

fn parse_non_paste(data: &str) -> Option<InputEvent> {
    if data.is_empty() {
        return None;
    }
    if let Some(text) = parse_text(data) {
        return Some(InputEvent::Text { text });
    }
    if let Some(key_id) = parse_key(data) {
        return Some(InputEvent::Key {
            raw: data.to_string(),
            key_id,
        });
    }
    Some(InputEvent::Unknown {
        raw: data.to_string(),
    })
}
