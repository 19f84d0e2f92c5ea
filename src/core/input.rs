//! Key parsing.
//!
//! Raw terminal sequences are mapped to key ids such as `"ctrl+a"`, `"shift+tab"` or
//! `"pageup"`. Modifiers are always written in the order `shift`, `ctrl`, `alt`, and every id
//! is lowercase, so ids compare with plain string equality after [`normalize_key_id`].

const MODIFIER_ORDER: [&str; 3] = ["shift", "ctrl", "alt"];

/// Key id for a complete raw sequence, `None` when the sequence is not recognized.
pub fn parse_key(data: &str) -> Option<String> {
    if let Some(key_id) = sequence_key_id(data) {
        return Some(key_id.to_string());
    }

    let bytes = data.as_bytes();
    if bytes.len() == 2 && bytes[0] == 0x1b {
        let code = bytes[1];
        if (1..=26).contains(&code) {
            return Some(format!("ctrl+alt+{}", (code + 96) as char));
        }
        if code.is_ascii_lowercase() || code.is_ascii_digit() {
            return Some(format!("alt+{}", code as char));
        }
    }

    if bytes.len() == 1 {
        let code = bytes[0];
        if (1..=26).contains(&code) {
            return Some(format!("ctrl+{}", (code + 96) as char));
        }
        if (33..=126).contains(&code) {
            return Some(data.to_ascii_lowercase());
        }
    }

    None
}

/// Printable text carried by `data`, or `None` when it contains control characters.
pub fn parse_text(data: &str) -> Option<String> {
    if data.is_empty() || data.chars().any(char::is_control) {
        return None;
    }
    Some(data.to_string())
}

/// Canonical form of a user-written key id: lowercase, modifiers in a fixed order.
///
/// Returns `None` for an empty key name or an unknown modifier.
pub fn normalize_key_id(key_id: &str) -> Option<String> {
    let lowered = key_id.trim().to_lowercase();
    let mut parts: Vec<&str> = lowered.split('+').collect();
    let key = parts.pop()?;
    if key.is_empty() {
        return None;
    }
    if parts.iter().any(|part| !MODIFIER_ORDER.contains(part)) {
        return None;
    }

    let mut normalized = String::new();
    for modifier in MODIFIER_ORDER {
        if parts.contains(&modifier) {
            normalized.push_str(modifier);
            normalized.push('+');
        }
    }
    normalized.push_str(match key {
        "esc" => "escape",
        "return" => "enter",
        other => other,
    });
    Some(normalized)
}

/// True when `data` is the key `key_id` names.
pub fn matches_key(data: &str, key_id: &str) -> bool {
    match (parse_key(data), normalize_key_id(key_id)) {
        (Some(parsed), Some(expected)) => parsed == expected,
        _ => false,
    }
}

fn sequence_key_id(data: &str) -> Option<&'static str> {
    match data {
        "\x1b" => Some("escape"),
        "\r" | "\n" | "\x1bOM" => Some("enter"),
        "\t" => Some("tab"),
        "\x1b[Z" => Some("shift+tab"),
        " " => Some("space"),
        "\x00" => Some("ctrl+space"),
        "\x7f" | "\x08" => Some("backspace"),
        "\x1b\x7f" | "\x1b\x08" => Some("alt+backspace"),
        "\x1b[3~" => Some("delete"),
        "\x1b[2~" => Some("insert"),
        "\x1b[A" | "\x1bOA" => Some("up"),
        "\x1b[B" | "\x1bOB" => Some("down"),
        "\x1b[C" | "\x1bOC" => Some("right"),
        "\x1b[D" | "\x1bOD" => Some("left"),
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Some("home"),
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Some("end"),
        "\x1b[5~" | "\x1b[[5~" => Some("pageup"),
        "\x1b[6~" | "\x1b[[6~" => Some("pagedown"),
        "\x1b[1;5A" | "\x1bOa" => Some("ctrl+up"),
        "\x1b[1;5B" | "\x1bOb" => Some("ctrl+down"),
        "\x1b[1;5C" | "\x1bOc" => Some("ctrl+right"),
        "\x1b[1;5D" | "\x1bOd" => Some("ctrl+left"),
        "\x1b[1;3C" | "\x1bF" => Some("alt+right"),
        "\x1b[1;3D" | "\x1bB" => Some("alt+left"),
        "\x1b[1;2A" | "\x1b[a" => Some("shift+up"),
        "\x1b[1;2B" | "\x1b[b" => Some("shift+down"),
        "\x1b[1;2C" | "\x1b[c" => Some("shift+right"),
        "\x1b[1;2D" | "\x1b[d" => Some("shift+left"),
        "\x1c" => Some("ctrl+\\"),
        "\x1d" => Some("ctrl+]"),
        "\x1f" => Some("ctrl+-"),
        "\x1bOP" | "\x1b[11~" => Some("f1"),
        "\x1bOQ" | "\x1b[12~" => Some("f2"),
        "\x1bOR" | "\x1b[13~" => Some("f3"),
        "\x1bOS" | "\x1b[14~" => Some("f4"),
        "\x1b[15~" => Some("f5"),
        "\x1b[17~" => Some("f6"),
        "\x1b[18~" => Some("f7"),
        "\x1b[19~" => Some("f8"),
        "\x1b[20~" => Some("f9"),
        "\x1b[21~" => Some("f10"),
        "\x1b[23~" => Some("f11"),
        "\x1b[24~" => Some("f12"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{matches_key, normalize_key_id, parse_key, parse_text};

    #[test]
    fn control_letters_map_to_ctrl_ids() {
        assert_eq!(parse_key("\x01").as_deref(), Some("ctrl+a"));
        assert_eq!(parse_key("\x19").as_deref(), Some("ctrl+y"));
    }

    #[test]
    fn enter_wins_over_ctrl_m_and_ctrl_j() {
        assert_eq!(parse_key("\r").as_deref(), Some("enter"));
        assert_eq!(parse_key("\n").as_deref(), Some("enter"));
        assert_eq!(parse_key("\t").as_deref(), Some("tab"));
        assert_eq!(parse_key("\x08").as_deref(), Some("backspace"));
    }

    #[test]
    fn escape_prefixed_letters_are_alt() {
        assert_eq!(parse_key("\x1bb").as_deref(), Some("alt+b"));
        assert_eq!(parse_key("\x1b\x7f").as_deref(), Some("alt+backspace"));
        assert_eq!(parse_key("\x1b[1;5D").as_deref(), Some("ctrl+left"));
    }

    #[test]
    fn unknown_sequences_are_none() {
        assert_eq!(parse_key("\x1b[999~"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn normalize_orders_modifiers() {
        assert_eq!(normalize_key_id("Alt+Ctrl+X").as_deref(), Some("ctrl+alt+x"));
        assert_eq!(normalize_key_id("esc").as_deref(), Some("escape"));
        assert_eq!(normalize_key_id("hyper+x"), None);
        assert_eq!(normalize_key_id("ctrl+"), None);
    }

    #[test]
    fn matches_key_uses_normalized_ids() {
        assert!(matches_key("\x1b[Z", "Shift+Tab"));
        assert!(matches_key("\x1b[5~", "pageUp"));
        assert!(!matches_key("\x1b[A", "down"));
    }

    #[test]
    fn text_excludes_control_chars() {
        assert_eq!(parse_text("héllo").as_deref(), Some("héllo"));
        assert_eq!(parse_text("\x1b[A"), None);
        assert_eq!(parse_text(""), None);
    }
}
