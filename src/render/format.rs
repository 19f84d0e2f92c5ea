//! Fixed-width column formatting for the completion drop-down.

use crate::core::suggest::Suggest;
use crate::core::text::width::{fill_right, str_width, truncate_to_width};

pub const SHORTEN_SUFFIX: &str = "...";
const LEFT_PREFIX: &str = " ";
const LEFT_SUFFIX: &str = " ";
const RIGHT_PREFIX: &str = " ";
const RIGHT_SUFFIX: &str = " ";

/// Narrowest terminal that can show a drop-down at all: the padding around both columns.
pub const COMPLETION_MARGIN: usize = 4;

/// Pads every text to the widest one, wrapped in `prefix`/`suffix`, within `max` cells.
///
/// Texts wider than the budget are cut with [`SHORTEN_SUFFIX`] and re-padded to the exact
/// column width. Returns the formatted texts and the shared column width; when nothing fits
/// (or every text is empty) each entry is empty and the width is 0.
pub fn format_texts<S: AsRef<str>>(
    texts: &[S],
    max: usize,
    prefix: &str,
    suffix: &str,
) -> (Vec<String>, usize) {
    let texts: Vec<String> = texts
        .iter()
        .map(|text| text.as_ref().replace(['\n', '\r'], ""))
        .collect();
    let empty = || (vec![String::new(); texts.len()], 0);

    let prefix_width = str_width(prefix);
    let suffix_width = str_width(suffix);
    let min = prefix_width + suffix_width + str_width(SHORTEN_SUFFIX);

    let mut width = texts.iter().map(|text| str_width(text)).max().unwrap_or(0);
    if width == 0 || min >= max {
        return empty();
    }
    if prefix_width + width + suffix_width > max {
        width = max - prefix_width - suffix_width;
    }

    let formatted = texts
        .iter()
        .map(|text| {
            let body = if str_width(text) <= width {
                fill_right(text, width)
            } else {
                fill_right(&truncate_to_width(text, width, SHORTEN_SUFFIX), width)
            };
            format!("{prefix}{body}{suffix}")
        })
        .collect();
    (formatted, prefix_width + width + suffix_width)
}

/// Formats text and description columns sharing `max` cells.
///
/// The description column gets whatever the text column leaves, and is dropped entirely when
/// `with_description` is false. Returns an empty list when the text column does not fit.
pub fn format_suggestions(
    suggests: &[Suggest],
    max: usize,
    with_description: bool,
) -> (Vec<Suggest>, usize) {
    let texts: Vec<&str> = suggests.iter().map(|s| s.text.as_str()).collect();
    let (left, left_width) = format_texts(&texts, max, LEFT_PREFIX, LEFT_SUFFIX);
    if left_width == 0 {
        return (Vec::new(), 0);
    }

    let descriptions: Vec<&str> = suggests.iter().map(|s| s.description.as_str()).collect();
    let right_max = if with_description { max - left_width } else { 0 };
    let (right, right_width) = format_texts(&descriptions, right_max, RIGHT_PREFIX, RIGHT_SUFFIX);

    let formatted = suggests
        .iter()
        .zip(left)
        .zip(right)
        .map(|((suggest, text), description)| Suggest {
            icon: suggest.icon.clone(),
            text,
            description,
            comment: suggest.comment,
        })
        .collect();
    (formatted, left_width + right_width)
}

/// Like [`format_suggestions`] with a mode label taking part in the width computation.
///
/// The formatted label is split back off and returned first.
pub fn format_suggestions_with_mode(
    suggests: &[Suggest],
    max: usize,
    mode: Suggest,
    with_description: bool,
) -> (Option<Suggest>, Vec<Suggest>, usize) {
    let mut all = Vec::with_capacity(suggests.len() + 1);
    all.push(mode);
    all.extend_from_slice(suggests);

    let (mut formatted, width) = format_suggestions(&all, max, with_description);
    if formatted.is_empty() {
        return (None, formatted, width);
    }
    let mode = formatted.remove(0);
    (Some(mode), formatted, width)
}
