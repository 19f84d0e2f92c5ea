//! Display-width helpers: grapheme widths, truncation with an ellipsis, right fill.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 3;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }

    if emoji_get(grapheme).is_some() {
        return 2;
    }

    let mut width = 0;
    for ch in grapheme.chars() {
        if ch == '\t' {
            width += TAB_WIDTH;
            continue;
        }
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width
}

/// Number of terminal cells `text` occupies.
pub fn str_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

/// Cuts `text` so that it, plus `tail`, fits in `max_width` cells.
///
/// Text that already fits is returned untouched. The result can be narrower
/// than `max_width` when a double-width grapheme straddles the cut; callers that
/// need an exact width follow up with [`fill_right`].
pub fn truncate_to_width(text: &str, max_width: usize, tail: &str) -> String {
    if str_width(text) <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(str_width(tail));
    let mut truncated = String::with_capacity(text.len());
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let width = grapheme_width(grapheme);
        if used + width > budget {
            break;
        }
        truncated.push_str(grapheme);
        used += width;
    }
    truncated.push_str(tail);
    truncated
}

/// Pads `text` with spaces on the right up to `width` cells.
pub fn fill_right(text: &str, width: usize) -> String {
    let current = str_width(text);
    if current >= width {
        return text.to_string();
    }
    let mut filled = String::with_capacity(text.len() + width - current);
    filled.push_str(text);
    filled.push_str(&" ".repeat(width - current));
    filled
}
