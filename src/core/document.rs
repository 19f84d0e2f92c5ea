//! Immutable snapshot of the edited line.
//!
//! Cursor positions are counted in `char`s, never bytes. Every query is a pure function of
//! `(text, cursor_position)`.

use crate::core::text::width::str_width;


#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    cursor_position: usize,
    mode: usize,
}

impl Document {
    /// Builds a snapshot; a cursor past the end is clamped to the end.
    pub fn new(text: impl Into<String>, cursor_position: usize) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            cursor_position: cursor_position.min(len),
            mode: 0,
        }
    }

    pub fn with_mode(mut self, mode: usize) -> Self {
        self.mode = mode;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn mode(&self) -> usize {
        self.mode
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text_before_cursor(&self) -> &str {
        &self.text[..self.byte_index(self.cursor_position)]
    }

    pub fn text_after_cursor(&self) -> &str {
        &self.text[self.byte_index(self.cursor_position)..]
    }

    /// Character at `cursor + offset`, `None` when that lands outside the text.
    pub fn char_relative_to_cursor(&self, offset: isize) -> Option<char> {
        let index = self.cursor_position as isize + offset;
        if index < 0 {
            return None;
        }
        self.text.chars().nth(index as usize)
    }

    /// Cursor column in display cells, counting double-width characters as two.
    pub fn display_cursor_position(&self) -> usize {
        str_width(self.text_before_cursor())
    }

    /// Word directly before the cursor; empty when the cursor follows whitespace.
    pub fn word_before_cursor(&self) -> &str {
        let before = self.text_before_cursor();
        &before[self.find_start_of_previous_word_bytes(before)..]
    }

    /// Word after the cursor, ending at the next whitespace char.
    pub fn word_after_cursor(&self) -> &str {
        let after = self.text_after_cursor();
        match after.find(char::is_whitespace) {
            Some(end) => &after[..end],
            None => after,
        }
    }

    /// Whitespace after the cursor followed by the next word.
    pub fn word_after_cursor_with_space(&self) -> &str {
        let after = self.text_after_cursor();
        let word_start = after.len() - after.trim_start_matches(char::is_whitespace).len();
        match after[word_start..].find(char::is_whitespace) {
            Some(end) => &after[..word_start + end],
            None => after,
        }
    }

    /// Word before the cursor including any whitespace between it and the cursor.
    pub fn word_before_cursor_with_space(&self) -> &str {
        let before = self.text_before_cursor();
        let trimmed = before.trim_end_matches(char::is_whitespace);
        &before[self.find_start_of_previous_word_bytes(trimmed)..]
    }

    /// Text between the last char of `separators` before the cursor and the cursor.
    ///
    /// An empty separator set falls back to whitespace.
    pub fn word_before_cursor_until_separator(&self, separators: &str) -> &str {
        let before = self.text_before_cursor();
        let start = last_separator_end(before, separators);
        &before[start..]
    }

    /// Char index where the word before the cursor starts.
    pub fn find_start_of_previous_word(&self) -> usize {
        let before = self.text_before_cursor();
        before[..self.find_start_of_previous_word_bytes(before)]
            .chars()
            .count()
    }

    /// Chars from the cursor to the end of the current word.
    pub fn find_end_of_current_word(&self) -> usize {
        self.word_after_cursor().chars().count()
    }

    fn find_start_of_previous_word_bytes(&self, before: &str) -> usize {
        last_separator_end(before, "")
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}

fn last_separator_end(text: &str, separators: &str) -> usize {
    let matches = |ch: char| {
        if separators.is_empty() {
            ch.is_whitespace()
        } else {
            separators.contains(ch)
        }
    };
    text.char_indices()
        .rev()
        .find(|(_, ch)| matches(*ch))
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0)
}
