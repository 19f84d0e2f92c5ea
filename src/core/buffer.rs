//! Live edit buffer.
//!
//! Every mutation replaces the current [`Document`] wholesale, so a reader that cloned the
//! `Arc<Document>` keeps seeing the value it took.

use std::sync::Arc;

use crate::core::document::Document;

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    document: Arc<Document>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn cursor_position(&self) -> usize {
        self.document.cursor_position()
    }

    pub fn mode(&self) -> usize {
        self.document.mode()
    }

    /// Inserts `text` at the cursor.
    ///
    /// `overwrite` replaces the chars under the cursor instead of shifting them right.
    /// `move_cursor = false` leaves the cursor in front of the inserted text.
    pub fn insert_text(&mut self, text: &str, overwrite: bool, move_cursor: bool) {
        let cursor = self.cursor_position();
        let before = self.document.text_before_cursor();
        let after = self.document.text_after_cursor();
        let inserted = text.chars().count();

        let rest = if overwrite {
            let skip = after
                .char_indices()
                .nth(inserted)
                .map(|(idx, _)| idx)
                .unwrap_or(after.len());
            &after[skip..]
        } else {
            after
        };

        let mut next = String::with_capacity(before.len() + text.len() + rest.len());
        next.push_str(before);
        next.push_str(text);
        next.push_str(rest);

        let cursor = if move_cursor { cursor + inserted } else { cursor };
        self.replace(next, cursor);
    }

    /// Replaces the whole text; the cursor is kept when it still fits.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let cursor = self.cursor_position();
        self.replace(text.into(), cursor);
    }

    pub fn set_cursor_position(&mut self, position: usize) {
        let text = self.document.text().to_string();
        self.replace(text, position);
    }

    pub fn set_mode(&mut self, mode: usize) {
        self.document = Arc::new((*self.document).clone().with_mode(mode));
    }

    pub fn cursor_left(&mut self, count: usize) {
        let position = self.cursor_position().saturating_sub(count);
        self.set_cursor_position(position);
    }

    pub fn cursor_right(&mut self, count: usize) {
        let position = self.cursor_position().saturating_add(count);
        self.set_cursor_position(position);
    }

    /// Removes up to `count` chars before the cursor and returns them.
    pub fn delete_before_cursor(&mut self, count: usize) -> String {
        let cursor = self.cursor_position();
        let count = count.min(cursor);
        if count == 0 {
            return String::new();
        }
        let before: Vec<char> = self.document.text_before_cursor().chars().collect();
        let keep = before.len() - count;
        let deleted: String = before[keep..].iter().collect();

        let mut next: String = before[..keep].iter().collect();
        next.push_str(self.document.text_after_cursor());
        self.replace(next, cursor - count);
        deleted
    }

    /// Removes up to `count` chars under and after the cursor and returns them.
    pub fn delete_after_cursor(&mut self, count: usize) -> String {
        let cursor = self.cursor_position();
        let after = self.document.text_after_cursor();
        let split = after
            .char_indices()
            .nth(count)
            .map(|(idx, _)| idx)
            .unwrap_or(after.len());
        if split == 0 {
            return String::new();
        }
        let deleted = after[..split].to_string();

        let mut next = self.document.text_before_cursor().to_string();
        next.push_str(&after[split..]);
        self.replace(next, cursor);
        deleted
    }

    fn replace(&mut self, text: String, cursor: usize) {
        let mode = self.document.mode();
        self.document = Arc::new(Document::new(text, cursor).with_mode(mode));
    }
}
