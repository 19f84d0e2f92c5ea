//! Incremental prompt renderer.
//!
//! All positions are offsets in display cells from the first cell of the prefix. The terminal
//! cursor is only ever moved relative to where the previous render left it, so layout survives
//! line wrapping without asking the terminal for an absolute position.

use tracing::trace;

use crate::core::buffer::Buffer;
use crate::core::completion::Completion;
use crate::core::document::Document;
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::suggest::{CompletionMode, Suggest};
use crate::core::terminal::Terminal;
use crate::core::text::width::str_width;
use crate::render::format::{format_suggestions, format_suggestions_with_mode, COMPLETION_MARGIN};
use crate::render::style::{Color, ColorPair, HighlightRule, RenderStyle};

/// Cells reserved for the icon column of every drop-down row.
pub const ICON_SIZE: usize = 2;

pub const WINDOW_TOO_SMALL: &str = "Your console window is too small...";
pub const DEFAULT_MODE_HINT: &str = "Press Ctrl + Y to switch mode";

pub type LivePrefix = Box<dyn Fn() -> Option<String> + Send>;
pub type BreakLineCallback = Box<dyn FnMut(&Document) + Send>;

/// Vertical scrollbar thumb for a drop-down window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scrollbar {
    pub top: usize,
    pub height: usize,
}

impl Scrollbar {
    /// `window` visible rows out of `content`, scrolled down by `scroll`.
    pub fn new(window: usize, content: usize, scroll: usize) -> Self {
        if window == 0 || content == 0 {
            return Self { top: 0, height: 0 };
        }
        Self {
            top: window * scroll / content,
            height: (window * window / content).clamp(1, window),
        }
    }

    pub fn contains(&self, row: usize) -> bool {
        self.top <= row && row <= self.top + self.height
    }
}

pub struct Renderer {
    out: OutputGate,
    style: RenderStyle,
    prefix: String,
    live_prefix: Option<LivePrefix>,
    break_line_callback: Option<BreakLineCallback>,
    title: Option<String>,
    highlight: Vec<HighlightRule>,
    modes: Vec<CompletionMode>,
    word_separator: String,
    rows: u16,
    cols: u16,
    previous_cursor: usize,
    explicit_wrap: bool,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self {
            out: OutputGate::new(),
            style,
            prefix: "> ".to_string(),
            live_prefix: None,
            break_line_callback: None,
            title: None,
            highlight: Vec::new(),
            modes: Vec::new(),
            word_separator: String::new(),
            rows: 0,
            cols: 0,
            previous_cursor: 0,
            explicit_wrap: cfg!(not(windows)),
        }
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// A callback returning `Some` replaces the static prefix for that render.
    pub fn set_live_prefix(&mut self, live_prefix: LivePrefix) {
        self.live_prefix = Some(live_prefix);
    }

    pub fn set_break_line_callback(&mut self, callback: BreakLineCallback) {
        self.break_line_callback = Some(callback);
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title.filter(|title| !title.is_empty());
    }

    pub fn set_highlight(&mut self, rules: Vec<HighlightRule>) {
        self.highlight = rules;
    }

    pub fn set_modes(&mut self, modes: Vec<CompletionMode>) {
        self.modes = modes;
    }

    pub fn set_word_separator(&mut self, separator: impl Into<String>) {
        self.word_separator = separator.into();
    }

    /// Whether to emit a newline when output ends exactly on the right margin.
    pub fn set_explicit_wrap(&mut self, explicit_wrap: bool) {
        self.explicit_wrap = explicit_wrap;
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn previous_cursor(&self) -> usize {
        self.previous_cursor
    }

    pub fn update_win_size(&mut self, rows: u16, cols: u16) {
        self.rows = rows;
        self.cols = cols;
    }

    pub fn current_prefix(&self) -> String {
        self.live_prefix
            .as_ref()
            .and_then(|live| live())
            .unwrap_or_else(|| self.prefix.clone())
    }

    /// Buffered output, written to `term` in one call.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) {
        self.out.flush(term);
    }

    pub fn setup(&mut self) {
        if let Some(title) = &self.title {
            self.out.push(TerminalCmd::SetTitle(title.clone()));
        }
    }

    pub fn tear_down(&mut self) {
        if self.title.is_some() {
            self.out.push(TerminalCmd::ClearTitle);
        }
        self.out.push(TerminalCmd::EraseDown);
    }

    pub fn clear_screen(&mut self) {
        self.out.push(TerminalCmd::EraseScreen);
        self.out.push(TerminalCmd::CursorGoTo { row: 1, col: 1 });
        self.previous_cursor = 0;
    }

    /// `(column, row)` of a cell offset.
    pub fn to_pos(&self, offset: usize) -> (usize, usize) {
        let cols = usize::from(self.cols).max(1);
        (offset % cols, offset / cols)
    }

    /// Moves the terminal cursor from one offset to another with relative motion only.
    pub fn move_cursor(&mut self, from: usize, to: usize) -> usize {
        let (from_x, from_y) = self.to_pos(from);
        let (to_x, to_y) = self.to_pos(to);

        if from_y > to_y {
            self.out.push(TerminalCmd::CursorUp(clamp_u16(from_y - to_y)));
        } else if to_y > from_y {
            self.out.push(TerminalCmd::CursorDown(clamp_u16(to_y - from_y)));
        }
        if from_x > to_x {
            self.out.push(TerminalCmd::CursorBackward(clamp_u16(from_x - to_x)));
        } else if to_x > from_x {
            self.out.push(TerminalCmd::CursorForward(clamp_u16(to_x - from_x)));
        }
        to
    }

    pub fn backward(&mut self, from: usize, count: usize) -> usize {
        self.move_cursor(from, from.saturating_sub(count))
    }

    /// Forces the wrap when output ends exactly on the right margin.
    pub fn line_wrap(&mut self, offset: usize) {
        if self.explicit_wrap && offset > 0 && offset % usize::from(self.cols).max(1) == 0 {
            self.out.push(TerminalCmd::bytes("\n"));
        }
    }

    pub fn render(&mut self, buffer: &Buffer, completion: &dyn Completion) {
        if self.cols == 0 || self.rows == 0 {
            trace!("render skipped: terminal geometry unknown");
            return;
        }
        self.move_cursor(self.previous_cursor, 0);

        let document = buffer.document();
        let line = document.text();
        let prefix = self.current_prefix();
        let line_width = str_width(line);
        let mut cursor = str_width(&prefix) + line_width;

        let (_, y) = self.to_pos(cursor);
        if y + 1 + completion.max_suggestions() > usize::from(self.rows)
            || COMPLETION_MARGIN > usize::from(self.cols)
        {
            self.render_window_too_small();
            return;
        }

        self.out.push(TerminalCmd::HideCursor);
        self.render_prefix(&prefix);
        self.render_input(line);
        self.line_wrap(cursor);
        self.out.push(TerminalCmd::EraseDown);

        cursor = self.backward(cursor, line_width - document.display_cursor_position());
        self.render_completion(&document, completion, cursor, &prefix);

        if let Some(suggest) = completion.selected_suggestion() {
            let word = document.word_before_cursor_until_separator(&self.word_separator);
            cursor = self.backward(cursor, str_width(word));

            self.set_color(self.style.preview_suggestion, false);
            self.out.push(TerminalCmd::bytes(suggest.text.as_str()));
            self.reset_color();
            cursor += str_width(&suggest.text);

            let rest = document.text_after_cursor();
            self.set_color(self.style.input, false);
            self.out.push(TerminalCmd::bytes(rest));
            self.reset_color();
            cursor += str_width(rest);
            self.line_wrap(cursor);
            cursor = self.backward(cursor, str_width(rest));
        }

        self.previous_cursor = cursor;
        self.out.push(TerminalCmd::ShowCursor);
    }

    /// Redraws the finished line without the drop-down and hands it to the break-line callback.
    pub fn break_line<T: Terminal + ?Sized>(&mut self, buffer: &Buffer, term: &mut T) {
        let document = buffer.document();
        if self.cols > 0 {
            self.move_cursor(self.previous_cursor, 0);
        }
        self.out.push(TerminalCmd::EraseDown);

        let prefix = self.current_prefix();
        self.render_prefix(&prefix);
        self.set_color(self.style.input, false);
        self.out.push(TerminalCmd::bytes(format!("{}\n", document.text())));
        self.reset_color();
        self.out.flush(term);

        if let Some(callback) = self.break_line_callback.as_mut() {
            callback(&document);
        }
        self.previous_cursor = 0;
    }

    fn render_window_too_small(&mut self) {
        self.out.push(TerminalCmd::CursorGoTo { row: 1, col: 1 });
        self.out.push(TerminalCmd::EraseScreen);
        self.set_color(ColorPair::new(Color::DarkRed, Color::White), false);
        self.out.push(TerminalCmd::bytes(WINDOW_TOO_SMALL));
        self.reset_color();
        self.previous_cursor = str_width(WINDOW_TOO_SMALL);
    }

    fn render_prefix(&mut self, prefix: &str) {
        self.set_color(self.style.prefix, false);
        self.out.push(TerminalCmd::bytes(prefix));
        self.reset_color();
    }

    fn render_input(&mut self, line: &str) {
        for token in line.split_inclusive(' ') {
            let word = token.trim_end_matches(' ');
            let rule_color = self
                .highlight
                .iter()
                .find(|rule| !word.is_empty() && rule.word == word)
                .map(|rule| rule.color);
            match rule_color {
                Some(color) => {
                    self.set_color(ColorPair::new(color, self.style.input.bg), false);
                    self.out.push(TerminalCmd::bytes(word));
                    self.set_color(self.style.input, false);
                    self.out.push(TerminalCmd::bytes(&token[word.len()..]));
                }
                None => {
                    self.set_color(self.style.input, false);
                    self.out.push(TerminalCmd::bytes(token));
                }
            }
        }
        self.reset_color();
    }

    fn render_completion(
        &mut self,
        document: &Document,
        completion: &dyn Completion,
        cursor: usize,
        prefix: &str,
    ) {
        let suggestions = completion.suggestions();
        if suggestions.is_empty() {
            return;
        }
        let cols = usize::from(self.cols);
        // Rows also carry the icon column and one scrollbar cell, so a row never exceeds `cols`.
        let budget = cols.saturating_sub(str_width(prefix).max(ICON_SIZE) + 1);

        let mode = self.modes.get(document.mode()).cloned();
        let (mode_row, formatted, width) = match &mode {
            Some(mode) => {
                let hint = if mode.description.is_empty() {
                    DEFAULT_MODE_HINT
                } else {
                    mode.description.as_str()
                };
                format_suggestions_with_mode(
                    &suggestions,
                    budget,
                    Suggest::new(mode.name.as_str(), hint),
                    mode.attribute.shows_description(),
                )
            }
            None => {
                let (formatted, width) = format_suggestions(&suggestions, budget, true);
                (None, formatted, width)
            }
        };
        if formatted.is_empty() {
            return;
        }
        let show_icon = mode.as_ref().map_or(true, |mode| mode.attribute.shows_icon());

        let width = width + 1;
        let total = width + ICON_SIZE;
        let window = formatted.len().min(completion.max_suggestions());
        let scroll = completion.vertical_scroll().min(formatted.len() - window);
        let header_rows = usize::from(mode_row.is_some());

        self.prepare_area(window + header_rows);

        let (x, _) = self.to_pos(cursor);
        let overflow = (x + total).saturating_sub(cols);
        let mut cursor = cursor;
        if overflow > 0 {
            cursor = self.backward(cursor, overflow);
        }

        if let Some(mode_row) = &mode_row {
            self.out.push(TerminalCmd::CursorDown(1));
            self.set_color(self.style.mode_prefix, false);
            self.out.push(TerminalCmd::bytes(mode_row.text.as_str()));
            self.set_color(self.style.mode_suffix, false);
            let pad = " ".repeat(ICON_SIZE + 1);
            self.out
                .push(TerminalCmd::bytes(format!("{}{pad}", mode_row.description)));
            self.reset_color();
            self.line_wrap(cursor + total);
            self.backward(cursor + total, total);
        }

        let scrollbar = Scrollbar::new(window, formatted.len(), scroll);
        let selected = completion
            .selected_index()
            .and_then(|index| index.checked_sub(scroll));
        for (row, suggest) in formatted[scroll..scroll + window].iter().enumerate() {
            self.out.push(TerminalCmd::CursorDown(1));
            let icon = if show_icon {
                icon_cell(suggest.icon.as_deref())
            } else {
                " ".repeat(ICON_SIZE)
            };

            let (text_colors, description_colors, bold) = if suggest.comment {
                (self.style.comment_suggestion, self.style.comment_description, false)
            } else if selected == Some(row) {
                (self.style.selected_suggestion, self.style.selected_description, true)
            } else {
                (self.style.suggestion, self.style.description, false)
            };
            self.set_color(text_colors, bold);
            self.out
                .push(TerminalCmd::bytes(format!("{icon}{}", suggest.text)));
            self.set_color(description_colors, false);
            self.out
                .push(TerminalCmd::bytes(suggest.description.as_str()));

            let bar = if scrollbar.contains(row) {
                self.style.scrollbar_thumb
            } else {
                self.style.scrollbar_bg
            };
            self.set_color(ColorPair::new(Color::Default, bar), false);
            self.out.push(TerminalCmd::bytes(" "));
            self.reset_color();

            self.line_wrap(cursor + total);
            self.backward(cursor + total, total);
        }

        if overflow > 0 {
            self.out.push(TerminalCmd::CursorForward(clamp_u16(overflow)));
        }
        self.out
            .push(TerminalCmd::CursorUp(clamp_u16(window + header_rows)));
        self.reset_color();
    }

    /// Scrolls the viewport so `lines` rows exist below the cursor.
    fn prepare_area(&mut self, lines: usize) {
        for _ in 0..lines {
            self.out.push(TerminalCmd::ScrollDown);
        }
        for _ in 0..lines {
            self.out.push(TerminalCmd::ScrollUp);
        }
    }

    fn set_color(&mut self, pair: ColorPair, bold: bool) {
        self.out.push(TerminalCmd::SetColor(pair.sgr(bold)));
    }

    fn reset_color(&mut self) {
        self.set_color(ColorPair::default(), false);
    }
}

fn icon_cell(icon: Option<&str>) -> String {
    match icon {
        Some(icon) if str_width(icon) == 1 => format!(" {icon}"),
        Some(icon) if str_width(icon) == ICON_SIZE => icon.to_string(),
        _ => " ".repeat(ICON_SIZE),
    }
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
