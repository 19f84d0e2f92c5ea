//! The prompt: reads input, dispatches it to the buffer and completion manager, redraws.
//!
//! Input chunks, resize notifications and async redraw requests all arrive on one channel;
//! everything else runs on the thread that called [`Prompt::input`] or [`Prompt::run`].

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::core::async_completion::AsyncCompletionManager;
use crate::core::buffer::Buffer;
use crate::core::completion::{Completion, CompletionManager};
use crate::core::document::Document;
use crate::core::history::History;
use crate::core::input::normalize_key_id;
use crate::core::input_event::{parse_input_events, InputEvent};
use crate::core::keybindings::{PromptAction, PromptKeybindingsManager};
use crate::core::progress::Progress;
use crate::core::suggest::Completer;
use crate::core::terminal::Terminal;
use crate::error::{PromptError, Result};
use crate::render::renderer::{BreakLineCallback, LivePrefix, Renderer};
use crate::runtime::options::{ExitChecker, KeyBind, PromptOptions};

/// How a line ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Submitted(Arc<Document>),
    /// Ctrl+D on an empty line.
    Eof,
}

#[derive(Debug)]
enum PromptEvent {
    Input(String),
    Resize,
    Redraw,
    InputClosed,
}

/// Input handler half of the event channel. The terminal dropping it means input has ended.
struct InputSender {
    tx: Sender<PromptEvent>,
}

impl InputSender {
    fn send(&self, data: String) {
        let _ = self.tx.send(PromptEvent::Input(data));
    }
}

impl Drop for InputSender {
    fn drop(&mut self) {
        let _ = self.tx.send(PromptEvent::InputClosed);
    }
}

pub struct Prompt<T: Terminal> {
    terminal: T,
    buffer: Buffer,
    history: History,
    completion: Box<dyn Completion>,
    renderer: Renderer,
    keybindings: PromptKeybindingsManager,
    key_binds: Vec<KeyBind>,
    exit_checker: Option<ExitChecker>,
    word_separator: String,
    mode_count: usize,
    completion_on_down: bool,
    submit_on_accept: bool,
    show_completion_at_start: bool,
    events_tx: Sender<PromptEvent>,
    events_rx: Receiver<PromptEvent>,
    pending: VecDeque<InputEvent>,
    /// Live line saved when history browsing starts.
    stash: Option<String>,
    started: bool,
}

impl<T: Terminal> Prompt<T> {
    pub fn new(terminal: T, completer: Completer, options: PromptOptions) -> Self {
        let mut completion: Box<dyn Completion> = if options.async_completion {
            Box::new(AsyncCompletionManager::new(
                completer,
                options.max_suggestions,
                Progress::new(options.progress_frames.iter().cloned()),
            ))
        } else {
            Box::new(CompletionManager::new(completer, options.max_suggestions))
        };

        let (events_tx, events_rx) = mpsc::channel();
        let redraw_tx = events_tx.clone();
        completion.start_event_loop(Arc::new(move || {
            let _ = redraw_tx.send(PromptEvent::Redraw);
        }));

        let mut renderer = Renderer::new(options.style);
        renderer.set_prefix(options.prefix);
        renderer.set_title(options.title);
        renderer.set_highlight(options.highlight);
        renderer.set_modes(options.modes.clone());
        renderer.set_word_separator(options.word_separator.clone());

        let mut buffer = Buffer::new();
        buffer.insert_text(&options.initial_text, false, true);

        Self {
            terminal,
            buffer,
            history: History::with_entries(options.history),
            completion,
            renderer,
            keybindings: PromptKeybindingsManager::new(options.keybindings),
            key_binds: Vec::new(),
            exit_checker: None,
            word_separator: options.word_separator,
            mode_count: options.modes.len(),
            completion_on_down: options.completion_on_down,
            submit_on_accept: options.submit_on_accept,
            show_completion_at_start: options.show_completion_at_start,
            events_tx,
            events_rx,
            pending: VecDeque::new(),
            stash: None,
            started: false,
        }
    }

    /// Evaluated with each submitted line inside [`Prompt::run`]; `true` ends the loop.
    pub fn set_exit_checker<F>(&mut self, checker: F)
    where
        F: FnMut(&Document) -> bool + Send + 'static,
    {
        self.exit_checker = Some(Box::new(checker));
    }

    /// Called with the finished document whenever a line is broken off (submit, cancel, EOF).
    pub fn set_break_line_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Document) + Send + 'static,
    {
        let callback: BreakLineCallback = Box::new(callback);
        self.renderer.set_break_line_callback(callback);
    }

    pub fn set_live_prefix<F>(&mut self, live_prefix: F)
    where
        F: Fn() -> Option<String> + Send + 'static,
    {
        let live_prefix: LivePrefix = Box::new(live_prefix);
        self.renderer.set_live_prefix(live_prefix);
    }

    /// Later binds for the same key replace earlier ones.
    pub fn add_key_bind(&mut self, bind: KeyBind) {
        let Some(key) = normalize_key_id(&bind.key) else {
            warn!(key = bind.key.as_str(), "ignoring key bind with invalid key id");
            return;
        };
        self.key_binds.retain(|existing| existing.key != key);
        self.key_binds.push(KeyBind {
            key,
            handler: bind.handler,
        });
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn completion(&self) -> &dyn Completion {
        self.completion.as_ref()
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Starts the terminal and draws the prompt.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        // Events left over from an earlier session refer to a terminal state that is gone.
        while self.events_rx.try_recv().is_ok() {}

        let input = InputSender {
            tx: self.events_tx.clone(),
        };
        let resize_tx = self.events_tx.clone();
        self.terminal
            .start(
                Box::new(move |data| input.send(data)),
                Box::new(move || {
                    let _ = resize_tx.send(PromptEvent::Resize);
                }),
            )
            .map_err(|err| PromptError::io("starting terminal", err))?;
        self.started = true;
        debug!("prompt started");

        self.renderer.setup();
        if self.show_completion_at_start {
            self.completion.update(self.buffer.document());
        }
        self.render();
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        self.renderer.tear_down();
        self.renderer.flush(&mut self.terminal);
        self.terminal
            .stop()
            .map_err(|err| PromptError::io("stopping terminal", err))
    }

    /// Reads one line. `Ok(None)` means the user ended input with Ctrl+D.
    pub fn input(&mut self) -> Result<Option<String>> {
        self.start()?;
        let outcome = self.read_line();
        let stopped = self.stop();
        let outcome = outcome?;
        stopped?;
        Ok(match outcome {
            LineOutcome::Submitted(document) => Some(document.text().to_string()),
            LineOutcome::Eof => None,
        })
    }

    /// Hands every submitted line to `executor` until EOF or the exit checker says stop.
    ///
    /// The terminal leaves raw mode while `executor` runs.
    pub fn run<F: FnMut(&str)>(&mut self, mut executor: F) -> Result<()> {
        self.start()?;
        let result = self.run_loop(&mut executor);
        let stopped = self.stop();
        result.and(stopped)
    }

    fn run_loop(&mut self, executor: &mut dyn FnMut(&str)) -> Result<()> {
        loop {
            let LineOutcome::Submitted(document) = self.read_line()? else {
                return Ok(());
            };
            self.stop()?;
            executor(document.text());
            if let Some(checker) = self.exit_checker.as_mut() {
                if checker(&document) {
                    debug!("exit checker ended the loop");
                    return Ok(());
                }
            }
            self.completion.update(self.buffer.document());
            self.start()?;
        }
    }

    fn read_line(&mut self) -> Result<LineOutcome> {
        loop {
            if let Some(outcome) = self.process_pending() {
                return Ok(outcome);
            }
            let event = self
                .events_rx
                .recv()
                .map_err(|_| PromptError::InputClosed)?;
            match event {
                PromptEvent::Input(data) => self.pending.extend(parse_input_events(&data)),
                PromptEvent::Resize | PromptEvent::Redraw => self.render(),
                PromptEvent::InputClosed => return Err(PromptError::InputClosed),
            }
        }
    }

    /// Dispatches one raw input chunk and redraws.
    ///
    /// Returns as soon as a line ends; events after that point are kept for the next line.
    pub fn handle_input(&mut self, data: &str) -> Option<LineOutcome> {
        self.pending.extend(parse_input_events(data));
        self.process_pending()
    }

    fn process_pending(&mut self) -> Option<LineOutcome> {
        if self.pending.is_empty() {
            return None;
        }
        while let Some(event) = self.pending.pop_front() {
            if let Some(outcome) = self.dispatch(event) {
                return Some(outcome);
            }
        }
        self.completion.update(self.buffer.document());
        self.render();
        None
    }

    /// Redraws against the current terminal geometry.
    pub fn render(&mut self) {
        self.renderer
            .update_win_size(self.terminal.rows(), self.terminal.columns());
        self.renderer.render(&self.buffer, self.completion.as_ref());
        self.renderer.flush(&mut self.terminal);
    }

    fn dispatch(&mut self, event: InputEvent) -> Option<LineOutcome> {
        match event {
            InputEvent::Text { text } => {
                self.accept_selection();
                self.buffer.insert_text(&text, false, true);
                None
            }
            InputEvent::Paste { text } => {
                self.accept_selection();
                let text: String = text
                    .chars()
                    .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
                    .filter(|ch| !ch.is_control())
                    .collect();
                self.buffer.insert_text(&text, false, true);
                None
            }
            InputEvent::Key { key_id, .. } => self.dispatch_key(&key_id),
            InputEvent::Unknown { raw } => {
                trace!(?raw, "ignoring unrecognized input");
                None
            }
        }
    }

    fn dispatch_key(&mut self, key_id: &str) -> Option<LineOutcome> {
        if let Some(index) = self.key_binds.iter().position(|bind| bind.key == key_id) {
            self.accept_selection();
            let bind = &mut self.key_binds[index];
            (bind.handler)(&mut self.buffer, self.completion.as_mut());
            return None;
        }

        let Some(action) = self.keybindings.action_for(key_id) else {
            trace!(key_id, "key has no binding");
            return None;
        };
        trace!(key_id, ?action, "dispatching key");
        if self.handle_completion_key(action) {
            return None;
        }
        self.apply(action)
    }

    /// Drop-down navigation. Returns true when the key was consumed.
    fn handle_completion_key(&mut self, action: PromptAction) -> bool {
        let completing = self.completion.completing();
        match action {
            PromptAction::CompleteNext => self.completion.next(),
            PromptAction::CompletePrevious => self.completion.previous(),
            PromptAction::NavigateDown
                if completing
                    || (self.completion_on_down
                        && !self.history.is_browsing()
                        && !self.completion.suggestions().is_empty()) =>
            {
                self.completion.next()
            }
            PromptAction::NavigateUp if completing => self.completion.previous(),
            PromptAction::CloseCompletion => self.completion.reset(),
            PromptAction::Submit if completing && !self.submit_on_accept => self.accept_selection(),
            _ => {
                self.accept_selection();
                return false;
            }
        }
        true
    }

    /// Replaces the word before the cursor with the highlighted suggestion, if any.
    fn accept_selection(&mut self) {
        let Some(suggest) = self.completion.selected_suggestion() else {
            return;
        };
        let document = self.buffer.document();
        let word = document.word_before_cursor_until_separator(&self.word_separator);
        if !word.is_empty() {
            self.buffer.delete_before_cursor(word.chars().count());
        }
        self.buffer.insert_text(&suggest.text, false, true);
        self.completion.reset();
    }

    fn apply(&mut self, action: PromptAction) -> Option<LineOutcome> {
        use PromptAction::*;

        let document = self.buffer.document();
        match action {
            CursorLeft => self.buffer.cursor_left(1),
            CursorRight => self.buffer.cursor_right(1),
            CursorWordLeft => self
                .buffer
                .cursor_left(document.word_before_cursor_with_space().chars().count()),
            CursorWordRight => self
                .buffer
                .cursor_right(document.word_after_cursor_with_space().chars().count()),
            CursorLineStart => self.buffer.set_cursor_position(0),
            CursorLineEnd => self.buffer.set_cursor_position(document.len()),
            DeleteCharBackward => {
                self.buffer.delete_before_cursor(1);
            }
            DeleteCharForward => {
                self.buffer.delete_after_cursor(1);
            }
            DeleteCharOrEof => {
                if document.is_empty() {
                    return Some(self.end_of_input());
                }
                self.buffer.delete_after_cursor(1);
            }
            DeleteWordBackward => {
                self.buffer
                    .delete_before_cursor(document.word_before_cursor_with_space().chars().count());
            }
            DeleteToLineStart => {
                self.buffer.delete_before_cursor(document.cursor_position());
            }
            DeleteToLineEnd => {
                self.buffer
                    .delete_after_cursor(document.text_after_cursor().chars().count());
            }
            ClearScreen => self.renderer.clear_screen(),
            NavigateUp => self.history_previous(),
            NavigateDown => self.history_next(),
            Submit => return Some(self.submit()),
            Cancel => self.cancel(),
            CycleMode => {
                if self.mode_count > 0 {
                    self.buffer.set_mode((document.mode() + 1) % self.mode_count);
                }
            }
            CompleteNext | CompletePrevious | CloseCompletion => {}
        }
        None
    }

    fn submit(&mut self) -> LineOutcome {
        let document = self.buffer.document();
        debug!(chars = document.len(), "line submitted");
        self.renderer.break_line(&self.buffer, &mut self.terminal);
        if !document.is_empty() {
            self.history.add(document.text());
        }
        self.start_new_line(document.mode());
        LineOutcome::Submitted(document)
    }

    fn cancel(&mut self) {
        debug!("line cancelled");
        let mode = self.buffer.mode();
        self.renderer.break_line(&self.buffer, &mut self.terminal);
        self.start_new_line(mode);
    }

    fn end_of_input(&mut self) -> LineOutcome {
        debug!("end of input");
        self.renderer.break_line(&self.buffer, &mut self.terminal);
        LineOutcome::Eof
    }

    fn start_new_line(&mut self, mode: usize) {
        self.buffer = Buffer::new();
        self.buffer.set_mode(mode);
        self.history.reset();
        self.stash = None;
        self.completion.reset();
    }

    fn history_previous(&mut self) {
        let was_browsing = self.history.is_browsing();
        let live = self.buffer.text().to_string();
        let Some(entry) = self.history.previous().map(str::to_string) else {
            return;
        };
        if !was_browsing {
            self.stash = Some(live);
        }
        self.replace_line(&entry);
    }

    fn history_next(&mut self) {
        if !self.history.is_browsing() {
            return;
        }
        let line = match self.history.next() {
            Some(entry) => entry.to_string(),
            None => self.stash.take().unwrap_or_default(),
        };
        self.replace_line(&line);
    }

    fn replace_line(&mut self, text: &str) {
        let mode = self.buffer.mode();
        self.buffer = Buffer::new();
        self.buffer.insert_text(text, false, true);
        self.buffer.set_mode(mode);
    }
}

impl<T: Terminal> Drop for Prompt<T> {
    fn drop(&mut self) {
        if self.started {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::{LineOutcome, Prompt};
    use crate::core::suggest::{completer, CompletionMode, Suggest};
    use crate::core::terminal::Terminal;
    use crate::runtime::options::{KeyBind, PromptOptions};

    #[derive(Default)]
    struct TestTerminal {
        output: Arc<Mutex<String>>,
    }

    impl Terminal for TestTerminal {
        fn start(
            &mut self,
            _on_input: Box<dyn FnMut(String) + Send>,
            _on_resize: Box<dyn FnMut() + Send>,
        ) -> std::io::Result<()> {
            Ok(())
        }

        fn stop(&mut self) -> std::io::Result<()> {
            Ok(())
        }

        fn write(&mut self, data: &str) {
            self.output.lock().unwrap().push_str(data);
        }

        fn columns(&self) -> u16 {
            80
        }

        fn rows(&self) -> u16 {
            24
        }
    }

    fn sql_prompt(options: PromptOptions) -> Prompt<TestTerminal> {
        let complete = completer(|document| {
            let word = document.word_before_cursor();
            ["select", "from", "where"]
                .iter()
                .filter(|text| !word.is_empty() && text.starts_with(word))
                .map(|text| Suggest::new(*text, ""))
                .collect()
        });
        Prompt::new(TestTerminal::default(), complete, options)
    }

    fn submitted(outcome: Option<LineOutcome>) -> String {
        match outcome {
            Some(LineOutcome::Submitted(document)) => document.text().to_string(),
            other => panic!("expected a submitted line, got {other:?}"),
        }
    }

    #[test]
    fn typing_then_enter_submits_and_records_history() {
        let mut prompt = sql_prompt(PromptOptions::default());
        assert_eq!(prompt.handle_input("abc"), None);
        assert_eq!(submitted(prompt.handle_input("\r")), "abc");
        assert_eq!(prompt.history().entries(), ["abc"]);
        assert_eq!(prompt.buffer().text(), "");
    }

    #[test]
    fn tab_then_enter_accepts_before_submitting() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("se");
        prompt.handle_input("\t");
        assert_eq!(prompt.completion().selected_index(), Some(0));
        assert_eq!(submitted(prompt.handle_input("\r")), "select");
    }

    #[test]
    fn enter_only_accepts_when_submit_on_accept_is_off() {
        let mut prompt = sql_prompt(PromptOptions {
            submit_on_accept: false,
            ..PromptOptions::default()
        });
        prompt.handle_input("fr");
        prompt.handle_input("\t");
        assert_eq!(prompt.handle_input("\r"), None);
        assert_eq!(prompt.buffer().text(), "from");
    }

    #[test]
    fn typing_while_selected_accepts_first() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("wh");
        prompt.handle_input("\t");
        prompt.handle_input(" ");
        assert_eq!(prompt.buffer().text(), "where ");
        assert!(!prompt.completion().completing());
    }

    #[test]
    fn escape_closes_without_accepting() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("se");
        prompt.handle_input("\t");
        prompt.handle_input("\x1b");
        assert_eq!(prompt.buffer().text(), "se");
        assert!(!prompt.completion().completing());
    }

    #[test]
    fn ctrl_d_on_empty_line_is_eof() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("x");
        prompt.handle_input("\x1b[D");
        assert_eq!(prompt.handle_input("\x04"), None);
        assert_eq!(prompt.buffer().text(), "");
        assert_eq!(prompt.handle_input("\x04"), Some(LineOutcome::Eof));
    }

    #[test]
    fn ctrl_c_discards_the_line() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("drop table");
        assert_eq!(prompt.handle_input("\x03"), None);
        assert_eq!(prompt.buffer().text(), "");
        assert!(prompt.history().is_empty());
    }

    #[test]
    fn history_browsing_restores_the_live_line() {
        let mut prompt = sql_prompt(PromptOptions {
            history: vec!["first".to_string(), "second".to_string()],
            ..PromptOptions::default()
        });
        prompt.handle_input("draft");
        prompt.handle_input("\x1b[A");
        assert_eq!(prompt.buffer().text(), "second");
        prompt.handle_input("\x1b[A");
        assert_eq!(prompt.buffer().text(), "first");
        prompt.handle_input("\x1b[B");
        prompt.handle_input("\x1b[B");
        assert_eq!(prompt.buffer().text(), "draft");
    }

    #[test]
    fn emacs_editing_keys() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("select from");
        prompt.handle_input("\x17");
        assert_eq!(prompt.buffer().text(), "select ");
        prompt.handle_input("\x01");
        assert_eq!(prompt.buffer().cursor_position(), 0);
        prompt.handle_input("\x0b");
        assert_eq!(prompt.buffer().text(), "");
    }

    #[test]
    fn word_motion_skips_spaces() {
        let mut prompt = sql_prompt(PromptOptions {
            initial_text: "one two  three".to_string(),
            ..PromptOptions::default()
        });
        prompt.handle_input("\x1bb");
        assert_eq!(prompt.buffer().cursor_position(), 9);
        prompt.handle_input("\x1bb");
        assert_eq!(prompt.buffer().cursor_position(), 4);
        prompt.handle_input("\x1bf");
        assert_eq!(prompt.buffer().cursor_position(), 7);
    }

    #[test]
    fn ctrl_y_cycles_modes() {
        let mut prompt = sql_prompt(PromptOptions {
            modes: vec![CompletionMode::new("SQL", ""), CompletionMode::new("CMD", "")],
            ..PromptOptions::default()
        });
        prompt.handle_input("\x19");
        assert_eq!(prompt.buffer().mode(), 1);
        prompt.handle_input("\x19");
        assert_eq!(prompt.buffer().mode(), 0);
    }

    #[test]
    fn custom_key_bind_replaces_the_default() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.add_key_bind(KeyBind::new("Ctrl+L", |buffer, _completion| {
            buffer.insert_text("!", false, true);
        }));
        prompt.handle_input("\x0c");
        assert_eq!(prompt.buffer().text(), "!");
    }

    #[test]
    fn events_after_enter_wait_for_the_next_line() {
        let mut prompt = sql_prompt(PromptOptions::default());
        prompt.handle_input("a");
        assert_eq!(
            submitted(prompt.handle_input("\r\x1b[200~b\nc\x1b[201~")),
            "a"
        );
        assert_eq!(prompt.buffer().text(), "");
        assert_eq!(submitted(prompt.handle_input("\r")), "b c");
    }

    #[test]
    fn input_reports_closed_input() {
        let mut prompt = sql_prompt(PromptOptions::default());
        assert!(matches!(
            prompt.input(),
            Err(crate::error::PromptError::InputClosed)
        ));
    }
}
