//! Completion state machine: suggestion list, selection, and the visible scroll window.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use crate::core::document::Document;
use crate::core::suggest::{Completer, Suggest};

pub const DEFAULT_MAX_SUGGESTIONS: usize = 6;

/// Asks the main loop to redraw. Called from worker threads.
pub type RedrawNotifier = Arc<dyn Fn() + Send + Sync>;

/// Capability set shared by the synchronous and asynchronous managers.
pub trait Completion: Send {
    /// Selected row, `None` when nothing is selected or the selection went stale.
    fn selected_index(&self) -> Option<usize>;

    /// First visible row of the drop-down.
    fn vertical_scroll(&self) -> usize;

    /// Current suggestions. The list is replaced wholesale, never mutated in place.
    fn suggestions(&self) -> Arc<[Suggest]>;

    fn max_suggestions(&self) -> usize;

    fn next(&mut self);
    fn previous(&mut self);
    fn reset(&mut self);
    fn update(&mut self, document: Arc<Document>);

    /// Starts background work, if any. `notifier` is invoked whenever suggestions change
    /// outside of a call on this trait.
    fn start_event_loop(&mut self, _notifier: RedrawNotifier) {}

    /// True while suggestions are being computed in the background.
    fn is_refreshing(&self) -> bool {
        false
    }

    fn completing(&self) -> bool {
        self.selected_index().is_some()
    }

    fn selected_suggestion(&self) -> Option<Suggest> {
        let index = self.selected_index()?;
        self.suggestions().get(index).cloned()
    }
}

/// Result of a selection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Windowing {
    Selected,
    /// The selection walked off the end; the owner must reset.
    Reset,
}

/// Selection index plus scroll offset, independent of where suggestions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    selected: isize,
    scroll: isize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            selected: -1,
            scroll: 0,
        }
    }
}

impl Selection {
    pub fn selected(&self) -> isize {
        self.selected
    }

    pub fn scroll(&self) -> isize {
        self.scroll
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Advances past any comment rows. Running off the end asks for a reset.
    pub fn next(&mut self, suggestions: &[Suggest], max: usize) -> Windowing {
        let last_visible = max as isize - 1;
        loop {
            if self.scroll + last_visible == self.selected {
                self.scroll += 1;
            }
            self.selected += 1;
            if !is_comment(suggestions, self.selected) {
                break;
            }
        }
        self.window(suggestions, max)
    }

    /// Steps back past any comment rows. Stepping back from "nothing selected" wraps to the
    /// last selectable row.
    pub fn previous(&mut self, suggestions: &[Suggest], max: usize) -> Windowing {
        loop {
            if self.selected == self.scroll && self.scroll > 0 {
                self.scroll -= 1;
            }
            self.selected -= 1;
            if self.selected < 0 || !is_comment(suggestions, self.selected) {
                break;
            }
        }
        self.window(suggestions, max)
    }

    fn window(&mut self, suggestions: &[Suggest], max: usize) -> Windowing {
        let len = suggestions.len() as isize;
        let visible = max.min(suggestions.len()) as isize;

        if self.selected >= len {
            return Windowing::Reset;
        }
        if self.selected < -1 {
            self.selected = len - 1;
            self.scroll = len - visible;
            while self.selected >= 0 && is_comment(suggestions, self.selected) {
                self.selected -= 1;
            }
        }

        if self.selected < 0 {
            self.selected = -1;
            self.scroll = 0;
        } else if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + visible {
            self.scroll = self.selected - visible + 1;
        }
        Windowing::Selected
    }

    pub fn index(&self, len: usize) -> Option<usize> {
        usize::try_from(self.selected).ok().filter(|index| *index < len)
    }
}

fn is_comment(suggestions: &[Suggest], index: isize) -> bool {
    usize::try_from(index)
        .ok()
        .and_then(|index| suggestions.get(index))
        .is_some_and(|suggest| suggest.comment)
}

/// Runs the completer, turning a panic into an empty list.
pub fn run_completer(completer: &Completer, document: &Document) -> Vec<Suggest> {
    match catch_unwind(AssertUnwindSafe(|| completer(document))) {
        Ok(suggestions) => suggestions,
        Err(payload) => {
            error!(
                reason = panic_message(payload.as_ref()),
                text = document.text(),
                "completer panicked; showing no suggestions"
            );
            Vec::new()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Synchronous manager: the completer runs on the caller's thread inside `update`.
pub struct CompletionManager {
    completer: Completer,
    suggestions: Arc<[Suggest]>,
    selection: Selection,
    max: usize,
}

impl CompletionManager {
    /// `max` is floored at 1.
    pub fn new(completer: Completer, max: usize) -> Self {
        Self {
            completer,
            suggestions: Arc::from(Vec::new()),
            selection: Selection::default(),
            max: max.max(1),
        }
    }

    pub fn completer(&self) -> &Completer {
        &self.completer
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Swaps in a list computed elsewhere. The selection is left for the next step to clamp.
    pub fn set_suggestions(&mut self, suggestions: Arc<[Suggest]>) {
        self.suggestions = suggestions;
    }

    pub fn restore_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

impl Completion for CompletionManager {
    fn selected_index(&self) -> Option<usize> {
        self.selection.index(self.suggestions.len())
    }

    fn vertical_scroll(&self) -> usize {
        self.selection.scroll().max(0) as usize
    }

    fn suggestions(&self) -> Arc<[Suggest]> {
        Arc::clone(&self.suggestions)
    }

    fn max_suggestions(&self) -> usize {
        self.max
    }

    fn next(&mut self) {
        if self.selection.next(&self.suggestions, self.max) == Windowing::Reset {
            self.reset();
        }
    }

    fn previous(&mut self) {
        if self.selection.previous(&self.suggestions, self.max) == Windowing::Reset {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.selection.clear();
        self.update(Arc::new(Document::default()));
    }

    fn update(&mut self, document: Arc<Document>) {
        self.suggestions = Arc::from(run_completer(&self.completer, &document));
    }
}
