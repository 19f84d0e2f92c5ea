//! Prompt configuration.

use crate::core::buffer::Buffer;
use crate::core::completion::{Completion, DEFAULT_MAX_SUGGESTIONS};
use crate::core::document::Document;
use crate::core::keybindings::{KeyId, PromptKeybindingsConfig};
use crate::core::suggest::CompletionMode;
use crate::render::style::{HighlightRule, RenderStyle};

pub type KeyBindHandler = Box<dyn FnMut(&mut Buffer, &mut dyn Completion) + Send>;
pub type ExitChecker = Box<dyn FnMut(&Document) -> bool + Send>;

/// A caller-supplied action for one key id. Replaces the built-in action for that key.
pub struct KeyBind {
    pub key: KeyId,
    pub handler: KeyBindHandler,
}

impl KeyBind {
    pub fn new<F>(key: impl Into<KeyId>, handler: F) -> Self
    where
        F: FnMut(&mut Buffer, &mut dyn Completion) + Send + 'static,
    {
        Self {
            key: key.into(),
            handler: Box::new(handler),
        }
    }
}

impl std::fmt::Debug for KeyBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBind").field("key", &self.key).finish()
    }
}

#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub prefix: String,
    pub title: Option<String>,
    /// Pre-filled text; the cursor starts at its end.
    pub initial_text: String,
    /// Characters ending the word a suggestion replaces. Empty means a space.
    pub word_separator: String,
    pub max_suggestions: usize,
    pub style: RenderStyle,
    /// Seed entries, oldest first.
    pub history: Vec<String>,
    pub modes: Vec<CompletionMode>,
    pub show_completion_at_start: bool,
    /// Down opens the drop-down even when nothing is selected yet.
    pub completion_on_down: bool,
    /// Computes suggestions on a background thread.
    pub async_completion: bool,
    /// Frames of the placeholder shown while suggestions are computed in the background.
    pub progress_frames: Vec<String>,
    pub highlight: Vec<HighlightRule>,
    /// Enter on a highlighted suggestion accepts it and submits the line in one step.
    pub submit_on_accept: bool,
    pub keybindings: PromptKeybindingsConfig,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            prefix: "> ".to_string(),
            title: None,
            initial_text: String::new(),
            word_separator: String::new(),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            style: RenderStyle::default(),
            history: Vec::new(),
            modes: Vec::new(),
            show_completion_at_start: false,
            completion_on_down: false,
            async_completion: false,
            progress_frames: Vec::new(),
            highlight: Vec::new(),
            submit_on_accept: true,
            keybindings: PromptKeybindingsConfig::default(),
        }
    }
}
