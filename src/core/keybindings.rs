//! Prompt keybindings: which key ids trigger which built-in editing action.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::warn;

use crate::core::input::normalize_key_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptAction {
    CursorLeft,
    CursorRight,
    CursorWordLeft,
    CursorWordRight,
    CursorLineStart,
    CursorLineEnd,
    DeleteCharBackward,
    DeleteCharForward,
    /// Deletes under the cursor, or ends input on an empty line.
    DeleteCharOrEof,
    DeleteWordBackward,
    DeleteToLineStart,
    DeleteToLineEnd,
    ClearScreen,
    /// Previous completion when one is selected, else previous history entry.
    NavigateUp,
    /// Next completion when one is selected, else next history entry.
    NavigateDown,
    CompleteNext,
    CompletePrevious,
    Submit,
    Cancel,
    CloseCompletion,
    CycleMode,
}

pub type KeyId = String;

#[derive(Debug, Clone)]
pub enum KeyBinding {
    Single(KeyId),
    Multiple(Vec<KeyId>),
}

impl From<&str> for KeyBinding {
    fn from(value: &str) -> Self {
        KeyBinding::Single(value.to_string())
    }
}

impl From<String> for KeyBinding {
    fn from(value: String) -> Self {
        KeyBinding::Single(value)
    }
}

impl From<Vec<&str>> for KeyBinding {
    fn from(value: Vec<&str>) -> Self {
        KeyBinding::Multiple(value.into_iter().map(str::to_string).collect())
    }
}

/// Per-action overrides. An overridden action loses all of its default keys.
#[derive(Debug, Clone, Default)]
pub struct PromptKeybindingsConfig {
    entries: HashMap<PromptAction, KeyBinding>,
}

impl PromptKeybindingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K: Into<KeyBinding>>(&mut self, action: PromptAction, keys: K) {
        self.entries.insert(action, keys.into());
    }
}

pub static DEFAULT_PROMPT_KEYBINDINGS: LazyLock<HashMap<PromptAction, Vec<&'static str>>> =
    LazyLock::new(|| {
        use PromptAction::*;

        HashMap::from([
            (CursorLeft, vec!["left", "ctrl+b"]),
            (CursorRight, vec!["right", "ctrl+f"]),
            (CursorWordLeft, vec!["alt+b", "ctrl+left", "alt+left"]),
            (CursorWordRight, vec!["alt+f", "ctrl+right", "alt+right"]),
            (CursorLineStart, vec!["home", "ctrl+a"]),
            (CursorLineEnd, vec!["end", "ctrl+e"]),
            (DeleteCharBackward, vec!["backspace", "ctrl+h"]),
            (DeleteCharForward, vec!["delete"]),
            (DeleteCharOrEof, vec!["ctrl+d"]),
            (DeleteWordBackward, vec!["ctrl+w", "alt+backspace"]),
            (DeleteToLineStart, vec!["ctrl+u"]),
            (DeleteToLineEnd, vec!["ctrl+k"]),
            (ClearScreen, vec!["ctrl+l"]),
            (NavigateUp, vec!["up", "ctrl+p"]),
            (NavigateDown, vec!["down", "ctrl+n"]),
            (CompleteNext, vec!["tab"]),
            (CompletePrevious, vec!["shift+tab"]),
            (Submit, vec!["enter"]),
            (Cancel, vec!["ctrl+c"]),
            (CloseCompletion, vec!["escape"]),
            (CycleMode, vec!["ctrl+y"]),
        ])
    });

pub struct PromptKeybindingsManager {
    action_to_keys: HashMap<PromptAction, Vec<KeyId>>,
    key_to_action: HashMap<KeyId, PromptAction>,
}

impl PromptKeybindingsManager {
    pub fn new(config: PromptKeybindingsConfig) -> Self {
        let mut manager = Self {
            action_to_keys: HashMap::new(),
            key_to_action: HashMap::new(),
        };
        manager.build_maps(&config);
        manager
    }

    fn build_maps(&mut self, config: &PromptKeybindingsConfig) {
        self.action_to_keys.clear();
        self.key_to_action.clear();

        for (action, keys) in DEFAULT_PROMPT_KEYBINDINGS.iter() {
            if config.entries.contains_key(action) {
                continue;
            }
            let keys = keys.iter().filter_map(|key| normalize_key_id(key)).collect();
            self.action_to_keys.insert(*action, keys);
        }
        for (action, binding) in config.entries.iter() {
            let keys = match binding {
                KeyBinding::Single(key) => vec![key.clone()],
                KeyBinding::Multiple(keys) => keys.clone(),
            };
            let keys = keys
                .iter()
                .filter_map(|key| {
                    let normalized = normalize_key_id(key);
                    if normalized.is_none() {
                        warn!(key = key.as_str(), ?action, "ignoring invalid key id");
                    }
                    normalized
                })
                .collect();
            self.action_to_keys.insert(*action, keys);
        }

        for (action, keys) in &self.action_to_keys {
            if config.entries.contains_key(action) {
                continue;
            }
            for key in keys {
                self.key_to_action.insert(key.clone(), *action);
            }
        }
        // Overrides are inserted last so they win a key shared with a default action.
        for action in config.entries.keys() {
            for key in self.action_to_keys.get(action).into_iter().flatten() {
                self.key_to_action.insert(key.clone(), *action);
            }
        }
    }

    /// Action bound to an already-parsed key id.
    pub fn action_for(&self, key_id: &str) -> Option<PromptAction> {
        self.key_to_action.get(key_id).copied()
    }

    pub fn matches(&self, key_id: &str, action: PromptAction) -> bool {
        self.action_for(key_id) == Some(action)
    }

    pub fn get_keys(&self, action: PromptAction) -> Vec<KeyId> {
        self.action_to_keys.get(&action).cloned().unwrap_or_default()
    }

    pub fn set_config(&mut self, config: PromptKeybindingsConfig) {
        self.build_maps(&config);
    }
}

impl Default for PromptKeybindingsManager {
    fn default() -> Self {
        Self::new(PromptKeybindingsConfig::default())
    }
}
