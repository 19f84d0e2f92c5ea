//! Terminal line editor with a completion drop-down.
//!
//! Invariant: single output gate: only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Build a [`Prompt`] from a [`Terminal`] (usually [`ProcessTerminal`]), a [`Completer`]
//!   and [`PromptOptions`], then call [`Prompt::input`] or [`Prompt::run`].
//! - [`Document`] and [`Buffer`] hold the edited line; [`History`] the submitted ones.
//! - [`CompletionManager`] computes suggestions inline, [`AsyncCompletionManager`] on a
//!   worker thread; both implement [`Completion`].
//! - [`Renderer`] turns buffer and completion state into relative cursor motion and colors.
//! - The `filter_*` helpers narrow a suggestion list for a completer.

#![allow(
    clippy::derivable_impls,
    clippy::too_many_arguments,
    clippy::type_complexity
)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

pub use crate::config::EnvConfig;
pub use crate::error::{PromptError, Result};

/// Edited line, history and completion state.
pub use crate::core::async_completion::AsyncCompletionManager;
pub use crate::core::buffer::Buffer;
pub use crate::core::completion::{Completion, CompletionManager, RedrawNotifier};
pub use crate::core::document::Document;
pub use crate::core::filter::{filter_contains, filter_fuzzy, filter_has_prefix, filter_has_suffix};
pub use crate::core::history::History;
pub use crate::core::progress::Progress;
pub use crate::core::suggest::{completer, Completer, CompletionMode, ModeAttribute, Suggest};

/// Keys and input events.
pub use crate::core::input::{matches_key, normalize_key_id, parse_key};
pub use crate::core::input_event::{parse_input_events, InputEvent};
pub use crate::core::keybindings::{
    KeyBinding, KeyId, PromptAction, PromptKeybindingsConfig, PromptKeybindingsManager,
};

/// Terminal and output.
pub use crate::core::output::{OutputGate, TerminalCmd};
pub use crate::core::terminal::Terminal;
pub use crate::platform::ProcessTerminal;

/// Rendering.
pub use crate::render::{Color, ColorPair, HighlightRule, RenderStyle, Renderer, Scrollbar};

/// Prompt runtime.
pub use crate::runtime::{KeyBind, LineOutcome, Prompt, PromptOptions};
