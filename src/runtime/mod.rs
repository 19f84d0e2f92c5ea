//! Prompt runtime: options and the input loop.

pub mod options;
pub mod prompt;

pub use options::{ExitChecker, KeyBind, KeyBindHandler, PromptOptions};
pub use prompt::{LineOutcome, Prompt};
