//! Core interfaces and types.

pub mod async_completion;
pub mod buffer;
pub mod completion;
pub mod document;
pub mod filter;
pub mod history;
pub mod input;
pub mod input_event;
pub mod keybindings;
pub mod output;
pub mod progress;
pub mod suggest;
pub mod terminal;
pub mod text;
