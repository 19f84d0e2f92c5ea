//! Rendering pipeline.

pub mod format;
pub mod renderer;
pub mod style;

pub use renderer::{Renderer, Scrollbar};
pub use style::{Color, ColorPair, HighlightRule, RenderStyle};
