//! Colors and the render style passed to the renderer.
//!
//! Style is a plain value owned by each renderer; there is no process-wide palette.

use std::collections::HashMap;
use std::str::FromStr;

use crate::core::output::{Sgr, SgrColor};
use crate::error::{PromptError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Color {
    #[default]
    Default,
    Black,
    DarkRed,
    DarkGreen,
    Brown,
    DarkBlue,
    Purple,
    Cyan,
    LightGray,
    DarkGray,
    Red,
    Green,
    Yellow,
    Blue,
    Fuchsia,
    Turquoise,
    White,
    Rgb(u8, u8, u8),
}

const NAMED: [(&str, Color); 17] = [
    ("default", Color::Default),
    ("black", Color::Black),
    ("darkred", Color::DarkRed),
    ("darkgreen", Color::DarkGreen),
    ("brown", Color::Brown),
    ("darkblue", Color::DarkBlue),
    ("purple", Color::Purple),
    ("cyan", Color::Cyan),
    ("lightgray", Color::LightGray),
    ("darkgray", Color::DarkGray),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("fuchsia", Color::Fuchsia),
    ("turquoise", Color::Turquoise),
    ("white", Color::White),
];

impl Color {
    pub fn to_sgr(self) -> SgrColor {
        let palette = match self {
            Color::Default => return SgrColor::Default,
            Color::Rgb(r, g, b) => return SgrColor::Rgb(r, g, b),
            Color::Black => 0,
            Color::DarkRed => 1,
            Color::DarkGreen => 2,
            Color::Brown => 3,
            Color::DarkBlue => 4,
            Color::Purple => 5,
            Color::Cyan => 6,
            Color::LightGray => 7,
            Color::DarkGray => 8,
            Color::Red => 9,
            Color::Green => 10,
            Color::Yellow => 11,
            Color::Blue => 12,
            Color::Fuchsia => 13,
            Color::Turquoise => 14,
            Color::White => 15,
        };
        SgrColor::Palette(palette)
    }
}

impl FromStr for Color {
    type Err = PromptError;

    /// Accepts a palette name (case, `_`, `-` and spaces ignored) or `#rrggbb`.
    fn from_str(value: &str) -> Result<Self> {
        let invalid = || PromptError::InvalidColor {
            value: value.to_string(),
        };

        if let Some(hex) = value.trim().strip_prefix('#') {
            if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());
            return Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }

        let key: String = value
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        NAMED
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, color)| *color)
            .ok_or_else(invalid)
    }
}

/// Foreground/background pair for one drawn element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
}

impl ColorPair {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    pub fn sgr(self, bold: bool) -> Sgr {
        Sgr {
            fg: self.fg.to_sgr(),
            bg: self.bg.to_sgr(),
            bold,
        }
    }
}

/// Draws a whole space-delimited input token in `color`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRule {
    pub word: String,
    pub color: Color,
}

impl HighlightRule {
    pub fn new(word: impl Into<String>, color: Color) -> Self {
        Self {
            word: word.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    pub prefix: ColorPair,
    pub input: ColorPair,
    pub preview_suggestion: ColorPair,
    pub suggestion: ColorPair,
    pub selected_suggestion: ColorPair,
    pub description: ColorPair,
    pub selected_description: ColorPair,
    pub comment_suggestion: ColorPair,
    pub comment_description: ColorPair,
    pub mode_prefix: ColorPair,
    pub mode_suffix: ColorPair,
    pub scrollbar_thumb: Color,
    pub scrollbar_bg: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        use Color::*;

        Self {
            prefix: ColorPair::new(Blue, Default),
            input: ColorPair::new(Default, Default),
            preview_suggestion: ColorPair::new(Green, Default),
            suggestion: ColorPair::new(White, Cyan),
            selected_suggestion: ColorPair::new(Black, Turquoise),
            description: ColorPair::new(Default, Turquoise),
            selected_description: ColorPair::new(White, Cyan),
            comment_suggestion: ColorPair::new(Default, Default),
            comment_description: ColorPair::new(Default, Default),
            mode_prefix: ColorPair::new(Default, Purple),
            mode_suffix: ColorPair::new(Default, Purple),
            scrollbar_thumb: DarkGray,
            scrollbar_bg: Cyan,
        }
    }
}

impl RenderStyle {
    /// Sets one color by field name, e.g. `"suggestion_bg"` or `"scrollbar_thumb"`.
    ///
    /// Pair fields take a `_text` or `_bg` suffix.
    pub fn set_color(&mut self, field: &str, value: &str) -> Result<()> {
        let slot = self
            .color_slot(field)
            .ok_or_else(|| PromptError::UnknownStyleField {
                field: field.to_string(),
            })?;
        *slot = value.parse()?;
        Ok(())
    }

    /// Applies every entry; stops at the first invalid one.
    pub fn apply_colors(&mut self, colors: &HashMap<String, String>) -> Result<()> {
        let mut entries: Vec<_> = colors.iter().collect();
        entries.sort();
        for (field, value) in entries {
            self.set_color(field, value)?;
        }
        Ok(())
    }

    fn color_slot(&mut self, field: &str) -> Option<&mut Color> {
        match field {
            "scrollbar_thumb" => return Some(&mut self.scrollbar_thumb),
            "scrollbar_bg" => return Some(&mut self.scrollbar_bg),
            _ => {}
        }

        let (pair, is_bg) = if let Some(name) = field.strip_suffix("_text") {
            (name, false)
        } else if let Some(name) = field.strip_suffix("_bg") {
            (name, true)
        } else {
            return None;
        };
        let pair = match pair {
            "prefix" => &mut self.prefix,
            "input" => &mut self.input,
            "preview_suggestion" => &mut self.preview_suggestion,
            "suggestion" => &mut self.suggestion,
            "selected_suggestion" => &mut self.selected_suggestion,
            "description" => &mut self.description,
            "selected_description" => &mut self.selected_description,
            "comment_suggestion" => &mut self.comment_suggestion,
            "comment_description" => &mut self.comment_description,
            "mode_prefix" => &mut self.mode_prefix,
            "mode_suffix" => &mut self.mode_suffix,
            _ => return None,
        };
        Some(if is_bg { &mut pair.bg } else { &mut pair.fg })
    }
}
