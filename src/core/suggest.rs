//! Completion candidates, input modes, and the completer callback type.

use std::sync::Arc;

use crate::core::document::Document;

/// One completion candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggest {
    pub icon: Option<String>,
    pub text: String,
    pub description: String,
    /// Informational row: drawn, never selectable.
    pub comment: bool,
}

impl Suggest {
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            comment: true,
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Which columns a mode hides in the drop-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeAttribute {
    #[default]
    None,
    NoDescription,
    NoIcon,
    TextOnly,
}

impl ModeAttribute {
    pub fn shows_description(self) -> bool {
        matches!(self, Self::None | Self::NoIcon)
    }

    pub fn shows_icon(self) -> bool {
        matches!(self, Self::None | Self::NoDescription)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionMode {
    pub name: String,
    pub description: String,
    pub attribute: ModeAttribute,
}

impl CompletionMode {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            attribute: ModeAttribute::None,
        }
    }

    pub fn with_attribute(mut self, attribute: ModeAttribute) -> Self {
        self.attribute = attribute;
        self
    }
}

/// Produces suggestions for a document. Called from a worker thread by the async manager.
pub type Completer = Arc<dyn Fn(&Document) -> Vec<Suggest> + Send + Sync>;

/// Wraps a closure as a [`Completer`].
pub fn completer<F>(f: F) -> Completer
where
    F: Fn(&Document) -> Vec<Suggest> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::{ModeAttribute, Suggest};

    #[test]
    fn comment_constructor_sets_flag() {
        let suggest = Suggest::comment("no matches");
        assert!(suggest.comment);
        assert_eq!(suggest.text, "no matches");
    }

    #[test]
    fn mode_attributes_hide_columns() {
        assert!(ModeAttribute::None.shows_icon());
        assert!(ModeAttribute::None.shows_description());
        assert!(!ModeAttribute::NoIcon.shows_icon());
        assert!(ModeAttribute::NoIcon.shows_description());
        assert!(ModeAttribute::NoDescription.shows_icon());
        assert!(!ModeAttribute::NoDescription.shows_description());
        assert!(!ModeAttribute::TextOnly.shows_icon());
        assert!(!ModeAttribute::TextOnly.shows_description());
    }
}
