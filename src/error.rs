use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("terminal I/O error while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("input channel closed before a line was submitted")]
    InputClosed,

    #[error("invalid color '{value}': expected a color name or #rrggbb")]
    InvalidColor { value: String },

    #[error("unknown style field '{field}'")]
    UnknownStyleField { field: String },

    #[error("failed to initialize logging: {message}")]
    Logging { message: String },
}

impl PromptError {
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::PromptError;

    #[test]
    fn io_error_names_operation() {
        let err = PromptError::io(
            "starting terminal",
            std::io::Error::new(std::io::ErrorKind::Other, "no tty"),
        );
        assert_eq!(err.to_string(), "terminal I/O error while starting terminal: no tty");
    }

    #[test]
    fn invalid_color_message() {
        let err = PromptError::InvalidColor {
            value: "#12".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid color '#12': expected a color name or #rrggbb"
        );
    }
}
