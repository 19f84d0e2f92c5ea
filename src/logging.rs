//! File logging through `tracing`.
//!
//! The prompt owns the terminal, so log output never goes to stdout/stderr. Call
//! [`init_from_env`] (or [`init_file_logging`]) once at startup and keep the returned guard
//! alive until exit; dropping it flushes the background writer.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::error::{PromptError, Result};

const DEFAULT_DIRECTIVE: &str = "tape_prompt=info";
const DEBUG_DIRECTIVE: &str = "tape_prompt=debug";

/// Installs a global subscriber appending to `path`.
///
/// `RUST_LOG` overrides the default filter. Fails if a global subscriber is already set.
pub fn init_file_logging(path: impl AsRef<Path>, debug: bool) -> Result<WorkerGuard> {
    let path = path.as_ref();
    let file_name = path.file_name().ok_or_else(|| PromptError::Logging {
        message: format!("log path {} has no file name", path.display()),
    })?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { DEBUG_DIRECTIVE } else { DEFAULT_DIRECTIVE })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| PromptError::Logging {
            message: err.to_string(),
        })?;
    Ok(guard)
}

/// Starts file logging when `TAPE_PROMPT_LOG` names a file.
pub fn init_from_env(config: &EnvConfig) -> Result<Option<WorkerGuard>> {
    match config.log_file.as_deref() {
        Some(path) => init_file_logging(path, config.debug).map(Some),
        None => Ok(None),
    }
}
