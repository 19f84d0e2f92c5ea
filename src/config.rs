//! Environment configuration.

use std::env;

pub const LOG_FILE_VAR: &str = "TAPE_PROMPT_LOG";
pub const WRITE_LOG_VAR: &str = "TAPE_PROMPT_WRITE_LOG";
pub const DEBUG_VAR: &str = "TAPE_PROMPT_DEBUG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Destination for `tracing` output; logging stays off when unset.
    pub log_file: Option<String>,
    /// Raw copy of every byte written to the terminal.
    pub write_log: Option<String>,
    /// Lowers the default log level to `debug`.
    pub debug: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            log_file: env_string_opt(LOG_FILE_VAR),
            write_log: env_string_opt(WRITE_LOG_VAR),
            debug: env_flag(DEBUG_VAR),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
