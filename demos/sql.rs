//! Minimal SQL shell: keyword completion, two completion modes, history and highlighting.
//!
//! Run with `cargo run --example sql`. Set `TAPE_PROMPT_LOG=/tmp/sql.log` to capture tracing
//! output and `TAPE_PROMPT_ASYNC=1` to compute suggestions on the worker thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tape_prompt::logging::init_from_env;
use tape_prompt::{
    completer, filter_fuzzy, filter_has_prefix, Color, CompletionMode, Document, EnvConfig,
    HighlightRule, ModeAttribute, ProcessTerminal, Prompt, PromptOptions, Suggest,
};

const KEYWORDS: [(&str, &str); 12] = [
    ("select", "choose columns"),
    ("from", "source table"),
    ("where", "filter rows"),
    ("insert", "add rows"),
    ("into", "target table"),
    ("values", "row literals"),
    ("update", "modify rows"),
    ("delete", "remove rows"),
    ("order", "sort clause"),
    ("by", "sort or group key"),
    ("limit", "cap row count"),
    ("exit", "leave the shell"),
];

fn catalog() -> Vec<Suggest> {
    let mut suggestions = vec![Suggest::comment("-- keywords")];
    suggestions.extend(
        KEYWORDS
            .iter()
            .map(|(text, description)| Suggest::new(*text, *description).with_icon("🔑")),
    );
    suggestions
}

fn main() {
    let config = EnvConfig::from_env();
    let _log_guard = match init_from_env(&config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("sql: {err}");
            None
        }
    };
    let slow = std::env::var_os("TAPE_PROMPT_ASYNC").is_some();

    let catalog = Arc::new(catalog());
    let complete = completer(move |document: &Document| {
        if slow {
            thread::sleep(Duration::from_millis(300));
        }
        let word = document.word_before_cursor();
        if word.is_empty() {
            return Vec::new();
        }
        match document.mode() {
            1 => filter_fuzzy(&catalog, word, true),
            _ => filter_has_prefix(&catalog, word, true),
        }
    });

    let options = PromptOptions {
        prefix: "sql> ".to_string(),
        title: Some("tape_prompt sql".to_string()),
        modes: vec![
            CompletionMode::new("prefix", ""),
            CompletionMode::new("fuzzy", "fuzzy keyword match")
                .with_attribute(ModeAttribute::NoIcon),
        ],
        async_completion: slow,
        highlight: ["select", "from", "where"]
            .into_iter()
            .map(|word| HighlightRule::new(word, Color::Cyan))
            .collect(),
        ..PromptOptions::default()
    };

    let mut prompt = Prompt::new(ProcessTerminal::new(), complete, options);
    prompt.set_exit_checker(|document| document.text().trim() == "exit");
    let result = prompt.run(|line| {
        let line = line.trim();
        if !line.is_empty() && line != "exit" {
            println!("would run: {line}");
        }
    });
    if let Err(err) = result {
        eprintln!("sql: {err}");
        std::process::exit(1);
    }
}
