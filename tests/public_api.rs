#![allow(unused_imports)]

use tape_prompt::{
    completer, filter_contains, filter_fuzzy, filter_has_prefix, filter_has_suffix, matches_key,
    normalize_key_id, parse_input_events, parse_key, AsyncCompletionManager, Buffer, Color,
    ColorPair, Completer, Completion, CompletionManager, CompletionMode, Document, EnvConfig,
    HighlightRule, History, InputEvent, KeyBind, KeyBinding, KeyId, LineOutcome, ModeAttribute,
    OutputGate, ProcessTerminal, Progress, Prompt, PromptAction, PromptError,
    PromptKeybindingsConfig, PromptKeybindingsManager, PromptOptions, RedrawNotifier,
    RenderStyle, Renderer, Result, Scrollbar, Suggest, Terminal, TerminalCmd,
};

#[test]
fn public_api_exports_compile() {}
