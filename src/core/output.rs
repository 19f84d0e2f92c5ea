//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes must flow through `OutputGate::flush(..)`. Nothing outside
//! this module formats a control sequence.

use std::fmt::Write as _;

use crate::core::terminal::Terminal;

/// Display attribute pair written by [`TerminalCmd::SetColor`], as SGR parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sgr {
    pub fg: SgrColor,
    pub bg: SgrColor,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrColor {
    /// Terminal default.
    Default,
    /// 16-colour palette index, 0..=15.
    Palette(u8),
    Rgb(u8, u8, u8),
}

impl Sgr {
    fn write_params(&self, out: &mut String) {
        out.push_str(if self.bold { "1" } else { "22" });
        push_color(out, self.fg, 30, 90, 38, 39);
        push_color(out, self.bg, 40, 100, 48, 49);
    }
}

fn push_color(out: &mut String, color: SgrColor, base: u8, bright: u8, extended: u8, default: u8) {
    match color {
        SgrColor::Default => {
            let _ = write!(out, ";{default}");
        }
        SgrColor::Palette(index) if index < 8 => {
            let _ = write!(out, ";{}", base + index);
        }
        SgrColor::Palette(index) => {
            let _ = write!(out, ";{}", bright + (index.min(15) - 8));
        }
        SgrColor::Rgb(r, g, b) => {
            let _ = write!(out, ";{extended};2;{r};{g};{b}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Text written as-is.
    Bytes(String),

    /// Relative cursor motion. A count of 0 emits nothing.
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),

    /// Erase from the cursor to the end of the screen.
    EraseDown,
    EraseScreen,
    /// 1-based absolute position; only used after clearing the screen.
    CursorGoTo { row: u16, col: u16 },

    SetColor(Sgr),
    ResetColor,

    /// Cursor visibility.
    HideCursor,
    ShowCursor,

    SetTitle(String),
    ClearTitle,

    /// Scroll the viewport so rows below the cursor exist.
    ScrollDown,
    ScrollUp,

    BracketedPasteEnable,
    BracketedPasteDisable,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    /// Appends the escape sequence for this command to `out`.
    pub fn encode(&self, out: &mut String) {
        match self {
            Self::Bytes(data) => out.push_str(data),
            Self::CursorUp(n) => push_csi(out, *n, 'A'),
            Self::CursorDown(n) => push_csi(out, *n, 'B'),
            Self::CursorForward(n) => push_csi(out, *n, 'C'),
            Self::CursorBackward(n) => push_csi(out, *n, 'D'),
            Self::EraseDown => out.push_str("\x1b[J"),
            Self::EraseScreen => out.push_str("\x1b[2J"),
            Self::CursorGoTo { row, col } => {
                let _ = write!(out, "\x1b[{};{}H", (*row).max(1), (*col).max(1));
            }
            Self::SetColor(sgr) => {
                out.push_str("\x1b[");
                sgr.write_params(out);
                out.push('m');
            }
            Self::ResetColor => out.push_str("\x1b[0m"),
            Self::HideCursor => out.push_str("\x1b[?25l"),
            Self::ShowCursor => out.push_str("\x1b[?25h"),
            Self::SetTitle(title) => {
                let title: String = title.chars().filter(|ch| !ch.is_control()).collect();
                let _ = write!(out, "\x1b]2;{title}\x07");
            }
            Self::ClearTitle => out.push_str("\x1b]2;\x07"),
            Self::ScrollDown => out.push_str("\x1bD"),
            Self::ScrollUp => out.push_str("\x1bM"),
            Self::BracketedPasteEnable => out.push_str("\x1b[?2004h"),
            Self::BracketedPasteDisable => out.push_str("\x1b[?2004l"),
        }
    }
}

fn push_csi(out: &mut String, n: u16, code: char) {
    if n == 0 {
        return;
    }
    let _ = write!(out, "\x1b[{n}{code}");
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Buffered commands, oldest first.
    pub fn pending(&self) -> &[TerminalCmd] {
        &self.cmds
    }

    /// Flush buffered commands to the terminal in a single write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) {
        if self.cmds.is_empty() {
            return;
        }
        let data = cmds_to_string(self.cmds.drain(..));
        if !data.is_empty() {
            term.write(&data);
        }
    }
}

/// Encodes commands into the bytes a terminal would receive.
pub fn cmds_to_string<I>(cmds: I) -> String
where
    I: IntoIterator<Item = TerminalCmd>,
{
    let mut out = String::new();
    for cmd in cmds {
        cmd.encode(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{cmds_to_string, Sgr, SgrColor, TerminalCmd};

    #[test]
    fn zero_motion_emits_nothing() {
        let out = cmds_to_string([TerminalCmd::CursorUp(0), TerminalCmd::CursorBackward(0)]);
        assert_eq!(out, "");
    }

    #[test]
    fn motion_and_erase_sequences() {
        let out = cmds_to_string([
            TerminalCmd::CursorUp(2),
            TerminalCmd::CursorForward(3),
            TerminalCmd::EraseDown,
        ]);
        assert_eq!(out, "\x1b[2A\x1b[3C\x1b[J");
    }

    #[test]
    fn sgr_encodes_palette_bright_and_rgb() {
        let out = cmds_to_string([
            TerminalCmd::SetColor(Sgr {
                fg: SgrColor::Palette(0),
                bg: SgrColor::Palette(14),
                bold: false,
            }),
            TerminalCmd::SetColor(Sgr {
                fg: SgrColor::Rgb(1, 2, 3),
                bg: SgrColor::Default,
                bold: true,
            }),
        ]);
        assert_eq!(out, "\x1b[22;30;106m\x1b[1;38;2;1;2;3;49m");
    }

    #[test]
    fn title_strips_control_chars() {
        let out = cmds_to_string([TerminalCmd::SetTitle("a\x07b".to_string())]);
        assert_eq!(out, "\x1b]2;ab\x07");
    }
}
