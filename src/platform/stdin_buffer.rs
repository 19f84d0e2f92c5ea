//! Splits raw stdin chunks into complete key sequences and bracketed pastes.
//!
//! A lone `ESC` (or any unfinished escape sequence) is held back until either more bytes
//! complete it or the flush deadline passes, so the escape key still works on its own.

use std::time::{Duration, Instant};

const ESC: u8 = 0x1b;
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinEvent {
    /// One key sequence or printable character.
    Data(String),
    /// Contents of a bracketed paste, markers stripped.
    Paste(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Complete,
    Incomplete,
}

pub struct StdinBuffer {
    pending: String,
    utf8_tail: Vec<u8>,
    paste: Option<String>,
    timeout: Duration,
    flush_deadline: Option<Instant>,
}

impl StdinBuffer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            pending: String::new(),
            utf8_tail: Vec::new(),
            paste: None,
            timeout: Duration::from_millis(timeout_ms),
            flush_deadline: None,
        }
    }

    pub fn process(&mut self, data: &[u8]) -> Vec<StdinEvent> {
        self.flush_deadline = None;
        let text = self.decode(data);
        let mut events = Vec::new();
        self.process_str(&text, &mut events);
        if !self.pending.is_empty() && self.paste.is_none() {
            self.flush_deadline = Some(Instant::now() + self.timeout);
        }
        events
    }

    /// Emits a held-back partial sequence verbatim once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<StdinEvent> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Poll timeout honouring the flush deadline.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        match self.flush_deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now).as_millis();
                i32::try_from(remaining).unwrap_or(i32::MAX).min(default_ms)
            }
            None => default_ms,
        }
    }

    pub fn flush(&mut self) -> Vec<StdinEvent> {
        self.flush_deadline = None;
        if self.pending.is_empty() {
            return Vec::new();
        }
        vec![StdinEvent::Data(std::mem::take(&mut self.pending))]
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.utf8_tail.clear();
        self.paste = None;
        self.flush_deadline = None;
    }

    /// Decodes `data`, keeping an incomplete trailing UTF-8 sequence for the next chunk.
    fn decode(&mut self, data: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(data);
        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                let valid = err.valid_up_to();
                self.utf8_tail = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn process_str(&mut self, data: &str, events: &mut Vec<StdinEvent>) {
        if let Some(mut paste) = self.paste.take() {
            paste.push_str(data);
            match paste.find(PASTE_END) {
                Some(end) => {
                    let rest = paste[end + PASTE_END.len()..].to_string();
                    paste.truncate(end);
                    events.push(StdinEvent::Paste(paste));
                    self.process_str(&rest, events);
                }
                None => self.paste = Some(paste),
            }
            return;
        }

        self.pending.push_str(data);
        if let Some(start) = self.pending.find(PASTE_START) {
            let before = self.pending[..start].to_string();
            let after = self.pending[start + PASTE_START.len()..].to_string();
            self.pending.clear();
            // Bytes before the marker are complete by construction.
            let (sequences, rest) = split_sequences(&before);
            events.extend(sequences.into_iter().map(StdinEvent::Data));
            if !rest.is_empty() {
                events.push(StdinEvent::Data(rest));
            }
            self.paste = Some(String::new());
            self.process_str(&after, events);
            return;
        }

        let (sequences, rest) = split_sequences(&self.pending);
        self.pending = rest;
        events.extend(sequences.into_iter().map(StdinEvent::Data));
    }
}

/// Complete sequences in order, plus an unfinished escape tail.
fn split_sequences(data: &str) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        if data.as_bytes()[pos] != ESC {
            let Some(ch) = data[pos..].chars().next() else {
                break;
            };
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }

        let candidate_end = (pos + 1..=data.len())
            .filter(|end| data.is_char_boundary(*end))
            .find(|end| sequence_status(&data[pos..*end]) == Status::Complete);
        match candidate_end {
            Some(end) => {
                sequences.push(data[pos..end].to_string());
                pos = end;
            }
            None => return (sequences, data[pos..].to_string()),
        }
    }
    (sequences, String::new())
}

fn sequence_status(seq: &str) -> Status {
    let bytes = seq.as_bytes();
    if bytes.len() < 2 {
        return Status::Incomplete;
    }
    let terminated = |seq: &str| {
        if seq.ends_with('\x07') || seq.ends_with("\x1b\\") {
            Status::Complete
        } else {
            Status::Incomplete
        }
    };
    match bytes[1] {
        b'[' => csi_status(bytes),
        b'O' if bytes.len() >= 3 => Status::Complete,
        b'O' => Status::Incomplete,
        b']' | b'P' | b'_' => terminated(seq),
        _ => Status::Complete,
    }
}

fn csi_status(bytes: &[u8]) -> Status {
    // Legacy X10 mouse: ESC [ M followed by three raw bytes.
    if bytes.get(2) == Some(&b'M') {
        return if bytes.len() >= 6 {
            Status::Complete
        } else {
            Status::Incomplete
        };
    }
    match bytes.last() {
        Some(last) if bytes.len() >= 3 && (0x40..=0x7e).contains(last) => {
            // Linux console function keys: ESC [ [ A
            if bytes.len() == 3 && *last == b'[' {
                Status::Incomplete
            } else {
                Status::Complete
            }
        }
        _ => Status::Incomplete,
    }
}

#[cfg(test)]
mod tests {
    use super::{StdinBuffer, StdinEvent};
    use std::time::{Duration, Instant};

    fn data(items: &[&str]) -> Vec<StdinEvent> {
        items.iter().map(|s| StdinEvent::Data(s.to_string())).collect()
    }

    #[test]
    fn splits_text_into_characters() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(buffer.process("ab".as_bytes()), data(&["a", "b"]));
    }

    #[test]
    fn splits_partial_sequences_across_chunks() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.process(b"[").is_empty());
        assert_eq!(buffer.process(b"Ax"), data(&["\x1b[A", "x"]));
    }

    #[test]
    fn lone_escape_flushes_after_deadline() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        let now = Instant::now();
        assert!(buffer.flush_due(now).is_empty());
        assert_eq!(
            buffer.flush_due(now + Duration::from_millis(50)),
            data(&["\x1b"])
        );
        assert!(buffer.flush_due(now + Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn alt_and_linux_console_sequences() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(buffer.process(b"\x1bb\x1b[[A"), data(&["\x1bb", "\x1b[[A"]));
        assert_eq!(buffer.process(b"\x1bOH"), data(&["\x1bOH"]));
    }

    #[test]
    fn bracketed_paste_is_one_event() {
        let mut buffer = StdinBuffer::new(10);
        let events = buffer.process(b"a\x1b[200~x\x1b[Ay");
        assert_eq!(events, data(&["a"]));
        let events = buffer.process(b"z\x1b[201~\r");
        assert_eq!(
            events,
            vec![
                StdinEvent::Paste("x\x1b[Ayz".to_string()),
                StdinEvent::Data("\r".to_string()),
            ]
        );
    }

    #[test]
    fn utf8_split_across_chunks_is_reassembled() {
        let mut buffer = StdinBuffer::new(10);
        let bytes = "é".as_bytes();
        assert!(buffer.process(&bytes[..1]).is_empty());
        assert_eq!(buffer.process(&bytes[1..]), data(&["é"]));
    }

    #[test]
    fn clear_drops_pending_state() {
        let mut buffer = StdinBuffer::new(10);
        buffer.process(b"\x1b[");
        buffer.clear();
        assert!(buffer.flush().is_empty());
        assert_eq!(buffer.next_timeout_ms(Instant::now(), 50), 50);
    }
}
