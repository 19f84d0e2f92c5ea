//! Animation frames for the "working" placeholder.

pub const DEFAULT_FRAMES: &[&str] = &["|", "/", "-", "\\"];

#[derive(Debug, Clone)]
pub struct Progress {
    frames: Vec<String>,
    index: Option<usize>,
}

impl Progress {
    /// Empty `frames` fall back to [`DEFAULT_FRAMES`].
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frames: Vec<String> = frames.into_iter().map(Into::into).collect();
        if frames.is_empty() {
            frames = DEFAULT_FRAMES.iter().map(|frame| frame.to_string()).collect();
        }
        Self {
            frames,
            index: None,
        }
    }

    /// Returns the next frame, starting from the first and wrapping around.
    pub fn next(&mut self) -> &str {
        let index = match self.index {
            Some(index) => (index + 1) % self.frames.len(),
            None => 0,
        };
        self.index = Some(index);
        &self.frames[index]
    }

    pub fn reset(&mut self) {
        self.index = None;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;

    #[test]
    fn frames_cycle_from_first() {
        let mut progress = Progress::new(["a", "b"]);
        assert_eq!(progress.next(), "a");
        assert_eq!(progress.next(), "b");
        assert_eq!(progress.next(), "a");
        progress.reset();
        assert_eq!(progress.next(), "a");
    }

    #[test]
    fn empty_frames_use_defaults() {
        let mut progress = Progress::new(Vec::<String>::new());
        assert_eq!(progress.next(), "|");
    }
}
