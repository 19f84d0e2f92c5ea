//! Terminal trait: the render sink and geometry source the prompt talks to.

/// Minimal terminal interface for the prompt.
pub trait Terminal {
    /// Start the terminal with input and resize handlers.
    ///
    /// `on_input` receives complete key sequences or bracketed pastes, one per call.
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()>;

    /// Stop the terminal and restore state.
    fn stop(&mut self) -> std::io::Result<()>;

    /// Write output to the terminal.
    fn write(&mut self, data: &str);

    /// Terminal dimensions; 0 when unknown.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;
}
