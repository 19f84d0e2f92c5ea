//! Terminal backed by the process's own stdin/stdout.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::EnvConfig;
use crate::core::output::TerminalCmd;
use crate::core::terminal::Terminal;
use crate::platform::stdin_buffer::{StdinBuffer, StdinEvent};

#[cfg(unix)]
use libc::c_int;
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// How long a partial escape sequence may wait for its remaining bytes.
#[cfg(unix)]
const ESCAPE_TIMEOUT_MS: u64 = 10;
#[cfg(unix)]
const POLL_INTERVAL_MS: i32 = 50;

#[cfg(unix)]
type InputHandler = Arc<Mutex<Option<Box<dyn FnMut(String) + Send>>>>;
#[cfg(unix)]
type ResizeHandler = Arc<Mutex<Option<Box<dyn FnMut() + Send>>>>;

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    (result == 0).then_some((size.ws_col, size.ws_row))
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    // Hang-up and errors count as readable so the next read reports them.
    let ready = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
    result > 0 && (fds.revents & ready) != 0
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn write_fd(fd: c_int, bytes: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < bytes.len() {
        let rest = &bytes[written..];
        let result = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
        }
        written += result as usize;
    }
    Ok(())
}

/// Raw-mode terminal on the process's stdin/stdout.
///
/// Input is read on a background poll thread and resize notifications come from a `SIGWINCH`
/// listener; both call the handlers registered in [`Terminal::start`].
#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    input_handler: InputHandler,
    resize_handler: ResizeHandler,
    stop_flag: Arc<AtomicBool>,
    input_thread: Option<JoinHandle<()>>,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self::with_write_log(EnvConfig::from_env().write_log.map(PathBuf::from))
    }

    /// Appends every byte written to the terminal to `path`, for replaying sessions.
    pub fn with_write_log(write_log_path: Option<PathBuf>) -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            input_thread: None,
            resize_signal_handle: None,
            resize_thread: None,
            write_log_path,
            write_log_failed: false,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        // Keep `\n` meaning a new line on output.
        raw.c_oflag |= libc::OPOST | libc::ONLCR;
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> io::Result<()> {
        match self.original_termios.take() {
            Some(original) => set_termios(self.stdin_fd, &original),
            None => Ok(()),
        }
    }

    fn start_input_thread(&mut self) -> io::Result<()> {
        let stdin_fd = self.stdin_fd;
        let handler = Arc::clone(&self.input_handler);
        let stop_flag = Arc::clone(&self.stop_flag);

        let thread = thread::Builder::new()
            .name("tape-prompt-stdin".to_string())
            .spawn(move || {
                let mut chunk = [0u8; 4096];
                let mut stdin_buffer = StdinBuffer::new(ESCAPE_TIMEOUT_MS);
                while !stop_flag.load(Ordering::SeqCst) {
                    let timeout = stdin_buffer.next_timeout_ms(Instant::now(), POLL_INTERVAL_MS);
                    let events = if poll_readable(stdin_fd, timeout) {
                        let len =
                            unsafe { libc::read(stdin_fd, chunk.as_mut_ptr().cast(), chunk.len()) };
                        if len == 0 {
                            debug!("stdin closed");
                            close_input(&handler, &mut stdin_buffer);
                            break;
                        }
                        if len < 0 {
                            let err = io::Error::last_os_error();
                            if err.kind() == io::ErrorKind::Interrupted {
                                continue;
                            }
                            warn!(error = %err, "stdin read failed");
                            close_input(&handler, &mut stdin_buffer);
                            break;
                        }
                        stdin_buffer.process(&chunk[..len as usize])
                    } else {
                        stdin_buffer.flush_due(Instant::now())
                    };
                    dispatch_input(&handler, events);
                }
            })?;
        self.input_thread = Some(thread);
        Ok(())
    }

    fn start_resize_thread(&mut self) -> io::Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH])?;
        let handle = signals.handle();
        let handler = Arc::clone(&self.resize_handler);

        let thread = thread::Builder::new()
            .name("tape-prompt-resize".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    let mut handler = handler.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(handler) = handler.as_mut() {
                        handler();
                    }
                }
            })?;
        self.resize_signal_handle = Some(handle);
        self.resize_thread = Some(thread);
        Ok(())
    }

    fn stop_threads(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(thread) = self.input_thread.take() {
            let _ = thread.join();
        }
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn clear_handlers(&self) {
        *self
            .input_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        *self
            .resize_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn append_write_log(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        let Some(path) = self.write_log_path.as_ref() else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(data.as_bytes()));
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "disabling terminal write log");
            self.write_log_failed = true;
        }
    }
}

/// Pastes are re-wrapped in their markers so the prompt can tell them from typed text.
#[cfg(unix)]
fn dispatch_input(handler: &InputHandler, events: Vec<StdinEvent>) {
    if events.is_empty() {
        return;
    }
    let mut handler = handler.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(handler) = handler.as_mut() else {
        return;
    };
    for event in events {
        match event {
            StdinEvent::Data(sequence) => handler(sequence),
            StdinEvent::Paste(text) => handler(format!("\x1b[200~{text}\x1b[201~")),
        }
    }
}

/// Delivers whatever is still buffered, then drops the handler so its owner sees input end.
#[cfg(unix)]
fn close_input(handler: &InputHandler, stdin_buffer: &mut StdinBuffer) {
    dispatch_input(handler, stdin_buffer.flush());
    let closed = handler
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    drop(closed);
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        *self
            .input_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(on_input);
        *self
            .resize_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(on_resize);
        self.stop_flag.store(false, Ordering::SeqCst);

        if let Err(err) = self.enable_raw_mode() {
            self.clear_handlers();
            return Err(err);
        }
        let started = self
            .start_resize_thread()
            .and_then(|()| self.start_input_thread());
        if let Err(err) = started {
            self.stop_threads();
            self.clear_handlers();
            let _ = self.restore_raw_mode();
            return Err(err);
        }

        let mut enable_paste = String::new();
        TerminalCmd::BracketedPasteEnable.encode(&mut enable_paste);
        self.write(&enable_paste);
        debug!(fd = self.stdin_fd, "terminal started in raw mode");
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        let mut disable_paste = String::new();
        TerminalCmd::BracketedPasteDisable.encode(&mut disable_paste);
        self.write(&disable_paste);

        self.stop_threads();
        self.clear_handlers();
        // Drop unread input so it does not leak into the shell.
        unsafe {
            libc::tcflush(self.stdin_fd, libc::TCIFLUSH);
        }
        self.restore_raw_mode()
    }

    fn write(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if let Err(err) = write_fd(self.stdout_fd, data.as_bytes()) {
            warn!(error = %err, "terminal write failed");
        }
        self.append_write_log(data);
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd).map_or(0, |(cols, _)| cols)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd).map_or(0, |(_, rows)| rows)
    }
}

#[cfg(unix)]
impl Drop for ProcessTerminal {
    fn drop(&mut self) {
        if self.original_termios.is_some() || self.input_thread.is_some() {
            let _ = self.stop();
        }
    }
}

/// Placeholder for platforms without termios; starting it always fails.
#[cfg(not(unix))]
#[derive(Default)]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process terminal requires a unix tty",
        ))
    }

    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write(&mut self, data: &str) {
        let _ = io::stdout().write_all(data.as_bytes());
        let _ = io::stdout().flush();
    }

    fn columns(&self) -> u16 {
        0
    }

    fn rows(&self) -> u16 {
        0
    }
}
