//! Completion manager that computes suggestions off the input thread.
//!
//! The main loop only records the latest document and signals a worker thread. The worker
//! keeps at most one completer call in flight: update requests that arrive meanwhile are
//! dropped, and when the call finishes the worker compares its generation against the latest
//! document and starts one more call if the user kept typing. While a call is in flight, the
//! drop-down shows a single rotating progress comment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, trace};

use crate::core::completion::{
    run_completer, Completion, CompletionManager, RedrawNotifier, Selection, Windowing,
};
use crate::core::document::Document;
use crate::core::progress::Progress;
use crate::core::suggest::{Completer, Suggest};

/// Placeholder animation period.
const PROGRESS_TICK: Duration = Duration::from_millis(100);

enum Signal {
    Update,
    Reset,
    Finished {
        generation: u64,
        suggestions: Vec<Suggest>,
    },
    Shutdown,
}

struct Pending {
    generation: u64,
    document: Arc<Document>,
}

struct Shared {
    pending: Mutex<Pending>,
    suggestions: RwLock<Arc<[Suggest]>>,
    in_flight: AtomicBool,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn suggestions(&self) -> Arc<[Suggest]> {
        let guard = self
            .suggestions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn publish(&self, suggestions: Arc<[Suggest]>) {
        let mut guard = self
            .suggestions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = suggestions;
    }

    fn store_document(&self, document: Arc<Document>) {
        let mut pending = self.pending();
        pending.generation = pending.generation.wrapping_add(1);
        pending.document = document;
    }
}

pub struct AsyncCompletionManager {
    inner: CompletionManager,
    shared: Arc<Shared>,
    tx: Sender<Signal>,
    rx: Option<Receiver<Signal>>,
    progress: Option<Progress>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncCompletionManager {
    pub fn new(completer: Completer, max: usize, progress: Progress) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            inner: CompletionManager::new(completer, max),
            shared: Arc::new(Shared {
                pending: Mutex::new(Pending {
                    generation: 0,
                    document: Arc::new(Document::default()),
                }),
                suggestions: RwLock::new(Arc::from(Vec::new())),
                in_flight: AtomicBool::new(false),
            }),
            tx,
            rx: Some(rx),
            progress: Some(progress),
            worker: None,
        }
    }

    fn sync_inner(&mut self) {
        self.inner.set_suggestions(self.shared.suggestions());
    }

    fn apply(&mut self, selection: Selection, outcome: Windowing) {
        match outcome {
            Windowing::Selected => self.inner.restore_selection(selection),
            Windowing::Reset => self.reset(),
        }
    }

    fn signal(&self, signal: Signal) {
        if self.tx.send(signal).is_err() {
            debug!("completion worker is gone; signal dropped");
        }
    }
}

impl Completion for AsyncCompletionManager {
    fn selected_index(&self) -> Option<usize> {
        self.inner.selection().index(self.shared.suggestions().len())
    }

    fn vertical_scroll(&self) -> usize {
        self.inner.vertical_scroll()
    }

    fn suggestions(&self) -> Arc<[Suggest]> {
        self.shared.suggestions()
    }

    fn max_suggestions(&self) -> usize {
        self.inner.max_suggestions()
    }

    fn next(&mut self) {
        self.sync_inner();
        let suggestions = self.inner.suggestions();
        let max = self.inner.max_suggestions();
        let mut selection = self.inner.selection();
        let outcome = selection.next(&suggestions, max);
        self.apply(selection, outcome);
    }

    fn previous(&mut self) {
        self.sync_inner();
        let suggestions = self.inner.suggestions();
        let max = self.inner.max_suggestions();
        let mut selection = self.inner.selection();
        let outcome = selection.previous(&suggestions, max);
        self.apply(selection, outcome);
    }

    fn reset(&mut self) {
        self.inner.clear_selection();
        self.shared.store_document(Arc::new(Document::default()));
        self.signal(Signal::Reset);
    }

    fn update(&mut self, document: Arc<Document>) {
        self.shared.store_document(document);
        self.signal(Signal::Update);
    }

    fn start_event_loop(&mut self, notifier: RedrawNotifier) {
        let Some(rx) = self.rx.take() else {
            return;
        };
        let worker = Worker {
            shared: Arc::clone(&self.shared),
            rx,
            tx: self.tx.clone(),
            completer: Arc::clone(self.inner.completer()),
            notifier,
            progress: self.progress.take().unwrap_or_default(),
        };
        match thread::Builder::new()
            .name("tape-prompt-completion".to_string())
            .spawn(move || worker.run())
        {
            Ok(handle) => self.worker = Some(handle),
            Err(err) => error!(%err, "failed to spawn completion worker"),
        }
    }

    fn is_refreshing(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for AsyncCompletionManager {
    fn drop(&mut self) {
        let _ = self.tx.send(Signal::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("completion worker panicked");
            }
        }
    }
}

struct Worker {
    shared: Arc<Shared>,
    rx: Receiver<Signal>,
    tx: Sender<Signal>,
    completer: Completer,
    notifier: RedrawNotifier,
    progress: Progress,
}

impl Worker {
    fn run(mut self) {
        let mut next_tick = Instant::now() + PROGRESS_TICK;
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(timeout) {
                Ok(Signal::Update) => self.refresh(),
                Ok(Signal::Reset) => {
                    self.show_progress();
                    self.refresh();
                }
                Ok(Signal::Finished {
                    generation,
                    suggestions,
                }) => self.finish(generation, suggestions),
                Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if self.shared.in_flight.load(Ordering::Acquire) {
                        self.show_progress();
                    }
                    next_tick = Instant::now() + PROGRESS_TICK;
                }
            }
        }
        debug!("completion worker stopped");
    }

    fn refresh(&mut self) {
        if self.shared.in_flight.swap(true, Ordering::AcqRel) {
            trace!("completion refresh coalesced");
            return;
        }

        let (generation, document) = {
            let pending = self.shared.pending();
            (pending.generation, Arc::clone(&pending.document))
        };
        let completer = Arc::clone(&self.completer);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("tape-prompt-completer".to_string())
            .spawn(move || {
                let suggestions = run_completer(&completer, &document);
                let _ = tx.send(Signal::Finished {
                    generation,
                    suggestions,
                });
            });
        if let Err(err) = spawned {
            error!(%err, "failed to spawn completer thread");
            self.shared.in_flight.store(false, Ordering::Release);
        }
    }

    fn finish(&mut self, generation: u64, suggestions: Vec<Suggest>) {
        self.shared.in_flight.store(false, Ordering::Release);
        if generation != self.shared.pending().generation {
            trace!(generation, "stale suggestions dropped");
            self.refresh();
            return;
        }
        self.progress.reset();
        self.shared.publish(Arc::from(suggestions));
        (self.notifier)();
    }

    fn show_progress(&mut self) {
        let placeholder = Suggest::comment(self.progress.next());
        self.shared.publish(Arc::from(vec![placeholder]));
        (self.notifier)();
    }
}
