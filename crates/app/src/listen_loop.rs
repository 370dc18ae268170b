//! The listen/process/speak control loop.
//!
//! A single dedicated worker thread drives capture, transcription,
//! handler dispatch, and synthesis serially; it is the only concurrency
//! unit in the system. External callers interact through the run-state
//! flags only (start/stop/toggle), and the loop reads that state once per
//! iteration. Nothing that happens inside the loop is fatal: the only way
//! it terminates is an explicit stop request.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use parley_audio::{AudioSource, Utterance};
use parley_foundation::{AppError, HandlerError, RunState, SttError, StateHandle};
use parley_stt::SpeechToText;
use parley_tts::TextToSpeech;

use crate::handler::Handler;

/// Spoken when the handler itself fails (panic or timeout).
pub const APOLOGY: &str = "Sorry, I ran into a problem answering that.";

pub type SharedSource = Arc<Mutex<Box<dyn AudioSource>>>;
pub type SharedStt = Arc<Mutex<Box<dyn SpeechToText>>>;
pub type SharedTts = Arc<Mutex<Box<dyn TextToSpeech>>>;

#[derive(Debug, Clone)]
pub struct ListenLoopConfig {
    /// BCP-47 language tag passed to transcription.
    pub language: String,
    /// Per-attempt wait for speech to start.
    pub listen_timeout: Duration,
    /// Maximum phrase duration once speech has started.
    pub max_phrase: Duration,
    /// Idle sleep while paused.
    pub poll_interval: Duration,
    /// Backoff after a capture failure other than a clean timeout.
    pub error_backoff: Duration,
    /// Resume listening after a dispatch if we were listening before it.
    pub auto_restart: bool,
    /// Optional watchdog around the handler call. With `None` the call
    /// is unbounded and a hanging handler stalls the loop.
    pub handler_timeout: Option<Duration>,
    /// How long `stop()` waits for the worker before giving up the join.
    pub stop_grace: Duration,
}

impl Default for ListenLoopConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            listen_timeout: Duration::from_secs(5),
            max_phrase: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            error_backoff: Duration::from_millis(500),
            auto_restart: true,
            handler_timeout: None,
            stop_grace: Duration::from_secs(2),
        }
    }
}

/// Owns the run-state machine and the worker thread.
pub struct ListenLoop {
    state: StateHandle,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    source: SharedSource,
    stt: SharedStt,
    tts: SharedTts,
    handler: Arc<dyn Handler>,
    cfg: ListenLoopConfig,
}

impl ListenLoop {
    pub fn new(
        source: Box<dyn AudioSource>,
        stt: Box<dyn SpeechToText>,
        tts: Box<dyn TextToSpeech>,
        handler: Arc<dyn Handler>,
        cfg: ListenLoopConfig,
    ) -> Self {
        Self {
            state: StateHandle::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
            source: Arc::new(Mutex::new(source)),
            stt: Arc::new(Mutex::new(stt)),
            tts: Arc::new(Mutex::new(tts)),
            handler,
            cfg,
        }
    }

    /// Start the loop. Idempotent: liveness is checked on the worker
    /// handle itself, so calling start while running never spawns a
    /// second worker.
    pub fn start(&mut self) -> Result<(), AppError> {
        if self.worker.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::debug!("Listen loop already running, ignoring start");
            return Ok(());
        }

        self.shutdown.store(false, Ordering::SeqCst);
        self.state.set(RunState::Listening);

        let worker = Worker {
            state: self.state.clone(),
            shutdown: Arc::clone(&self.shutdown),
            source: Arc::clone(&self.source),
            stt: Arc::clone(&self.stt),
            tts: Arc::clone(&self.tts),
            handler: Arc::clone(&self.handler),
            cfg: self.cfg.clone(),
        };

        let handle = thread::Builder::new()
            .name("listen-loop".to_string())
            .spawn(move || worker.run())
            .map_err(|e| AppError::Fatal(format!("Failed to spawn listen loop: {}", e)))?;
        self.worker = Some(handle);
        Ok(())
    }

    /// Signal termination and wait, bounded by the grace period, for the
    /// worker to finish. Best-effort: a worker blocked inside a capture,
    /// synthesis, or handler call cannot be interrupted, and stop()
    /// returns without a joined guarantee in that case.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.state.set(RunState::Stopped);

        if let Some(handle) = self.worker.take() {
            let deadline = Instant::now() + self.cfg.stop_grace;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(50));
            }
            if handle.is_finished() {
                let _ = handle.join();
                tracing::info!("Listen loop stopped");
            } else {
                tracing::warn!(
                    "Listen loop did not exit within {:?}, detaching",
                    self.cfg.stop_grace
                );
            }
        }
        // A dispatch that raced the stop may have restored Listening on
        // its way out; the terminal state wins.
        self.state.set(RunState::Stopped);
    }

    /// Flip between `Listening` and `Paused`, returning the post-toggle
    /// "is listening" value.
    pub fn toggle(&self) -> bool {
        self.state.toggle_listening()
    }

    /// Synchronously speak `text`. A no-op for empty input; synthesis
    /// failures are logged, never propagated.
    pub fn speak(&self, text: &str) {
        speak_text(&self.tts, text);
    }

    pub fn state(&self) -> RunState {
        self.state.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state.is_listening()
    }
}

impl Drop for ListenLoop {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn speak_text(tts: &SharedTts, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if let Err(e) = tts.lock().speak(text) {
        tracing::warn!("Speech synthesis failed: {}", e);
    }
}

struct Worker {
    state: StateHandle,
    shutdown: Arc<AtomicBool>,
    source: SharedSource,
    stt: SharedStt,
    tts: SharedTts,
    handler: Arc<dyn Handler>,
    cfg: ListenLoopConfig,
}

impl Worker {
    fn run(self) {
        tracing::info!("Listen loop started");

        while !self.shutdown.load(Ordering::SeqCst) {
            if self.state.current() != RunState::Listening {
                thread::sleep(self.cfg.poll_interval);
                continue;
            }

            // Scoped acquisition: the source holds the device only for
            // the duration of this attempt.
            let captured = {
                let mut source = self.source.lock();
                source.listen(self.cfg.listen_timeout, self.cfg.max_phrase)
            };

            match captured {
                Ok(utterance) => self.dispatch(utterance),
                Err(e) if e.is_timeout() => {
                    tracing::trace!("No speech this attempt");
                }
                Err(e) => {
                    tracing::warn!("Capture failed: {}", e);
                    thread::sleep(self.cfg.error_backoff);
                }
            }
        }

        tracing::info!("Listen loop exiting");
    }

    fn dispatch(&self, utterance: Utterance) {
        let text = {
            let mut stt = self.stt.lock();
            match stt.transcribe(&utterance, &self.cfg.language) {
                Ok(text) => text,
                Err(SttError::UnknownSpeech) => {
                    tracing::debug!("Utterance not understood");
                    return;
                }
                Err(SttError::Service(e)) => {
                    tracing::error!("Transcription service failed: {}", e);
                    return;
                }
            }
        };
        tracing::debug!("Heard: {}", text);

        // Mute capture so our own synthesized speech is not re-captured
        // as input. A toggle() from another thread between here and the
        // restore below is overwritten when dispatch finishes; known
        // ambiguity, kept as observed.
        let was_listening = self.state.is_listening();
        self.state.set(RunState::Paused);

        match self.invoke_handler(text) {
            Ok(response) => speak_text(&self.tts, &response),
            Err(e) => {
                tracing::error!("Handler failed: {}", e);
                speak_text(&self.tts, APOLOGY);
            }
        }

        if was_listening && self.cfg.auto_restart {
            self.state.set(RunState::Listening);
        }
    }

    fn invoke_handler(&self, text: String) -> Result<String, HandlerError> {
        match self.cfg.handler_timeout {
            None => catch_unwind(AssertUnwindSafe(|| self.handler.process(&text)))
                .map_err(|payload| HandlerError::Panicked(panic_message(&payload))),
            Some(limit) => {
                let (tx, rx) = crossbeam_channel::bounded(1);
                let handler = Arc::clone(&self.handler);
                let spawned = thread::Builder::new()
                    .name("parley-handler".to_string())
                    .spawn(move || {
                        let result = catch_unwind(AssertUnwindSafe(|| handler.process(&text)));
                        let _ = tx.send(result);
                    });
                if let Err(e) = spawned {
                    return Err(HandlerError::Panicked(format!(
                        "failed to spawn handler thread: {}",
                        e
                    )));
                }
                match rx.recv_timeout(limit) {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(payload)) => Err(HandlerError::Panicked(panic_message(&payload))),
                    // The stray handler thread finishes detached; its
                    // late response is discarded.
                    Err(_) => Err(HandlerError::Timeout(limit)),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
