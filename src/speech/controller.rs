//! Playback controller for reading articles aloud
//!
//! Turns markdown into chunks and plays them one after another through a
//! [`SpeechEngine`]. Each playback session runs as one task that walks the
//! chunk list with a cursor and waits on exactly one utterance at a time, so
//! chunk `n + 1` is never handed to the engine before chunk `n` has ended.
//!
//! State transitions:
//!
//! ```text
//! idle -> processing -> speaking -> idle      chunks exhausted
//! processing -> error                         start never confirmed
//! any -> idle                                 stop, engine failure, teardown
//! ```

use crate::speech::chunker::split_text_into_chunks;
use crate::speech::config::SpeechConfig;
use crate::speech::engine::{
    SpeechEngine, Utterance, UtteranceCallbacks, UtteranceEvent, INTERRUPTED,
};
use crate::speech::readiness::{watch_voices, ReadinessTiming};
use crate::speech::sanitize::clean_markdown;
use crate::speech::voice::select_voice;
use crate::{ListenError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Playback state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing playing
    #[default]
    Idle,
    /// Waiting for the engine to confirm the first utterance started
    Processing,
    /// Audio is playing
    Speaking,
    /// The engine never confirmed a start
    Error,
}

/// Everything a view needs to render the controller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,

    /// Message for the user, kept until the next start or stop
    pub error_message: Option<String>,

    /// Index of the chunk last confirmed started
    pub current_chunk: usize,

    /// Number of chunks in the active session
    pub total_chunks: usize,

    /// Whether the engine has voices (or the readiness timeout passed)
    pub voices_ready: bool,
}

impl PlaybackSnapshot {
    pub fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Processing | PlaybackState::Speaking)
    }
}

struct Inner {
    snapshot: PlaybackSnapshot,

    /// Session allowed to mutate playback state; stale tasks are ignored
    session: Option<Uuid>,
}

/// State shared between the controller and its tasks
struct Shared {
    inner: Mutex<Inner>,
    updates: watch::Sender<PlaybackSnapshot>,
}

impl Shared {
    fn new() -> Self {
        let (updates, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            inner: Mutex::new(Inner {
                snapshot: PlaybackSnapshot::default(),
                session: None,
            }),
            updates,
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.inner.lock().snapshot.clone()
    }

    fn update(&self, f: impl FnOnce(&mut Inner)) {
        let mut inner = self.inner.lock();
        f(&mut inner);
        self.updates.send_replace(inner.snapshot.clone());
    }

    /// Apply `f` only while `session` is still the active one
    fn update_session(&self, session: Uuid, f: impl FnOnce(&mut Inner)) -> bool {
        let mut inner = self.inner.lock();
        if inner.session != Some(session) {
            return false;
        }
        f(&mut inner);
        self.updates.send_replace(inner.snapshot.clone());
        true
    }

    fn set_error_message(&self, message: String) {
        self.update(|inner| inner.snapshot.error_message = Some(message));
    }
}

fn release(inner: &mut Inner, message: Option<String>) {
    inner.session = None;
    inner.snapshot.state = PlaybackState::Idle;
    inner.snapshot.error_message = message;
    inner.snapshot.current_chunk = 0;
    inner.snapshot.total_chunks = 0;
}

/// Reads text aloud through a [`SpeechEngine`], one chunk at a time.
///
/// Must be created inside a Tokio runtime; its tasks run on that runtime.
/// Dropping the controller cancels any speech in flight and stops its
/// background tasks.
pub struct PlaybackController {
    engine: Option<Arc<dyn SpeechEngine>>,
    runtime: Handle,
    config: Arc<SpeechConfig>,
    shared: Arc<Shared>,
    session_task: Option<JoinHandle<()>>,
    readiness_task: Option<JoinHandle<()>>,
}

impl PlaybackController {
    /// Create a controller. `None` means the host has no speech capability;
    /// the controller then stays idle and reports itself unsupported.
    pub fn new(engine: Option<Arc<dyn SpeechEngine>>, config: SpeechConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            ListenError::ConfigError(format!("playback needs a Tokio runtime: {}", e))
        })?;

        let shared = Arc::new(Shared::new());
        let readiness_task = engine.as_ref().map(|engine| {
            let timing = ReadinessTiming {
                hard_timeout: config.voice_init_timeout,
                retry_interval: config.voice_check_retry,
            };
            let shared = Arc::clone(&shared);
            runtime.spawn(watch_voices(Arc::clone(engine), timing, move |ready| {
                shared.update(|inner| inner.snapshot.voices_ready = ready);
            }))
        });

        if engine.is_none() {
            info!("No speech engine available, playback disabled");
        }

        Ok(Self {
            engine,
            runtime,
            config: Arc::new(config),
            shared,
            session_task: None,
            readiness_task,
        })
    }

    /// Whether the host provides a speech engine
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    /// Current observable state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.snapshot()
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.snapshot().state
    }

    pub fn error_message(&self) -> Option<String> {
        self.shared.snapshot().error_message
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Start reading `text` aloud, replacing any session in progress.
    ///
    /// Only input problems are returned; engine failures after this point are
    /// reported through the snapshot.
    pub fn start(&mut self, text: &str) -> Result<()> {
        let Some(engine) = self.engine.clone() else {
            let err = ListenError::EngineUnsupported;
            self.shared.set_error_message(err.user_message());
            return Err(err);
        };

        let cleaned = clean_markdown(text);
        let chunks = split_text_into_chunks(
            &cleaned,
            self.config.max_chunk_length,
            self.config.min_chunk_length,
        );
        if chunks.is_empty() {
            let err = ListenError::EmptyInput;
            self.shared.set_error_message(err.user_message());
            return Err(err);
        }

        self.abort_session();

        let session = Uuid::new_v4();
        let total = chunks.len();
        self.shared.update(|inner| {
            inner.session = Some(session);
            inner.snapshot.state = PlaybackState::Processing;
            inner.snapshot.error_message = None;
            inner.snapshot.current_chunk = 0;
            inner.snapshot.total_chunks = total;
        });

        info!(
            "Starting playback session {} ({} chars, {} chunks)",
            session,
            cleaned.chars().count(),
            total
        );

        let deadline = Instant::now() + self.config.processing_timeout;
        engine.cancel();

        let runner = SessionRunner {
            session,
            engine,
            config: Arc::clone(&self.config),
            shared: Arc::clone(&self.shared),
        };
        self.session_task = Some(self.runtime.spawn(runner.run(chunks, deadline)));

        Ok(())
    }

    /// Stop playback and return to idle. Safe to call in any state.
    pub fn stop(&mut self) {
        if let Some(engine) = &self.engine {
            engine.cancel();
        }
        self.abort_session();
        self.shared.update(|inner| release(inner, None));
        debug!("Playback stopped");
    }

    fn abort_session(&mut self) {
        self.shared.update(|inner| inner.session = None);
        if let Some(task) = self.session_task.take() {
            task.abort();
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(engine) = &self.engine {
            engine.cancel();
        }
        if let Some(task) = self.session_task.take() {
            task.abort();
        }
        if let Some(task) = self.readiness_task.take() {
            task.abort();
        }
        self.shared.update(|inner| release(inner, None));
    }
}

/// How the wait on one utterance ended
enum ChunkOutcome {
    Ended,
    Released(Option<String>),
    TimedOut,
}

/// Drives one playback session
struct SessionRunner {
    session: Uuid,
    engine: Arc<dyn SpeechEngine>,
    config: Arc<SpeechConfig>,
    shared: Arc<Shared>,
}

impl SessionRunner {
    async fn run(self, chunks: Vec<String>, deadline: Instant) {
        let total = chunks.len();
        // Armed until the engine confirms a start
        let mut processing_deadline = Some(deadline);

        for (index, chunk) in chunks.into_iter().enumerate() {
            if index > 0 {
                // Let the previous utterance's callbacks unwind first
                tokio::task::yield_now().await;
            }

            if !self.is_current() {
                return;
            }

            let utterance = self.build_utterance(chunk, index);
            let (callbacks, mut events) = UtteranceCallbacks::channel(utterance.id);

            debug!(
                "Speaking chunk {}/{} ({} chars)",
                index + 1,
                total,
                utterance.text.chars().count()
            );

            if let Err(e) = self.engine.speak(utterance, callbacks) {
                error!("Failed to submit chunk {}: {}", index, e);
                let message = ListenError::SubmissionFailure(e.to_string()).user_message();
                self.shared.update_session(self.session, |inner| release(inner, Some(message)));
                return;
            }

            match self.wait_for_chunk(index, &mut events, &mut processing_deadline).await {
                ChunkOutcome::Ended => {}
                ChunkOutcome::Released(message) => {
                    self.shared.update_session(self.session, |inner| release(inner, message));
                    return;
                }
                ChunkOutcome::TimedOut => {
                    let message = ListenError::InitializationTimeout.user_message();
                    let current = self.shared.update_session(self.session, |inner| {
                        inner.session = None;
                        inner.snapshot.state = PlaybackState::Error;
                        inner.snapshot.error_message = Some(message);
                    });
                    if current {
                        self.engine.cancel();
                    }
                    return;
                }
            }
        }

        if self.shared.update_session(self.session, |inner| release(inner, None)) {
            info!("Playback session {} finished", self.session);
        }
    }

    async fn wait_for_chunk(
        &self,
        index: usize,
        events: &mut tokio::sync::mpsc::UnboundedReceiver<UtteranceEvent>,
        processing_deadline: &mut Option<Instant>,
    ) -> ChunkOutcome {
        let mut transitioned = false;

        loop {
            let event = match *processing_deadline {
                Some(deadline) => tokio::select! {
                    event = events.recv() => event,
                    _ = sleep_until(deadline) => {
                        *processing_deadline = None;
                        if self.engine.is_speaking() {
                            warn!("Engine is speaking without a start notification");
                            self.mark_speaking(index);
                            continue;
                        }
                        warn!(
                            "No speech started within {:?}",
                            self.config.processing_timeout
                        );
                        return ChunkOutcome::TimedOut;
                    }
                },
                None => events.recv().await,
            };

            match event {
                Some(UtteranceEvent::Started) => {
                    transitioned = true;
                    *processing_deadline = None;
                    self.mark_speaking(index);
                }
                Some(UtteranceEvent::Ended) => return ChunkOutcome::Ended,
                Some(UtteranceEvent::Error(code)) => {
                    if code == INTERRUPTED {
                        debug!("Chunk {} interrupted", index);
                        return ChunkOutcome::Released(None);
                    }
                    warn!("Engine error on chunk {}: {}", index, code);
                    if transitioned {
                        return ChunkOutcome::Released(None);
                    }
                    let err = ListenError::PlaybackError {
                        chunk_index: index,
                        code,
                    };
                    return ChunkOutcome::Released(Some(err.user_message()));
                }
                None => {
                    // Engine dropped the callbacks without reporting an end
                    debug!("Callbacks for chunk {} dropped by the engine", index);
                    return ChunkOutcome::Released(None);
                }
            }
        }
    }

    fn build_utterance(&self, text: String, chunk_index: usize) -> Utterance {
        let voices = self.engine.voices();
        let voice = select_voice(&voices, &self.config.preferred_voices).cloned();

        Utterance {
            id: Uuid::new_v4(),
            text,
            voice,
            pitch: self.config.pitch,
            rate: self.config.rate,
            chunk_index,
        }
    }

    fn mark_speaking(&self, index: usize) {
        self.shared.update_session(self.session, |inner| {
            inner.snapshot.state = PlaybackState::Speaking;
            inner.snapshot.error_message = None;
            inner.snapshot.current_chunk = index;
        });
    }

    fn is_current(&self) -> bool {
        self.shared.inner.lock().session == Some(self.session)
    }
}
