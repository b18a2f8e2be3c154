//! Scripted speech engine for driving the controller in tests

#![allow(dead_code)]

use listen::speech::{
    EngineError, PlaybackController, PlaybackState, SpeechConfig, SpeechEngine, Utterance,
    UtteranceCallbacks, Voice, INTERRUPTED,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// How the fake engine reacts to `speak`
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    /// Callbacks are fired by the test
    Manual,
    /// Starts immediately and ends after `duration`
    AutoPlay { duration: Duration },
    /// Accepts the utterance and reports nothing, not even speaking
    Silent,
    /// Produces audio but never reports a start
    SpeakingSilently,
    /// Raises a synchronous error
    Reject,
}

#[derive(Clone, Debug)]
pub struct SpokenUtterance {
    pub utterance: Utterance,
    pub callbacks: UtteranceCallbacks,
    pub at: Instant,
    pub finished: bool,
}

#[derive(Default)]
struct FakeState {
    voices: Vec<Voice>,
    spoken: Vec<SpokenUtterance>,
    ended_at: Vec<Instant>,
    cancel_count: usize,
    speaking: bool,
    in_flight: usize,
    max_in_flight: usize,
    generation: u64,
}

pub struct FakeEngine {
    behavior: Mutex<Behavior>,
    state: Arc<Mutex<FakeState>>,
    voices_changed_tx: Option<broadcast::Sender<()>>,
}

impl FakeEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self::with_voices(behavior, vec![Voice::new("Google US English", "en-US")])
    }

    pub fn with_voices(behavior: Behavior, voices: Vec<Voice>) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            state: Arc::new(Mutex::new(FakeState {
                voices,
                ..Default::default()
            })),
            voices_changed_tx: None,
        }
    }

    /// Engine that announces voice list changes
    pub fn with_notifications(mut self) -> Self {
        let (tx, _) = broadcast::channel(8);
        self.voices_changed_tx = Some(tx);
        self
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn set_voices(&self, voices: Vec<Voice>, notify: bool) {
        self.state.lock().voices = voices;
        if notify {
            if let Some(tx) = &self.voices_changed_tx {
                let _ = tx.send(());
            }
        }
    }

    /// Number of live voices-changed subscriptions
    pub fn voice_listeners(&self) -> usize {
        self.voices_changed_tx
            .as_ref()
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    pub fn spoken(&self) -> Vec<SpokenUtterance> {
        self.state.lock().spoken.clone()
    }

    pub fn speak_count(&self) -> usize {
        self.state.lock().spoken.len()
    }

    pub fn ended_at(&self) -> Vec<Instant> {
        self.state.lock().ended_at.clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().cancel_count
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    pub fn fire_start(&self, index: usize) {
        let callbacks = {
            let mut state = self.state.lock();
            state.speaking = true;
            state.spoken[index].callbacks.clone()
        };
        callbacks.on_start();
    }

    pub fn fire_end(&self, index: usize) {
        let callbacks = {
            let mut state = self.state.lock();
            state.speaking = false;
            state.spoken[index].finished = true;
            let now = Instant::now();
            state.ended_at.push(now);
            state.spoken[index].callbacks.clone()
        };
        callbacks.on_end();
    }

    pub fn fire_error(&self, index: usize, code: &str) {
        let callbacks = {
            let mut state = self.state.lock();
            state.speaking = false;
            state.spoken[index].finished = true;
            state.spoken[index].callbacks.clone()
        };
        callbacks.on_error(code);
    }
}

impl SpeechEngine for FakeEngine {
    fn voices(&self) -> Vec<Voice> {
        self.state.lock().voices.clone()
    }

    fn speak(
        &self,
        utterance: Utterance,
        callbacks: UtteranceCallbacks,
    ) -> Result<(), EngineError> {
        let behavior = *self.behavior.lock();
        if behavior == Behavior::Reject {
            return Err(EngineError::Rejected("queue full".to_string()));
        }

        let generation = {
            let mut state = self.state.lock();
            state.spoken.push(SpokenUtterance {
                utterance,
                callbacks: callbacks.clone(),
                at: Instant::now(),
                finished: false,
            });
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            if behavior == Behavior::SpeakingSilently {
                state.speaking = true;
            }
            state.generation
        };

        if let Behavior::AutoPlay { duration } = behavior {
            let state = Arc::clone(&self.state);
            let index = self.state.lock().spoken.len() - 1;
            tokio::spawn(async move {
                state.lock().speaking = true;
                callbacks.on_start();
                tokio::time::sleep(duration).await;
                {
                    let mut state = state.lock();
                    if state.generation != generation {
                        return;
                    }
                    state.speaking = false;
                    state.in_flight -= 1;
                    state.spoken[index].finished = true;
                    let now = Instant::now();
                    state.ended_at.push(now);
                }
                callbacks.on_end();
            });
        }

        Ok(())
    }

    fn cancel(&self) {
        let interrupted: Vec<UtteranceCallbacks> = {
            let mut state = self.state.lock();
            state.cancel_count += 1;
            state.generation += 1;
            state.speaking = false;
            state.in_flight = 0;
            state
                .spoken
                .iter_mut()
                .filter(|s| !s.finished)
                .map(|s| {
                    s.finished = true;
                    s.callbacks.clone()
                })
                .collect()
        };
        for callbacks in interrupted {
            callbacks.on_error(INTERRUPTED);
        }
    }

    fn is_speaking(&self) -> bool {
        self.state.lock().speaking
    }

    fn voices_changed(&self) -> Option<broadcast::Receiver<()>> {
        self.voices_changed_tx.as_ref().map(|tx| tx.subscribe())
    }
}

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "listen=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn controller_for(engine: &Arc<FakeEngine>) -> PlaybackController {
    controller_with_config(engine, SpeechConfig::default())
}

pub fn controller_with_config(
    engine: &Arc<FakeEngine>,
    config: SpeechConfig,
) -> PlaybackController {
    init_tracing();
    let engine: Arc<dyn SpeechEngine> = engine.clone();
    PlaybackController::new(Some(engine), config).expect("valid config")
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock and let tasks react
pub async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

pub async fn wait_for_state(controller: &PlaybackController, expected: PlaybackState) {
    let mut updates = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(600), async {
        while updates.borrow_and_update().state != expected {
            if updates.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("state not reached");
}

/// Markdown-free text of `count` sentences, each `len` chars long
pub fn sentences(count: usize, len: usize) -> String {
    (0..count)
        .map(|i| {
            let mut s = format!("Sentence number {} ", i);
            while s.chars().count() < len - 1 {
                s.push('w');
            }
            s.push('.');
            s
        })
        .collect::<Vec<_>>()
        .join(" ")
}
