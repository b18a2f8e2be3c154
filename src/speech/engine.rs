//! Speech engine capability
//!
//! The host provides the actual synthesizer (a browser speech API, a native
//! TTS service, a test double). The controller only talks to it through
//! [`SpeechEngine`], and the engine reports per-utterance progress through the
//! [`UtteranceCallbacks`] handed over with each utterance.

use crate::speech::voice::Voice;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// Error code engines report when an utterance is cut short by `cancel`
pub const INTERRUPTED: &str = "interrupted";

/// Errors an engine may raise synchronously when handed an utterance
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Utterance rejected: {0}")]
    Rejected(String),

    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

/// One chunk bound to a voice and prosody, ready for the engine
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    /// Unique id of this utterance
    pub id: Uuid,

    /// Text to speak
    pub text: String,

    /// Selected voice, `None` to let the engine use its default
    pub voice: Option<Voice>,

    pub pitch: f32,

    pub rate: f32,

    /// Position of the chunk within its session
    pub chunk_index: usize,
}

/// Progress reported by the engine for a single utterance
#[derive(Clone, Debug, PartialEq)]
pub enum UtteranceEvent {
    /// Audio output began
    Started,

    /// The utterance finished playing
    Ended,

    /// The engine failed or interrupted the utterance
    Error(String),
}

/// Callback sink for one utterance
///
/// Reports after the controller has stopped listening are dropped silently.
#[derive(Clone, Debug)]
pub struct UtteranceCallbacks {
    utterance_id: Uuid,
    event_tx: mpsc::UnboundedSender<UtteranceEvent>,
}

impl UtteranceCallbacks {
    /// Create a callback sink and the receiver the controller listens on
    pub fn channel(utterance_id: Uuid) -> (Self, mpsc::UnboundedReceiver<UtteranceEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                utterance_id,
                event_tx,
            },
            event_rx,
        )
    }

    /// Id of the utterance these callbacks belong to
    pub fn utterance_id(&self) -> Uuid {
        self.utterance_id
    }

    pub fn on_start(&self) {
        let _ = self.event_tx.send(UtteranceEvent::Started);
    }

    pub fn on_end(&self) {
        let _ = self.event_tx.send(UtteranceEvent::Ended);
    }

    pub fn on_error(&self, code: impl Into<String>) {
        let _ = self.event_tx.send(UtteranceEvent::Error(code.into()));
    }

    /// Whether the controller still listens to this utterance
    pub fn is_active(&self) -> bool {
        !self.event_tx.is_closed()
    }
}

/// Host-provided text-to-speech capability
pub trait SpeechEngine: Send + Sync {
    /// Voices currently available. Engines that fail to list voices return
    /// an empty list.
    fn voices(&self) -> Vec<Voice>;

    /// Queue an utterance. Progress is reported through `callbacks`.
    fn speak(&self, utterance: Utterance, callbacks: UtteranceCallbacks) -> Result<(), EngineError>;

    /// Stop current speech and drop anything queued
    fn cancel(&self);

    /// Whether audio is being produced right now
    fn is_speaking(&self) -> bool;

    /// Notification channel fired when the voice list changes.
    ///
    /// Engines without such a notification return `None`.
    fn voices_changed(&self) -> Option<broadcast::Receiver<()>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_callbacks_deliver_in_order() {
        let (callbacks, mut rx) = UtteranceCallbacks::channel(Uuid::new_v4());
        callbacks.on_start();
        callbacks.on_error("network");
        callbacks.on_end();

        assert_eq!(rx.recv().await, Some(UtteranceEvent::Started));
        assert_eq!(rx.recv().await, Some(UtteranceEvent::Error("network".to_string())));
        assert_eq!(rx.recv().await, Some(UtteranceEvent::Ended));
    }

    #[test]
    fn test_callbacks_after_receiver_dropped_are_ignored() {
        let (callbacks, rx) = UtteranceCallbacks::channel(Uuid::new_v4());
        assert!(callbacks.is_active());
        drop(rx);
        assert!(!callbacks.is_active());
        callbacks.on_end();
    }
}
