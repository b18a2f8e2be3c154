//! Voice readiness tracking
//!
//! Some engines load their voice list lazily and announce it later, some never
//! announce anything. Readiness is polled immediately, re-polled on every
//! voices-changed notification and on a short retry interval while empty, and
//! forced true after a hard timeout so a silent engine still gets a usable
//! button with its default voice.

use crate::speech::engine::SpeechEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};

/// What woke the watcher up
enum Wake {
    HardTimeout,
    Retry,
    Notified,
    NotificationsClosed,
}

/// Timing for the readiness watcher
#[derive(Clone, Copy, Debug)]
pub struct ReadinessTiming {
    /// Readiness is forced true after this long
    pub hard_timeout: Duration,

    /// Re-poll interval while no voices are reported
    pub retry_interval: Duration,
}

/// Watch the engine's voice list, reporting readiness through `report`.
///
/// Returns once readiness can no longer change: it has been forced true and
/// there is no notification channel left, or voices are available and the
/// engine offers no notifications.
pub async fn watch_voices<F>(engine: Arc<dyn SpeechEngine>, timing: ReadinessTiming, mut report: F)
where
    F: FnMut(bool) + Send,
{
    let hard_deadline = Instant::now() + timing.hard_timeout;
    let mut notifications = engine.voices_changed();
    let mut forced = false;

    loop {
        let count = engine.voices().len();
        let ready = count > 0;
        report(ready || forced);

        if (ready || forced) && notifications.is_none() {
            debug!("Voice readiness settled ({} voices, forced: {})", count, forced);
            return;
        }

        let polling = !ready && !forced;
        let has_notifications = notifications.is_some();

        let wake = tokio::select! {
            _ = sleep_until(hard_deadline), if !forced => Wake::HardTimeout,
            _ = sleep(timing.retry_interval), if polling => Wake::Retry,
            result = next_notification(&mut notifications), if has_notifications => match result {
                Err(RecvError::Closed) => Wake::NotificationsClosed,
                _ => Wake::Notified,
            },
        };

        match wake {
            Wake::HardTimeout => {
                if !ready {
                    info!(
                        "No voices after {:?}, using the engine default voice",
                        timing.hard_timeout
                    );
                }
                forced = true;
            }
            Wake::Retry => {}
            Wake::Notified => debug!("Voices changed, re-polling"),
            Wake::NotificationsClosed => notifications = None,
        }
    }
}

async fn next_notification(
    notifications: &mut Option<broadcast::Receiver<()>>,
) -> Result<(), RecvError> {
    match notifications {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
