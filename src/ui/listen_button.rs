//! View model for the "listen" button
//!
//! Maps a [`PlaybackSnapshot`] to what the button shows. Rendering itself is
//! left to the host.

use crate::speech::controller::{PlaybackSnapshot, PlaybackState};

/// Icon shown next to the label
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonIcon {
    Play,
    Hourglass,
    Stop,
    Warning,
}

/// What a click does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Call `start` with the article text
    Start,
    /// Call `stop`
    Stop,
}

/// Display data for the listen button
#[derive(Clone, Debug, PartialEq)]
pub struct ListenButtonView {
    pub label: &'static str,
    pub icon: ButtonIcon,
    pub aria_label: &'static str,
    pub tooltip: Option<&'static str>,
    pub enabled: bool,
    pub pressed: bool,
    pub action: ButtonAction,
    /// Alert text rendered below the button
    pub alert: Option<String>,
}

impl ListenButtonView {
    /// Build the view, or `None` when the host has no speech engine and the
    /// button should not be rendered at all.
    pub fn from_snapshot(snapshot: &PlaybackSnapshot, supported: bool) -> Option<Self> {
        if !supported {
            return None;
        }

        let active = snapshot.is_active();
        let show_error =
            snapshot.state == PlaybackState::Error || snapshot.error_message.is_some();
        let ready = snapshot.voices_ready;

        let (label, icon, aria_label) = match snapshot.state {
            PlaybackState::Speaking => ("stop", ButtonIcon::Stop, "Stop reading article"),
            PlaybackState::Processing => (
                "processing...",
                ButtonIcon::Hourglass,
                "Initializing speech synthesis",
            ),
            _ if show_error => ("retry", ButtonIcon::Warning, "Retry reading article"),
            _ => ("listen", ButtonIcon::Play, "Play article narration"),
        };

        let tooltip = if !ready {
            Some("Speech synthesis is loading...")
        } else if show_error {
            Some("Click to retry")
        } else {
            None
        };

        let alert = if show_error {
            snapshot.error_message.clone()
        } else {
            None
        };

        Some(Self {
            label,
            icon,
            aria_label,
            tooltip,
            enabled: ready,
            pressed: active,
            action: if active { ButtonAction::Stop } else { ButtonAction::Start },
            alert,
        })
    }
}
