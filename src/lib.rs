pub mod hero;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListenError {
    #[error("No content to read")]
    EmptyInput,

    #[error("Speech synthesis not supported")]
    EngineUnsupported,

    #[error("Speech synthesis initialization timeout")]
    InitializationTimeout,

    #[error("Playback error at chunk {chunk_index}: {code}")]
    PlaybackError { chunk_index: usize, code: String },

    #[error("Failed to submit utterance: {0}")]
    SubmissionFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<serde_json::Error> for ListenError {
    fn from(e: serde_json::Error) -> Self {
        ListenError::StorageError(e.to_string())
    }
}

impl From<toml::de::Error> for ListenError {
    fn from(e: toml::de::Error) -> Self {
        ListenError::ConfigError(e.to_string())
    }
}

impl ListenError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Nothing to speak until the caller supplies text
            ListenError::EmptyInput => true,
            // The host has no speech capability at all
            ListenError::EngineUnsupported => false,
            // Retrying the same start call is enough
            ListenError::InitializationTimeout => true,
            ListenError::PlaybackError { .. } => true,
            ListenError::SubmissionFailure(_) => true,
            ListenError::ConfigError(_) => false,
            ListenError::StorageError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ListenError::EmptyInput => "No content to read".to_string(),
            ListenError::EngineUnsupported => "Speech synthesis not supported".to_string(),
            ListenError::InitializationTimeout => {
                "Speech synthesis initialization timeout. Please try again.".to_string()
            }
            ListenError::PlaybackError { chunk_index, code } => {
                format!("Error at part {}: {}. Try again.", chunk_index + 1, code)
            }
            ListenError::SubmissionFailure(_) => {
                "Failed to start speech. Please try again.".to_string()
            }
            ListenError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ListenError::StorageError(_) => "Saved state could not be read.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ListenError>;
