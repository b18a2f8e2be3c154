//! Article narration through a text-to-speech engine
//!
//! This module provides:
//! - Markdown stripping for speech input
//! - Chunking of long text at sentence and word boundaries
//! - Ranked voice selection
//! - The playback controller driving an abstract speech engine

pub mod chunker;
pub mod config;
pub mod controller;
pub mod engine;
pub mod readiness;
pub mod sanitize;
pub mod voice;

// Re-export commonly used types
pub use chunker::{split_text_into_chunks, MAX_CHUNK_LENGTH, MIN_CHUNK_LENGTH};
pub use config::SpeechConfig;
pub use controller::{PlaybackController, PlaybackSnapshot, PlaybackState};
pub use engine::{
    EngineError, SpeechEngine, Utterance, UtteranceCallbacks, UtteranceEvent, INTERRUPTED,
};
pub use sanitize::clean_markdown;
pub use voice::{select_voice, Voice, DEFAULT_PREFERRED_VOICES};
