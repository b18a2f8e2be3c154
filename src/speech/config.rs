//! Configuration for speech playback

use crate::speech::chunker::{MAX_CHUNK_LENGTH, MIN_CHUNK_LENGTH};
use crate::speech::voice::DEFAULT_PREFERRED_VOICES;
use crate::{ListenError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Default pitch applied to every utterance
pub const DEFAULT_PITCH: f32 = 1.25;

/// Default speaking rate applied to every utterance
pub const DEFAULT_RATE: f32 = 1.0;

/// Configuration for the playback controller
///
/// Durations are read from TOML as milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Upper bound for a chunk when a boundary allows it
    pub max_chunk_length: usize,

    /// Minimum chunk length before a flush (final chunk excepted)
    pub min_chunk_length: usize,

    /// How long to wait for the engine to confirm the first utterance started
    #[serde(rename = "processing_timeout_ms", with = "millis")]
    pub processing_timeout: Duration,

    /// After this long voices are treated as ready even if none were reported
    #[serde(rename = "voice_init_timeout_ms", with = "millis")]
    pub voice_init_timeout: Duration,

    /// Re-poll interval while the engine reports no voices
    #[serde(rename = "voice_check_retry_ms", with = "millis")]
    pub voice_check_retry: Duration,

    /// Utterance pitch (engine scale, 1.0 = neutral)
    pub pitch: f32,

    /// Utterance rate (engine scale, 1.0 = normal)
    pub rate: f32,

    /// Ranked voice names or language tags
    pub preferred_voices: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: MAX_CHUNK_LENGTH,
            min_chunk_length: MIN_CHUNK_LENGTH,
            processing_timeout: Duration::from_millis(5000),
            voice_init_timeout: Duration::from_millis(2000),
            voice_check_retry: Duration::from_millis(100),
            pitch: DEFAULT_PITCH,
            rate: DEFAULT_RATE,
            preferred_voices: DEFAULT_PREFERRED_VOICES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl SpeechConfig {
    /// Load a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the chunk length bounds
    pub fn with_chunk_lengths(mut self, max: usize, min: usize) -> Self {
        self.max_chunk_length = max;
        self.min_chunk_length = min;
        self
    }

    /// Set the processing timeout
    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    /// Set the voice readiness timeout
    pub fn with_voice_init_timeout(mut self, timeout: Duration) -> Self {
        self.voice_init_timeout = timeout;
        self
    }

    /// Set the voice preference list
    pub fn with_preferred_voices<I, S>(mut self, voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_voices = voices.into_iter().map(Into::into).collect();
        self
    }

    /// Set pitch and rate
    pub fn with_prosody(mut self, pitch: f32, rate: f32) -> Self {
        self.pitch = pitch;
        self.rate = rate;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_length == 0 {
            return Err(ListenError::ConfigError(
                "max_chunk_length must be greater than zero".into(),
            ));
        }

        if self.min_chunk_length == 0 {
            return Err(ListenError::ConfigError(
                "min_chunk_length must be greater than zero".into(),
            ));
        }

        if self.min_chunk_length > self.max_chunk_length {
            return Err(ListenError::ConfigError(format!(
                "min_chunk_length ({}) exceeds max_chunk_length ({})",
                self.min_chunk_length, self.max_chunk_length
            )));
        }

        if self.processing_timeout.is_zero() || self.voice_init_timeout.is_zero() {
            return Err(ListenError::ConfigError("timeouts must be non-zero".into()));
        }

        if self.voice_check_retry.is_zero() {
            return Err(ListenError::ConfigError(
                "voice_check_retry must be non-zero".into(),
            ));
        }

        if !is_positive(self.pitch) || !is_positive(self.rate) {
            return Err(ListenError::ConfigError(format!(
                "pitch and rate must be positive (pitch {}, rate {})",
                self.pitch, self.rate
            )));
        }

        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
