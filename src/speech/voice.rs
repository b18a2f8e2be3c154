//! Voice identities and ranked voice selection

use serde::{Deserialize, Serialize};

/// Ranked voice preferences: UK voices first, then US, then bare language tags
pub const DEFAULT_PREFERRED_VOICES: &[&str] = &[
    "Microsoft Sonia Online (Natural) - English (United Kingdom)",
    "Google UK English Female",
    "Google UK English",
    "Google US English Female",
    "Google US English",
    "Microsoft Zira - English (United States)",
    "en-US",
    "en_US",
    "English (United States)",
    "English US",
    "enUS",
];

/// An engine-provided voice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voice {
    /// Display name reported by the engine
    pub name: String,

    /// BCP 47 style language tag, e.g. `en-GB`
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Pick the best voice from `available`.
///
/// Each preference is tried in order against voice name or language tag; the
/// first hit wins. Without a hit, the first `en-us*` voice is used, then the
/// first available voice.
pub fn select_voice<'a, S: AsRef<str>>(
    available: &'a [Voice],
    preferences: &[S],
) -> Option<&'a Voice> {
    for pref in preferences {
        let pref = pref.as_ref();
        if let Some(voice) = available.iter().find(|v| v.name == pref || v.lang == pref) {
            return Some(voice);
        }
    }

    available
        .iter()
        .find(|v| v.lang.to_lowercase().starts_with("en-us"))
        .or_else(|| available.first())
}
