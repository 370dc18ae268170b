//! Text-to-speech abstraction layer for Parley.
//!
//! Synthesis is synchronous by contract: `speak` blocks until audio
//! output completes. The listen loop relies on that to mute capture for
//! exactly the span of its own speech.

pub mod error;
pub mod types;

pub use error::{TtsError, TtsResult};
pub use types::{TtsConfig, VoiceGender, VoiceInfo};

/// Text-to-speech synthesis interface.
pub trait TextToSpeech: Send {
    /// Synthesize and play `text`, blocking until output completes.
    fn speak(&mut self, text: &str) -> TtsResult<()>;

    /// Voices this backend enumerated at initialization.
    fn voices(&self) -> &[VoiceInfo];

    /// Switch to a voice by identifier.
    fn set_voice(&mut self, voice_id: &str) -> TtsResult<()>;
}

/// Pick a voice from an enumerated list.
///
/// Preference order: the caller-supplied identifier if present among the
/// voices, else the first voice flagged female, else `None` (meaning the
/// backend default). Performed once at initialization.
pub fn select_voice<'a>(voices: &'a [VoiceInfo], preferred: Option<&str>) -> Option<&'a VoiceInfo> {
    if let Some(id) = preferred {
        if let Some(voice) = voices.iter().find(|v| v.id == id) {
            return Some(voice);
        }
        tracing::warn!("Requested voice {:?} not available, falling back", id);
    }
    voices
        .iter()
        .find(|v| matches!(v.gender, Some(VoiceGender::Female)))
}
