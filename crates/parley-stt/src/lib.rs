//! Speech-to-text abstraction layer for Parley.
//!
//! The [`SpeechToText`] trait is the contract the listen loop drives:
//! one utterance in, either text or a classified failure out. A backend
//! that cannot map audio to any text reports `SttError::UnknownSpeech`;
//! a backend that cannot be reached reports `SttError::Service`. Both
//! are recoverable from the loop's point of view.

pub mod scripted;

#[cfg(feature = "http-remote")]
pub mod http;

pub use scripted::ScriptedTranscriber;

#[cfg(feature = "http-remote")]
pub use http::HttpTranscriber;

use parley_audio::Utterance;
use parley_foundation::SttError;

/// Core transcription interface.
///
/// `language` is a BCP-47 tag such as "en-US"; backends that do not
/// support per-request language selection may ignore it.
pub trait SpeechToText: Send {
    fn transcribe(&mut self, utterance: &Utterance, language: &str) -> Result<String, SttError>;
}
