//! Scripted transcriber for tests and backend-free pipelines.

use std::collections::VecDeque;

use parley_audio::Utterance;
use parley_foundation::SttError;

use crate::SpeechToText;

/// Returns a queue of canned results, one per transcribe call.
///
/// Once the queue is exhausted every further call reports
/// `UnknownSpeech`, mimicking a backend that hears only silence.
#[derive(Debug, Default)]
pub struct ScriptedTranscriber {
    results: VecDeque<Result<String, SttError>>,
    calls: usize,
    last_language: Option<String>,
}

impl ScriptedTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let mut s = Self::new();
        s.push_text(text);
        s
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.results.push_back(Ok(text.into()));
    }

    pub fn push_error(&mut self, err: SttError) {
        self.results.push_back(Err(err));
    }

    /// Number of transcribe calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Language tag seen on the most recent call.
    pub fn last_language(&self) -> Option<&str> {
        self.last_language.as_deref()
    }
}

impl SpeechToText for ScriptedTranscriber {
    fn transcribe(&mut self, _utterance: &Utterance, language: &str) -> Result<String, SttError> {
        self.calls += 1;
        self.last_language = Some(language.to_string());
        self.results.pop_front().unwrap_or(Err(SttError::UnknownSpeech))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance() -> Utterance {
        Utterance {
            samples: vec![0i16; 160],
            sample_rate: 16_000,
        }
    }

    #[test]
    fn pops_results_in_order() {
        let mut stt = ScriptedTranscriber::new();
        stt.push_text("first");
        stt.push_error(SttError::Service("down".into()));
        stt.push_text("second");

        assert_eq!(stt.transcribe(&utterance(), "en-US").unwrap(), "first");
        assert!(matches!(
            stt.transcribe(&utterance(), "en-US"),
            Err(SttError::Service(_))
        ));
        assert_eq!(stt.transcribe(&utterance(), "en-US").unwrap(), "second");
        assert_eq!(stt.calls(), 3);
    }

    #[test]
    fn exhausted_queue_is_unknown_speech() {
        let mut stt = ScriptedTranscriber::new();
        assert!(matches!(
            stt.transcribe(&utterance(), "en-US"),
            Err(SttError::UnknownSpeech)
        ));
    }

    #[test]
    fn records_language_tag() {
        let mut stt = ScriptedTranscriber::with_text("hi");
        let _ = stt.transcribe(&utterance(), "de-DE");
        assert_eq!(stt.last_language(), Some("de-DE"));
    }
}
