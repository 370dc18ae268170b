//! The composition root: microphone, transcription, synthesis, and the
//! listen loop behind a start/stop/toggle/speak surface.

use std::sync::Arc;
use std::time::Duration;

use parley_audio::{AudioSource, Microphone, MicrophoneConfig};
use parley_foundation::{AppError, RunState};
use parley_stt::SpeechToText;
use parley_tts::TextToSpeech;

use crate::handler::Handler;
use crate::listen_loop::{ListenLoop, ListenLoopConfig};

/// Everything an embedding application needs: `start()`, `stop()`,
/// `toggle_listening()`, `speak()`.
pub struct VoiceAssistant {
    listen_loop: ListenLoop,
}

impl VoiceAssistant {
    pub fn builder() -> VoiceAssistantBuilder {
        VoiceAssistantBuilder::new()
    }

    pub fn start(&mut self) -> Result<(), AppError> {
        self.listen_loop.start()
    }

    pub fn stop(&mut self) {
        self.listen_loop.stop();
    }

    pub fn toggle_listening(&self) -> bool {
        self.listen_loop.toggle()
    }

    pub fn speak(&self, text: &str) {
        self.listen_loop.speak(text);
    }

    pub fn is_listening(&self) -> bool {
        self.listen_loop.is_listening()
    }

    pub fn state(&self) -> RunState {
        self.listen_loop.state()
    }
}

pub struct VoiceAssistantBuilder {
    cfg: ListenLoopConfig,
    mic: MicrophoneConfig,
    source: Option<Box<dyn AudioSource>>,
    stt: Option<Box<dyn SpeechToText>>,
    tts: Option<Box<dyn TextToSpeech>>,
    handler: Option<Arc<dyn Handler>>,
}

impl Default for VoiceAssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceAssistantBuilder {
    pub fn new() -> Self {
        Self {
            cfg: ListenLoopConfig::default(),
            mic: MicrophoneConfig::default(),
            source: None,
            stt: None,
            tts: None,
            handler: None,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.cfg.language = language.into();
        self
    }

    pub fn auto_restart(mut self, auto_restart: bool) -> Self {
        self.cfg.auto_restart = auto_restart;
        self
    }

    pub fn handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.cfg.handler_timeout = timeout;
        self
    }

    pub fn listen_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.listen_timeout = timeout;
        self
    }

    pub fn max_phrase(mut self, max_phrase: Duration) -> Self {
        self.cfg.max_phrase = max_phrase;
        self
    }

    /// Input device name for the default microphone source.
    pub fn device(mut self, device: Option<String>) -> Self {
        self.mic.device = device;
        self
    }

    /// Replace the microphone with a custom capture source.
    pub fn source(mut self, source: Box<dyn AudioSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn transcriber(mut self, stt: Box<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn synthesizer(mut self, tts: Box<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<VoiceAssistant, AppError> {
        let stt = self
            .stt
            .ok_or_else(|| AppError::Config("No transcriber configured".to_string()))?;
        let tts = self
            .tts
            .ok_or_else(|| AppError::Config("No synthesizer configured".to_string()))?;
        let handler = self
            .handler
            .ok_or_else(|| AppError::Config("No handler configured".to_string()))?;
        let source = self
            .source
            .unwrap_or_else(|| Box::new(Microphone::new(self.mic)));

        Ok(VoiceAssistant {
            listen_loop: ListenLoop::new(source, stt, tts, handler, self.cfg),
        })
    }
}
