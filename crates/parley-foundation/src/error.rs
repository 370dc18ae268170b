use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Transcription error: {0}")]
    Stt(#[from] SttError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}

/// Errors from the microphone capture source.
///
/// `Timeout` is the normal idle case (no speech started within the listen
/// window) and is resumed silently; everything else is logged and retried
/// after a short backoff. Nothing here terminates the listen loop.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No speech within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Device not found: {name:?}")]
    DeviceNotFound { name: Option<String> },

    #[error("Device disconnected")]
    DeviceDisconnected,

    #[error("Format not supported: {format}")]
    FormatNotSupported { format: String },

    #[error("CPAL error: {0}")]
    Cpal(#[from] cpal::StreamError),

    #[error("Build stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Play stream error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Supported stream configs error: {0}")]
    SupportedStreamConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("Fatal capture error: {0}")]
    Fatal(String),
}

impl CaptureError {
    /// True when this is the clean "nobody spoke" case rather than a failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CaptureError::Timeout { .. })
    }
}

/// Errors from a speech-to-text backend.
///
/// `UnknownSpeech` means the backend could not map the audio to any text,
/// which is distinct from the service itself being unreachable or broken.
/// Both are recoverable: the utterance is dropped and the loop continues.
#[derive(Error, Debug)]
pub enum SttError {
    #[error("Speech not understood")]
    UnknownSpeech,

    #[error("Transcription service error: {0}")]
    Service(String),
}

/// Errors from invoking the conversational handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}
