//! Error types for TTS functionality

use thiserror::Error;

/// TTS error types.
///
/// Synthesis failures are caught and logged by the listen loop, never
/// propagated out of it; the spoken response is lost but the loop
/// continues.
#[derive(Error, Debug)]
pub enum TtsError {
    /// Engine is not available or not installed
    #[error("TTS engine not available: {0}")]
    EngineNotAvailable(String),

    /// Voice not found or not supported
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// Invalid text input
    #[error("Invalid text input: {0}")]
    InvalidInput(String),

    /// IO error (process spawning, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for TTS operations
pub type TtsResult<T> = Result<T, TtsError>;
