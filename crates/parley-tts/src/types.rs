//! Core types for text-to-speech functionality

use serde::{Deserialize, Serialize};

/// TTS synthesis configuration, applied once at engine initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Voice to select; `None` lets the heuristic pick.
    pub voice_id: Option<String>,
    /// Speaking rate (words per minute, typically 100-300).
    pub rate_wpm: u32,
    /// Volume (0.0-1.0).
    pub volume: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice_id: None,
            rate_wpm: 180,
            volume: 0.8,
        }
    }
}

/// Voice information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Unique voice identifier
    pub id: String,
    /// Human-readable voice name
    pub name: String,
    /// Language code (e.g., "en-US", "fr-FR")
    pub language: String,
    /// Gender (if available)
    pub gender: Option<VoiceGender>,
}

/// Voice gender categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    Male,
    Female,
    Unknown,
}
