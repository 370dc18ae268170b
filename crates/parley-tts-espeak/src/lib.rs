//! eSpeak TTS backend for Parley.
//!
//! Synthesizes by spawning `espeak` (or `espeak-ng`) and waiting for the
//! process to exit, so playback is synchronous from the caller's point
//! of view. Voice enumeration parses `espeak --voices` output once at
//! initialization.

use std::process::Command;

use parley_tts::{select_voice, TextToSpeech, TtsConfig, TtsError, TtsResult, VoiceGender, VoiceInfo};
use regex::Regex;

mod tests;

pub struct EspeakSynthesizer {
    command: String,
    config: TtsConfig,
    current_voice: Option<String>,
    available_voices: Vec<VoiceInfo>,
}

impl EspeakSynthesizer {
    /// Locate the espeak binary, enumerate voices, and apply the
    /// configured voice selection.
    pub fn new(config: TtsConfig) -> TtsResult<Self> {
        let command = Self::resolve_command().ok_or_else(|| {
            TtsError::EngineNotAvailable(
                "espeak not found. Please install espeak or espeak-ng.".to_string(),
            )
        })?;

        let output = Command::new(&command).arg("--voices").output()?;
        let available_voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(
            "Loaded {} espeak voices via {}",
            available_voices.len(),
            command
        );

        let current_voice = select_voice(&available_voices, config.voice_id.as_deref())
            .map(|v| v.id.clone());
        if let Some(voice) = &current_voice {
            tracing::info!("Selected voice: {}", voice);
        } else {
            tracing::info!("Using espeak default voice");
        }

        Ok(Self {
            command,
            config,
            current_voice,
            available_voices,
        })
    }

    /// Prefer `espeak`, fall back to `espeak-ng`.
    fn resolve_command() -> Option<String> {
        for candidate in ["espeak", "espeak-ng"] {
            if Command::new(candidate)
                .arg("--version")
                .output()
                .is_ok()
            {
                return Some(candidate.to_string());
            }
        }
        None
    }

    fn build_args(&self, text: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(voice_id) = &self.current_voice {
            args.push("-v".to_string());
            args.push(voice_id.clone());
        }

        args.push("-s".to_string());
        args.push(self.config.rate_wpm.to_string());

        // espeak amplitude is 0-200
        let amplitude = ((self.config.volume * 200.0) as u32).min(200);
        args.push("-a".to_string());
        args.push(amplitude.to_string());

        args.push(text.to_string());
        args
    }
}

impl TextToSpeech for EspeakSynthesizer {
    fn speak(&mut self, text: &str) -> TtsResult<()> {
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("Empty text input".to_string()));
        }

        let args = self.build_args(text);
        tracing::debug!("Running espeak synthesis: {} {:?}", self.command, args);

        // No --stdout: espeak plays to the audio device itself and the
        // wait below makes synthesis block until playback completes.
        let output = Command::new(&self.command).args(&args).output()?;
        if !output.status.success() {
            return Err(TtsError::Synthesis(format!(
                "espeak exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn voices(&self) -> &[VoiceInfo] {
        &self.available_voices
    }

    fn set_voice(&mut self, voice_id: &str) -> TtsResult<()> {
        if !self.available_voices.iter().any(|v| v.id == voice_id) {
            return Err(TtsError::VoiceNotFound(voice_id.to_string()));
        }
        self.current_voice = Some(voice_id.to_string());
        Ok(())
    }
}

/// Parse espeak voice list output.
///
/// Format: `Pty Language Age/Gender VoiceName File Other`, e.g.
/// ` 5  en             M  en                 (en 2)`.
fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
    let voice_regex = match Regex::new(r"^\s*(\d+)\s+([\w-]+)\s+([MF\-]?)\s*([\w\-_+]+)\s+") {
        Ok(re) => re,
        Err(e) => {
            tracing::error!("Voice list regex failed to compile: {}", e);
            return Vec::new();
        }
    };

    let mut voices = Vec::new();
    for line in output.lines().skip(1) {
        if let Some(captures) = voice_regex.captures(line) {
            let language = captures.get(2).map_or("unknown", |m| m.as_str()).to_string();
            let gender_char = captures.get(3).map_or("", |m| m.as_str());
            let voice_id = captures.get(4).map_or("unknown", |m| m.as_str()).to_string();

            let gender = match gender_char {
                "M" => Some(VoiceGender::Male),
                "F" => Some(VoiceGender::Female),
                _ => Some(VoiceGender::Unknown),
            };

            voices.push(VoiceInfo {
                id: voice_id.clone(),
                name: format!("{} ({})", language, voice_id),
                language,
                gender,
            });
        }
    }
    voices
}
