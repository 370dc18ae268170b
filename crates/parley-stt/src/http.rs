//! HTTP-remote transcription backend.
//!
//! Posts each utterance as a 16-bit WAV file to a Whisper-style
//! transcription endpoint and expects a JSON body with a `text` field.
//! Transport and server failures are `SttError::Service`; an empty
//! transcript is `SttError::UnknownSpeech`.

use std::io::Cursor;
use std::time::Duration;

use parley_audio::Utterance;
use parley_foundation::SttError;

use crate::SpeechToText;

#[derive(serde::Deserialize)]
struct TranscriptResponse {
    text: String,
}

pub struct HttpTranscriber {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTranscriber {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SttError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SttError::Service(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl SpeechToText for HttpTranscriber {
    fn transcribe(&mut self, utterance: &Utterance, language: &str) -> Result<String, SttError> {
        let wav = encode_wav(&utterance.samples, utterance.sample_rate)
            .map_err(|e| SttError::Service(format!("WAV encoding failed: {}", e)))?;
        tracing::debug!(
            "Posting {} bytes of audio to {} (language {})",
            wav.len(),
            self.endpoint,
            language
        );

        let part = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Service(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("language", language.to_string());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| SttError::Service(format!("Transcription request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(SttError::Service(format!(
                "Transcription service returned {}",
                response.status()
            )));
        }

        let body: TranscriptResponse = response
            .json()
            .map_err(|e| SttError::Service(format!("Malformed transcription response: {}", e)))?;

        let text = body.text.trim().to_string();
        if text.is_empty() {
            return Err(SttError::UnknownSpeech);
        }
        Ok(text)
    }
}

/// Encode mono PCM samples as an in-memory 16-bit WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_produces_riff_header() {
        let wav = encode_wav(&[0i16; 160], 16_000).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus two bytes per sample
        assert_eq!(wav.len(), 44 + 160 * 2);
    }

    #[test]
    fn builder_accepts_api_key() {
        let stt = HttpTranscriber::new("http://localhost:9000/transcribe")
            .unwrap()
            .with_api_key("secret");
        assert_eq!(stt.api_key.as_deref(), Some("secret"));
    }
}
