//! Microphone capture for Parley.
//!
//! The capture source hands out one [`Utterance`] per listen attempt,
//! bounded by a start-of-speech timeout and a maximum phrase duration.
//! The audio device is acquired scoped to each attempt and released on
//! every exit path, so a failed capture never leaks exclusive access
//! to the microphone.

pub mod capture;
pub mod detector;

pub use capture::{AudioSource, Microphone, MicrophoneConfig};
pub use detector::EnergyDetector;

use std::time::Duration;

/// One captured phrase of audio: 16-bit mono PCM.
///
/// Ephemeral by design: produced by a single listen attempt, consumed
/// exactly once by transcription, then dropped. Never persisted.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Utterance {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterance_duration() {
        let u = Utterance {
            samples: vec![0i16; 16_000],
            sample_rate: 16_000,
        };
        assert_eq!(u.duration(), Duration::from_secs(1));
        assert!(!u.is_empty());
    }

    #[test]
    fn empty_utterance_zero_duration() {
        let u = Utterance {
            samples: Vec::new(),
            sample_rate: 0,
        };
        assert_eq!(u.duration(), Duration::ZERO);
        assert!(u.is_empty());
    }
}
