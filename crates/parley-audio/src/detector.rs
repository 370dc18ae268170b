/// Energy-based speech gate.
///
/// Decides whether a chunk of samples contains speech by comparing its
/// RMS level against an adaptive threshold set during ambient-noise
/// calibration.
#[derive(Debug, Clone)]
pub struct EnergyDetector {
    threshold: i16,
}

/// Fallback threshold used when ambient calibration fails.
pub const DEFAULT_THRESHOLD: i16 = 500;

/// Ambient RMS is scaled by this factor to get the speech threshold.
const AMBIENT_MARGIN: i64 = 4;

impl EnergyDetector {
    pub fn new(threshold: i16) -> Self {
        Self { threshold }
    }

    /// RMS level of a sample chunk.
    pub fn rms(samples: &[i16]) -> i16 {
        if samples.is_empty() {
            return 0;
        }
        let sum: i64 = samples.iter().map(|&s| s as i64 * s as i64).sum();
        ((sum / samples.len() as i64) as f64).sqrt() as i16
    }

    pub fn is_speech(&self, samples: &[i16]) -> bool {
        let rms = Self::rms(samples);
        tracing::trace!(
            "EnergyDetector: RMS={}, threshold={}, samples={}",
            rms,
            self.threshold,
            samples.len()
        );
        rms >= self.threshold
    }

    pub fn threshold(&self) -> i16 {
        self.threshold
    }

    /// Derive a threshold from a measured ambient RMS level, keeping a
    /// floor so a dead-quiet room does not produce a zero threshold.
    pub fn calibrated(ambient_rms: i16) -> Self {
        let threshold = (ambient_rms as i64 * AMBIENT_MARGIN)
            .clamp(DEFAULT_THRESHOLD as i64 / 2, i16::MAX as i64) as i16;
        Self { threshold }
    }
}

impl Default for EnergyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(EnergyDetector::rms(&[0i16; 512]), 0);
        assert_eq!(EnergyDetector::rms(&[]), 0);
    }

    #[test]
    fn rms_of_constant_signal() {
        assert_eq!(EnergyDetector::rms(&[1000i16; 256]), 1000);
        assert_eq!(EnergyDetector::rms(&[-1000i16; 256]), 1000);
    }

    #[test]
    fn speech_gate_uses_threshold() {
        let det = EnergyDetector::new(500);
        assert!(det.is_speech(&[2000i16; 128]));
        assert!(!det.is_speech(&[100i16; 128]));
    }

    #[test]
    fn calibration_scales_ambient_with_floor() {
        let quiet = EnergyDetector::calibrated(10);
        assert_eq!(quiet.threshold(), DEFAULT_THRESHOLD / 2);

        let noisy = EnergyDetector::calibrated(400);
        assert_eq!(noisy.threshold(), 1600);
    }

    #[test]
    fn calibration_never_overflows() {
        let det = EnergyDetector::calibrated(i16::MAX);
        assert_eq!(det.threshold(), i16::MAX);
    }
}
