use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detector::EnergyDetector;
use crate::Utterance;
use parley_foundation::CaptureError;

/// A source of utterances.
///
/// One call to `listen` yields at most one utterance: it waits up to
/// `timeout` for speech to start, then records until trailing silence or
/// `max_phrase` elapses. A clean no-speech window is
/// `CaptureError::Timeout`, distinct from real failures.
pub trait AudioSource: Send {
    fn listen(
        &mut self,
        timeout: Duration,
        max_phrase: Duration,
    ) -> Result<Utterance, CaptureError>;
}

#[derive(Debug, Clone)]
pub struct MicrophoneConfig {
    /// Input device name; `None` selects the host default.
    pub device: Option<String>,
    /// Ambient sampling window for one-time calibration.
    pub calibration_window: Duration,
    /// Silence run that ends a phrase once speech has started.
    pub trailing_silence: Duration,
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            device: None,
            calibration_window: Duration::from_secs(2),
            trailing_silence: Duration::from_millis(700),
        }
    }
}

/// Microphone capture source backed by cpal.
///
/// The audio device is opened scoped to each `listen` call: the stream is
/// a local that drops on every exit path, so exclusive device access is
/// never leaked across loop iterations.
pub struct Microphone {
    config: MicrophoneConfig,
    detector: EnergyDetector,
}

impl Microphone {
    /// Create a microphone source and perform one-time ambient-noise
    /// calibration. Calibration failure is logged and the default energy
    /// threshold is kept; it never blocks operation.
    pub fn new(config: MicrophoneConfig) -> Self {
        let mut mic = Self {
            config,
            detector: EnergyDetector::default(),
        };
        match mic.measure_ambient() {
            Ok(ambient_rms) => {
                mic.detector = EnergyDetector::calibrated(ambient_rms);
                tracing::info!(
                    "Ambient calibration: RMS={}, speech threshold={}",
                    ambient_rms,
                    mic.detector.threshold()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Ambient calibration failed, using default threshold {}: {}",
                    mic.detector.threshold(),
                    e
                );
            }
        }
        mic
    }

    pub fn threshold(&self) -> i16 {
        self.detector.threshold()
    }

    fn open_device(&self) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        match &self.config.device {
            Some(name) => host
                .input_devices()
                .map_err(|e| CaptureError::Fatal(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound {
                    name: Some(name.clone()),
                }),
            None => host
                .default_input_device()
                .ok_or(CaptureError::DeviceNotFound { name: None }),
        }
    }

    fn open_session(&self) -> Result<CaptureSession, CaptureError> {
        let device = self.open_device()?;
        if let Ok(name) = device.name() {
            tracing::debug!("Opening input device: {}", name);
        }

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::FormatNotSupported {
                format: format!("no default input config: {}", e),
            })?;
        let sample_format = supported.sample_format();
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        let failed = Arc::new(AtomicBool::new(false));
        let stream = build_input_stream(
            &device,
            &config,
            sample_format,
            tx,
            Arc::clone(&failed),
        )?;
        stream.play()?;

        Ok(CaptureSession {
            _stream: stream,
            rx,
            failed,
            sample_rate: config.sample_rate.0,
        })
    }

    fn measure_ambient(&self) -> Result<i16, CaptureError> {
        let session = self.open_session()?;
        let deadline = Instant::now() + self.config.calibration_window;
        let mut samples: Vec<i16> = Vec::new();

        while Instant::now() < deadline {
            match session.rx.recv_timeout(Duration::from_millis(50)) {
                Ok(chunk) => samples.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::DeviceDisconnected)
                }
            }
        }

        if samples.is_empty() {
            return Err(CaptureError::Fatal(
                "No ambient audio captured during calibration".to_string(),
            ));
        }
        Ok(EnergyDetector::rms(&samples))
    }
}

impl AudioSource for Microphone {
    fn listen(
        &mut self,
        timeout: Duration,
        max_phrase: Duration,
    ) -> Result<Utterance, CaptureError> {
        let session = self.open_session()?;
        let attempt_start = Instant::now();
        let mut samples: Vec<i16> = Vec::new();
        let mut speech_start: Option<Instant> = None;
        let mut last_voiced = Instant::now();

        loop {
            if session.failed.load(Ordering::Relaxed) {
                return Err(CaptureError::Fatal("Input stream errored".to_string()));
            }

            match session.rx.recv_timeout(Duration::from_millis(50)) {
                Ok(chunk) => {
                    let voiced = self.detector.is_speech(&chunk);
                    match speech_start {
                        None => {
                            if voiced {
                                tracing::debug!("Speech started");
                                speech_start = Some(Instant::now());
                                last_voiced = Instant::now();
                                samples.extend_from_slice(&chunk);
                            } else if attempt_start.elapsed() >= timeout {
                                return Err(CaptureError::Timeout { timeout });
                            }
                        }
                        Some(start) => {
                            samples.extend_from_slice(&chunk);
                            if voiced {
                                last_voiced = Instant::now();
                            }
                            if last_voiced.elapsed() >= self.config.trailing_silence
                                || start.elapsed() >= max_phrase
                            {
                                tracing::debug!(
                                    "Phrase complete: {} samples, {:?}",
                                    samples.len(),
                                    start.elapsed()
                                );
                                return Ok(Utterance {
                                    samples,
                                    sample_rate: session.sample_rate,
                                });
                            }
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => match speech_start {
                    None if attempt_start.elapsed() >= timeout => {
                        return Err(CaptureError::Timeout { timeout });
                    }
                    Some(start)
                        if last_voiced.elapsed() >= self.config.trailing_silence
                            || start.elapsed() >= max_phrase =>
                    {
                        return Ok(Utterance {
                            samples,
                            sample_rate: session.sample_rate,
                        });
                    }
                    _ => {}
                },
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::DeviceDisconnected);
                }
            }
        }
    }
}

/// Device acquisition scoped to one listen attempt. Dropping the session
/// drops the stream and releases the device.
struct CaptureSession {
    _stream: Stream,
    rx: Receiver<Vec<i16>>,
    failed: Arc<AtomicBool>,
    sample_rate: u32,
}

fn build_input_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    tx: Sender<Vec<i16>>,
    failed: Arc<AtomicBool>,
) -> Result<Stream, CaptureError> {
    let channels = config.channels;

    let err_fn = move |err: cpal::StreamError| {
        tracing::error!("Audio stream error: {}", err);
        failed.store(true, Ordering::SeqCst);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &_| {
                let _ = tx.send(downmix(data, channels));
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &_| {
                // Clamp [-1.0, 1.0] and scale to i16
                let converted: Vec<i16> = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
                    .collect();
                let _ = tx.send(downmix(&converted, channels));
            },
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &_| {
                // Convert unsigned [0,65535] to signed [-32768,32767]
                let converted: Vec<i16> =
                    data.iter().map(|&s| (s as i32 - 32768) as i16).collect();
                let _ = tx.send(downmix(&converted, channels));
            },
            err_fn,
            None,
        )?,
        other => {
            return Err(CaptureError::FormatNotSupported {
                format: format!("{:?}", other),
            });
        }
    };

    Ok(stream)
}

/// Average interleaved frames down to mono.
fn downmix(data: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return data.to_vec();
    }
    let channels = channels as usize;
    data.chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}
