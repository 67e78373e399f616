//! Microphone capture via `cpal`.
//!
//! [`Recorder::begin`] acquires the capture device and starts buffering;
//! [`ActiveRecording::finish`] consumes the handle and yields exactly one
//! [`AudioClip`] per begin/finish pair. Dropping the handle without calling
//! `finish` abandons the utterance and releases the device — that is the
//! cancellation path for session teardown.
//!
//! [`MicRecorder`] is the production implementation. The cpal stream is not
//! `Send`, so it lives on a dedicated capture thread; samples cross over a
//! shared buffer and the handle only carries the stop flag.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::audio::clip::AudioClip;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Capture-device failures surfaced at `begin()`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("capture thread exited before reporting readiness")]
    Worker,
}

// ---------------------------------------------------------------------------
// Recorder / ActiveRecording traits
// ---------------------------------------------------------------------------

/// Owns one capture device resource per speaker.
///
/// Device acquisition is exclusive at the OS level; this trait does not
/// arbitrate between the two speakers' recorders.
pub trait Recorder: Send + Sync {
    /// Acquire the device and begin buffering one utterance.
    ///
    /// On failure (device missing, permission denied) the caller must
    /// surface a device-access error and stay idle.
    fn begin(&self) -> Result<Box<dyn ActiveRecording>, CaptureError>;
}

/// A single in-progress utterance.
///
/// `finish` consumes the handle, so a recording can resolve at most once.
pub trait ActiveRecording: Send {
    /// Stop capturing, release the device and return the buffered audio.
    ///
    /// An utterance with no captured samples yields an empty clip — callers
    /// branch on [`AudioClip::is_empty`] for the "no speech" case.
    fn finish(self: Box<Self>) -> AudioClip;
}

// ---------------------------------------------------------------------------
// MicRecorder
// ---------------------------------------------------------------------------

/// Production recorder over the system default input device.
///
/// # Example
/// ```rust,no_run
/// use medbridge::audio::{MicRecorder, Recorder};
///
/// let recorder = MicRecorder::new();
/// let active = recorder.begin().expect("microphone unavailable");
/// // … speaker talks …
/// let clip = active.finish();
/// assert_eq!(clip.mime_type, "audio/wav");
/// ```
pub struct MicRecorder;

impl MicRecorder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for MicRecorder {
    fn begin(&self) -> Result<Box<dyn ActiveRecording>, CaptureError> {
        let samples: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, u16), CaptureError>>();

        let sink = Arc::clone(&samples);
        let stop_flag = Arc::clone(&stop);

        std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let built = (|| -> Result<(cpal::Stream, u32, u16), CaptureError> {
                    let host = cpal::default_host();
                    let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
                    let supported = device.default_input_config()?;

                    let channels = supported.channels();
                    let sample_rate = supported.sample_rate().0;
                    let config: cpal::StreamConfig = supported.into();

                    let stream = device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            if let Ok(mut buf) = sink.lock() {
                                buf.extend_from_slice(data);
                            }
                        },
                        |err: cpal::StreamError| {
                            log::error!("capture stream error: {err}");
                        },
                        None,
                    )?;

                    stream.play()?;
                    Ok((stream, sample_rate, channels))
                })();

                match built {
                    Ok((stream, sample_rate, channels)) => {
                        let _ = ready_tx.send(Ok((sample_rate, channels)));
                        while !stop_flag.load(Ordering::Acquire) {
                            std::thread::sleep(Duration::from_millis(20));
                        }
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|_| CaptureError::Worker)?;

        let (sample_rate, channels) = ready_rx.recv().map_err(|_| CaptureError::Worker)??;

        Ok(Box::new(MicRecording {
            samples,
            stop,
            sample_rate,
            channels,
        }))
    }
}

// ---------------------------------------------------------------------------
// MicRecording
// ---------------------------------------------------------------------------

struct MicRecording {
    samples: Arc<Mutex<Vec<f32>>>,
    stop: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl ActiveRecording for MicRecording {
    fn finish(self: Box<Self>) -> AudioClip {
        self.stop.store(true, Ordering::Release);
        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        encode_wav(&samples, self.sample_rate, self.channels)
    }
}

impl Drop for MicRecording {
    fn drop(&mut self) {
        // Releases the capture thread whether or not finish() ran.
        self.stop.store(true, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// WAV encoding
// ---------------------------------------------------------------------------

/// Encode interleaved f32 samples as 16-bit PCM WAV at the device's native
/// rate and channel count. The transcription backend accepts any common
/// container, so no resampling or downmixing happens on-device.
fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> AudioClip {
    if samples.is_empty() {
        return AudioClip::new(Vec::new(), "audio/wav");
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .expect("WAV header write to an in-memory cursor cannot fail");
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            // In-memory writes cannot fail.
            let _ = writer.write_sample(v);
        }
        let _ = writer.finalize();
    }

    AudioClip::new(cursor.into_inner(), "audio/wav")
}

// ---------------------------------------------------------------------------
// MockRecorder  (test-only)
// ---------------------------------------------------------------------------

/// Test double that yields a pre-configured clip, or fails at `begin`.
#[cfg(test)]
pub struct MockRecorder {
    outcome: Result<AudioClip, ()>,
}

#[cfg(test)]
impl MockRecorder {
    /// A recorder whose recording finishes with `clip`.
    pub fn yielding(clip: AudioClip) -> Self {
        Self { outcome: Ok(clip) }
    }

    /// A recorder that fails at `begin` with a device-access error.
    pub fn unavailable() -> Self {
        Self { outcome: Err(()) }
    }
}

#[cfg(test)]
impl Recorder for MockRecorder {
    fn begin(&self) -> Result<Box<dyn ActiveRecording>, CaptureError> {
        match &self.outcome {
            Ok(clip) => Ok(Box::new(MockRecording { clip: clip.clone() })),
            Err(()) => Err(CaptureError::NoDevice),
        }
    }
}

#[cfg(test)]
struct MockRecording {
    clip: AudioClip,
}

#[cfg(test)]
impl ActiveRecording for MockRecording {
    fn finish(self: Box<Self>) -> AudioClip {
        self.clip
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_samples_encode_to_empty_clip() {
        let clip = encode_wav(&[], 48_000, 2);
        assert!(clip.is_empty());
        assert_eq!(clip.mime_type, "audio/wav");
    }

    #[test]
    fn encoded_wav_carries_riff_header() {
        let clip = encode_wav(&vec![0.1f32; 1_024], 16_000, 1);
        assert!(!clip.is_empty());
        assert_eq!(&clip.bytes[..4], b"RIFF");
        assert_eq!(&clip.bytes[8..12], b"WAVE");
    }

    #[test]
    fn samples_are_clamped_before_conversion() {
        // Out-of-range floats must not wrap around when cast to i16.
        let clip = encode_wav(&[2.0, -2.0], 16_000, 1);
        let data = &clip.bytes[44..]; // past the canonical 44-byte header
        let first = i16::from_le_bytes([data[0], data[1]]);
        let second = i16::from_le_bytes([data[2], data[3]]);
        assert_eq!(first, i16::MAX);
        assert_eq!(second, -i16::MAX);
    }

    #[test]
    fn mock_recorder_yields_configured_clip() {
        let clip = AudioClip::new(vec![1, 2, 3], "audio/wav");
        let recorder = MockRecorder::yielding(clip.clone());
        let active = recorder.begin().unwrap();
        assert_eq!(active.finish(), clip);
    }

    #[test]
    fn unavailable_mock_fails_at_begin() {
        let recorder = MockRecorder::unavailable();
        assert!(matches!(recorder.begin(), Err(CaptureError::NoDevice)));
    }

    #[test]
    fn recorder_trait_is_object_safe() {
        let recorder: Box<dyn Recorder> = Box::new(MockRecorder::unavailable());
        let _ = recorder.begin();
    }
}
