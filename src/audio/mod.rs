//! Audio layer — per-speaker capture, in-memory clips, single-slot playback.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → MicRecording buffer → finish() → AudioClip (WAV)
//! Synthesis backend → AudioClip (MP3) → PlaybackSlot (rodio)
//! ```
//!
//! Clips move between stages as raw bytes + MIME type, or as data URIs when
//! a backend expects them inline. No on-device signal processing happens
//! here — audio is shipped to the transcription service as captured.

pub mod clip;
pub mod playback;
pub mod recorder;

pub use clip::{AudioClip, ClipError};
pub use playback::{PlaybackError, PlaybackSlot};
pub use recorder::{ActiveRecording, CaptureError, MicRecorder, Recorder};

// test-only re-export so coordinator tests can use the mock without the
// full `crate::audio::recorder::MockRecorder` path.
#[cfg(test)]
pub use recorder::MockRecorder;
