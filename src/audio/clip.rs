//! In-memory audio payloads.
//!
//! [`AudioClip`] is the content-bearing handle passed between capture,
//! synthesis, playback and delivery — raw bytes plus a MIME type, never
//! touching durable storage. Data-URI encoding is the interchange format
//! the backends speak (`data:<mime>;base64,<payload>`).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// A single utterance or synthesized voice note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Encoded audio bytes (WAV from capture, typically MP3 from synthesis).
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. `"audio/wav"`, `"audio/mpeg"`).
    pub mime_type: String,
}

/// Errors from data-URI decoding.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("not a data URI: missing 'data:' prefix")]
    NotADataUri,

    #[error("malformed data URI: missing ';base64,' separator")]
    MissingSeparator,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl AudioClip {
    /// Wrap raw bytes with their MIME type.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// `true` when the clip carries no audio at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode as `data:<mime>;base64,<payload>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    /// Decode a `data:<mime>;base64,<payload>` string.
    pub fn from_data_uri(uri: &str) -> Result<Self, ClipError> {
        let rest = uri.strip_prefix("data:").ok_or(ClipError::NotADataUri)?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or(ClipError::MissingSeparator)?;
        Ok(Self {
            bytes: BASE64.decode(payload)?,
            mime_type: mime.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_round_trip() {
        let clip = AudioClip::new(vec![0x49, 0x44, 0x33, 0x04], "audio/mpeg");
        let uri = clip.to_data_uri();
        assert!(uri.starts_with("data:audio/mpeg;base64,"));

        let decoded = AudioClip::from_data_uri(&uri).unwrap();
        assert_eq!(decoded, clip);
    }

    #[test]
    fn empty_clip_is_empty() {
        assert!(AudioClip::new(Vec::new(), "audio/wav").is_empty());
        assert!(!AudioClip::new(vec![0u8; 4], "audio/wav").is_empty());
    }

    #[test]
    fn rejects_non_data_uri() {
        let err = AudioClip::from_data_uri("https://example.com/a.mp3").unwrap_err();
        assert!(matches!(err, ClipError::NotADataUri));
    }

    #[test]
    fn rejects_missing_base64_marker() {
        let err = AudioClip::from_data_uri("data:audio/mpeg,abcd").unwrap_err();
        assert!(matches!(err, ClipError::MissingSeparator));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = AudioClip::from_data_uri("data:audio/mpeg;base64,!!!").unwrap_err();
        assert!(matches!(err, ClipError::Base64(_)));
    }
}
