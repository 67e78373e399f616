//! Remote service clients — transcription, translation, synthesis.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ TranscriptionClient   TranslationClient   SynthesisClient  │
//! │       (trait)              (trait)             (trait)     │
//! │          │                    │                   │        │
//! │   ScribeClient         ChatTranslator      VoiceSynthesizer│
//! │   multipart POST       chat completions    POST tts/{voice}│
//! └────────────────────────────────────────────────────────────┘
//!            all failures normalize to ServiceError
//! ```
//!
//! Every client is stateless per call, holds its credentials validated at
//! construction time, and honours the shared [`RetryPolicy`] for transient
//! failures only.

pub mod error;
pub mod prompt;
pub mod synthesis;
pub mod transcription;
pub mod translation;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::{retrying, RetryPolicy, ServiceError};
pub use prompt::{soap_note_chat, PromptBuilder};
pub use synthesis::{SynthesisClient, VoiceSynthesizer};
pub use transcription::{ScribeClient, TranscriptionClient};
pub use translation::{ChatTranslator, TranslationClient};
