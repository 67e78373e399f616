//! medbridge — real-time doctor↔patient speech translation.
//!
//! # Architecture
//!
//! ```text
//! MicRecorder ──▶ TurnCoordinator ──▶ ScribeClient (speech→text)
//!                       │                     │
//!                       │   context (last 3) ▼
//!                       ├─────────────▶ ChatTranslator (text→text)
//!                       ▼
//!               ConversationLog ──▶ VoiceSynthesizer ──▶ PlaybackSlot
//!                                         │
//!            InstructionPipeline ─────────┘──▶ WhatsAppGateway
//! ```
//!
//! The [`conversation::TurnCoordinator`] serializes the whole pipeline: at
//! most one speaker is ever being captured or processed, and a turn reaches
//! the log only when both transcription and translation succeeded.
//! [`session::Encounter`] is the surface a UI layer talks to.

pub mod audio;
pub mod config;
pub mod conversation;
pub mod delivery;
pub mod instructions;
pub mod languages;
pub mod notes;
pub mod services;
pub mod session;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use conversation::{Speaker, Turn, TurnCoordinator, TurnError, TurnOutcome, TurnPhase};
pub use session::{Encounter, SessionError};
