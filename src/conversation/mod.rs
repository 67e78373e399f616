//! Conversation core — roles, the append-only log, and the turn
//! coordinator that serializes the two-speaker pipeline.
//!
//! # Data flow
//!
//! ```text
//! Recorder ──▶ TurnCoordinator ──▶ TranscriptionClient
//!                    │                       │
//!                    │    context (last 3)   ▼
//!                    ├──────────────▶ TranslationClient
//!                    ▼
//!             ConversationLog (turn committed)
//! ```

pub mod coordinator;
pub mod log;
pub mod speaker;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use coordinator::{TurnCoordinator, TurnError, TurnOutcome, TurnPhase};
pub use log::{ConversationLog, Turn};
pub use speaker::{Speaker, SpeakerSlot};
