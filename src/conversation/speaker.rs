//! The two conversational roles and their per-speaker state.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// One of exactly two fixed conversation roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Doctor,
    Patient,
}

impl Speaker {
    /// The counterpart role — the listener of this speaker's turns.
    pub fn other(&self) -> Speaker {
        match self {
            Speaker::Doctor => Speaker::Patient,
            Speaker::Patient => Speaker::Doctor,
        }
    }

    /// Display label, also used when rendering transcript lines.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Doctor => "Doctor",
            Speaker::Patient => "Patient",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// SpeakerSlot
// ---------------------------------------------------------------------------

/// Per-speaker mutable state read by the coordinator to resolve the
/// source/target language pair of each turn.
///
/// The language is mutable only while the conversation has zero turns; the
/// coordinator enforces that lock.
#[derive(Debug, Clone)]
pub struct SpeakerSlot {
    /// Language code this speaker talks in (e.g. `"eng"`).
    pub language: String,
}

impl SpeakerSlot {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
