//! Append-only conversation log and the rolling translation context.
//!
//! [`Turn`]s are immutable once committed and ordered by commit time. The
//! log renders the last *n* committed turns as the context string handed
//! verbatim to the translation backend — oldest first, one
//! `"Speaker: original text"` line per turn.

use serde::Serialize;

use super::speaker::Speaker;

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// One committed, translated exchange.
///
/// Created only by the coordinator after both transcription and translation
/// succeed; never mutated, never deleted for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// Monotonic id, unique within the conversation.
    pub id: u64,
    pub speaker: Speaker,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
}

// ---------------------------------------------------------------------------
// ConversationLog
// ---------------------------------------------------------------------------

/// Ordered, append-only sequence of turns owned by one active session.
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a fully-populated turn. This is the only way turns come into
    /// existence, and the coordinator is the only caller.
    pub(crate) fn commit(
        &mut self,
        speaker: Speaker,
        original_text: String,
        translated_text: String,
        source_language: String,
        target_language: String,
    ) -> Turn {
        let turn = Turn {
            id: self.next_id,
            speaker,
            original_text,
            translated_text,
            source_language,
            target_language,
        };
        self.next_id += 1;
        self.turns.push(turn.clone());
        turn
    }

    /// Read-only snapshot of all committed turns, in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Look up a committed turn by id.
    pub fn get(&self, id: u64) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the last `n` turns as translation context, oldest first.
    ///
    /// Returns `None` when the log is empty — the first turn of a
    /// conversation legitimately has no context.
    pub fn context_window(&self, n: usize) -> Option<String> {
        if self.turns.is_empty() || n == 0 {
            return None;
        }
        let start = self.turns.len().saturating_sub(n);
        let lines: Vec<String> = self.turns[start..]
            .iter()
            .map(|t| format!("{}: {}", t.speaker, t.original_text))
            .collect();
        Some(lines.join("\n"))
    }

    /// Full transcript of original texts, used for SOAP-note generation.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker, t.original_text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
