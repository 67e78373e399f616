//! SOAP note generation from the conversation transcript.
//!
//! The note is produced by the chat-completions backend as a strict JSON
//! object and parsed mechanically. Persistence is out of scope here — the
//! note is returned as plain data for whatever storage layer wants it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::services::translation::ChatTranslator;
use crate::services::{soap_note_chat, ServiceError};

// ---------------------------------------------------------------------------
// SoapNote
// ---------------------------------------------------------------------------

/// A structured clinical note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNote {
    /// The patient's complaints and history of present illness.
    pub subjective: String,
    /// The doctor's observations from the conversation.
    pub objective: String,
    /// Assessment of the patient's condition.
    pub assessment: String,
    /// Treatment plan, further tests, or follow-up.
    pub plan: String,
}

// ---------------------------------------------------------------------------
// NoteBackend
// ---------------------------------------------------------------------------

/// Generates a [`SoapNote`] from an original-text transcript.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    async fn generate_note(&self, transcript: &str) -> Result<SoapNote, ServiceError>;
}

#[async_trait]
impl NoteBackend for ChatTranslator {
    async fn generate_note(&self, transcript: &str) -> Result<SoapNote, ServiceError> {
        let (system_msg, user_msg) = soap_note_chat(transcript);
        let content = self.complete(&system_msg, &user_msg).await?;
        parse_soap_note(&content)
    }
}

/// Parse the model's reply into a [`SoapNote`].
///
/// Models routinely wrap JSON in Markdown code fences; those are stripped
/// before parsing.
fn parse_soap_note(content: &str) -> Result<SoapNote, ServiceError> {
    let trimmed = strip_code_fences(content);
    serde_json::from_str(trimmed).map_err(|e| ServiceError::Parse(e.to_string()))
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening fence line.
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim().strip_suffix("```").unwrap_or(inner).trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
