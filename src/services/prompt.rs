//! Prompt construction for the chat-completions backend.
//!
//! Two prompt families live here:
//! * **Translation** (`translation_chat`) — professional-translator system
//!   instruction plus a user message carrying the text, the language pair
//!   and optional free-text context.
//! * **SOAP note** (`soap_note_chat`) — clinical-notes system instruction
//!   that requests a strict JSON object so the response can be parsed
//!   mechanically.
//!
//! Language codes are rendered as display names via the injected
//! [`LanguageDirectory`](crate::languages::LanguageDirectory) so the model
//! sees "English", not "eng".

use crate::languages::LanguageDirectory;

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const TRANSLATION_SYSTEM: &str = "\
You are a professional translator who specializes in translating text while \
maintaining context. Reply with ONLY the translation — no explanation, no \
quotation marks.";

const SOAP_SYSTEM: &str = "\
You are a medical assistant responsible for creating structured clinical \
notes. Analyze the conversation between a doctor and a patient and generate \
a concise SOAP note. Respond with ONLY a JSON object with the string keys \
\"subjective\", \"objective\", \"assessment\" and \"plan\".";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds `(system_msg, user_msg)` pairs for the chat-completions wire
/// format.
///
/// # Example
/// ```rust
/// use medbridge::languages::LanguageDirectory;
/// use medbridge::services::PromptBuilder;
///
/// let builder = PromptBuilder::new(LanguageDirectory::default());
/// let (system, user) = builder.translation_chat("Hello", "eng", "urd", None);
/// assert!(system.contains("professional translator"));
/// assert!(user.contains("from English to Urdu"));
/// ```
pub struct PromptBuilder {
    languages: LanguageDirectory,
}

impl PromptBuilder {
    pub fn new(languages: LanguageDirectory) -> Self {
        Self { languages }
    }

    /// Translation request.
    ///
    /// Structure of the user message (in order):
    /// 1. Language pair, rendered as display names
    /// 2. The text to translate
    /// 3. Context block (only when context is present and non-blank)
    /// 4. `Translation:` cue
    pub fn translation_chat(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
    ) -> (String, String) {
        let source = self.languages.display_name(source_language);
        let target = self.languages.display_name(target_language);

        let mut user = String::with_capacity(512);
        user.push_str(&format!(
            "Translate the following text from {source} to {target}:\n\nText: {text}\n"
        ));

        if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
            user.push_str(&format!(
                "\nConsider the following context when translating:\n\nContext: {ctx}\n"
            ));
        }

        user.push_str("\nTranslation:");
        (TRANSLATION_SYSTEM.to_string(), user)
    }

}

/// SOAP-note request over a full conversation transcript.
///
/// Free-standing because it needs no language resolution.
pub fn soap_note_chat(transcript: &str) -> (String, String) {
    let user = format!("Conversation:\n{transcript}\n\nJSON SOAP note:");
    (SOAP_SYSTEM.to_string(), user)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
