//! Context-aware translation client.
//!
//! [`TranslationClient`] is the trait seam; [`ChatTranslator`] calls any
//! OpenAI-compatible `/v1/chat/completions` endpoint — Ollama (OpenAI
//! mode), OpenAI, Groq, LM Studio, vLLM. All connection details come from
//! [`TranslationConfig`]; nothing is hardcoded.

use async_trait::async_trait;

use crate::config::{ConfigError, TranslationConfig};
use crate::languages::LanguageDirectory;
use crate::services::error::{error_for_status, retrying, RetryPolicy, ServiceError};
use crate::services::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// TranslationClient trait
// ---------------------------------------------------------------------------

/// Stateless text→text translation with advisory free-text context.
///
/// Absence of context must be legal — the first turn of a conversation has
/// none. A single attempt per call unless the retry policy says otherwise.
#[async_trait]
pub trait TranslationClient: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
    ) -> Result<String, ServiceError>;
}

// ---------------------------------------------------------------------------
// ChatTranslator
// ---------------------------------------------------------------------------

/// Production translator over the chat-completions wire format.
pub struct ChatTranslator {
    client: reqwest::Client,
    config: TranslationConfig,
    prompts: PromptBuilder,
    retry: RetryPolicy,
}

impl ChatTranslator {
    /// Build a translator from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. Local providers need no API key, so a missing
    /// key is not an error here; the `Authorization` header is attached only
    /// when a non-empty key is present.
    pub fn from_config(
        config: &TranslationConfig,
        languages: LanguageDirectory,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            config: config.clone(),
            prompts: PromptBuilder::new(languages),
            retry,
        })
    }

    /// One chat-completions round trip; shared by translation and the
    /// SOAP-note generator.
    pub(crate) async fn complete(
        &self,
        system_msg: &str,
        user_msg: &str,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system_msg },
                { "role": "user",   "content": user_msg   }
            ],
            "stream":      false,
            "temperature": self.config.temperature
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = error_for_status(req.send().await?).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(ServiceError::EmptyResponse)?
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }

        Ok(content)
    }
}

#[async_trait]
impl TranslationClient for ChatTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
    ) -> Result<String, ServiceError> {
        let (system_msg, user_msg) =
            self.prompts
                .translation_chat(text, source_language, target_language, context);

        retrying(self.retry, || self.complete(&system_msg, &user_msg)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
