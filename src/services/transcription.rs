//! Speech-to-text client.
//!
//! [`TranscriptionClient`] is the trait the coordinator holds behind an
//! `Arc<dyn …>`. [`ScribeClient`] is the production implementation over the
//! ElevenLabs speech-to-text endpoint.
//!
//! A 2xx response with no discernible text is **not** an error — it comes
//! back as an empty string and callers branch on emptiness for the
//! "no speech detected" case.

use async_trait::async_trait;

use crate::audio::AudioClip;
use crate::config::{ConfigError, TranscriptionConfig};
use crate::services::error::{error_for_status, retrying, RetryPolicy, ServiceError};

// ---------------------------------------------------------------------------
// TranscriptionClient trait
// ---------------------------------------------------------------------------

/// Stateless speech→text request/response wrapper.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Transcribe `clip`, optionally hinting the spoken language.
    ///
    /// Returns `Ok(String::new())` when the service found no speech.
    async fn transcribe(
        &self,
        clip: &AudioClip,
        language_hint: Option<&str>,
    ) -> Result<String, ServiceError>;
}

// ---------------------------------------------------------------------------
// ScribeClient
// ---------------------------------------------------------------------------

/// ElevenLabs `/v1/speech-to-text` client.
///
/// The audio travels as a multipart upload together with the model id and
/// the optional language hint. Authentication is the `xi-api-key` header.
pub struct ScribeClient {
    client: reqwest::Client,
    config: TranscriptionConfig,
    api_key: String,
    retry: RetryPolicy,
}

impl ScribeClient {
    /// Build a client from application config.
    ///
    /// Fails fast with [`ConfigError::MissingCredential`] when no API key is
    /// configured — no network call is ever attempted without one.
    pub fn from_config(
        config: &TranscriptionConfig,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential {
                service: "transcription",
                field: "api_key",
            })?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
            retry,
        })
    }

    async fn attempt(
        &self,
        clip: &AudioClip,
        language_hint: Option<&str>,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/v1/speech-to-text", self.config.base_url);

        let file = reqwest::multipart::Part::bytes(clip.bytes.clone())
            .file_name("utterance.wav")
            .mime_str(&clip.mime_type)
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .text("model_id", self.config.model.clone())
            .part("file", file);

        if let Some(lang) = language_hint {
            form = form.text("language_code", lang.to_string());
        }
        if self.config.use_multi_channel {
            form = form.text("use_multi_channel", "true");
        }

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = error_for_status(response).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(extract_text(&json, self.config.use_multi_channel))
    }
}

#[async_trait]
impl TranscriptionClient for ScribeClient {
    async fn transcribe(
        &self,
        clip: &AudioClip,
        language_hint: Option<&str>,
    ) -> Result<String, ServiceError> {
        retrying(self.retry, || self.attempt(clip, language_hint)).await
    }
}

/// Pull the transcript out of the response body.
///
/// A well-formed 2xx body with neither `text` nor `transcripts` means the
/// audio contained no speech — that is the empty-string outcome, not an
/// error.
fn extract_text(json: &serde_json::Value, multi_channel: bool) -> String {
    if multi_channel {
        if let Some(transcripts) = json["transcripts"].as_array() {
            return transcripts
                .iter()
                .filter_map(|t| t["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n");
        }
    }
    json["text"].as_str().unwrap_or("").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
