//! Text-to-speech client.
//!
//! [`SynthesisClient`] is used two ways: on-demand playback of any
//! committed turn's translated text (repeatable, idempotent — never part of
//! the commit path), and as the final step of the instruction-clarification
//! pipeline. [`VoiceSynthesizer`] is the production implementation over the
//! ElevenLabs text-to-speech endpoint.

use async_trait::async_trait;

use crate::audio::AudioClip;
use crate::config::{ConfigError, SynthesisConfig};
use crate::services::error::{error_for_status, retrying, RetryPolicy, ServiceError};

// ---------------------------------------------------------------------------
// SynthesisClient trait
// ---------------------------------------------------------------------------

/// Stateless text→speech request/response wrapper.
#[async_trait]
pub trait SynthesisClient: Send + Sync {
    /// Synthesize `text`, optionally overriding the configured voice and
    /// model. Returns a content-bearing clip suitable for local playback or
    /// upload to the delivery gateway.
    async fn synthesize(
        &self,
        text: &str,
        voice_hint: Option<&str>,
        model_hint: Option<&str>,
    ) -> Result<AudioClip, ServiceError>;
}

// ---------------------------------------------------------------------------
// VoiceSynthesizer
// ---------------------------------------------------------------------------

/// ElevenLabs `/v1/text-to-speech/{voice}` client.
pub struct VoiceSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
    api_key: String,
    retry: RetryPolicy,
}

impl VoiceSynthesizer {
    /// Build a synthesizer from application config.
    ///
    /// Fails fast with [`ConfigError::MissingCredential`] when no API key is
    /// configured.
    pub fn from_config(config: &SynthesisConfig, retry: RetryPolicy) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential {
                service: "synthesis",
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
        text: &str,
        voice_hint: Option<&str>,
        model_hint: Option<&str>,
    ) -> Result<AudioClip, ServiceError> {
        let voice = voice_hint.unwrap_or(&self.config.voice_id);
        let model = model_hint.unwrap_or(&self.config.model);

        let url = format!(
            "{}/v1/text-to-speech/{voice}?output_format={}",
            self.config.base_url, self.config.output_format
        );

        let body = serde_json::json!({
            "text":     text,
            "model_id": model
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = error_for_status(response).await?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }

        Ok(AudioClip::new(bytes.to_vec(), mime_type))
    }
}

#[async_trait]
impl SynthesisClient for VoiceSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_hint: Option<&str>,
        model_hint: Option<&str>,
    ) -> Result<AudioClip, ServiceError> {
        retrying(self.retry, || self.attempt(text, voice_hint, model_hint)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
