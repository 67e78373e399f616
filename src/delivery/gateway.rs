//! Out-of-band delivery of clarified instructions.
//!
//! [`WhatsAppGateway`] pushes a text message plus an optional voice note to
//! a patient's phone over the Graph API. Delivery is best-effort with a
//! single attempt; failure never touches conversation state.
//!
//! Ordering rule: when audio is present it is uploaded to the `/media`
//! endpoint to obtain a media id **before** any message references it —
//! sending a message against a not-yet-uploaded handle is invalid.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::AudioClip;
use crate::config::{ConfigError, DeliveryConfig};

use super::phone::{DefaultNormalizer, NumberNormalizer};

// ---------------------------------------------------------------------------
// DeliveryError
// ---------------------------------------------------------------------------

/// Failures from the messaging backend.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The API answered with a non-success HTTP status.
    #[error("delivery API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP transport or connection error.
    #[error("delivery request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("delivery request timed out")]
    Timeout,

    /// The upload response carried no media id to reference.
    #[error("media upload returned no media id")]
    MissingMediaId,

    /// The response body could not be parsed.
    #[error("failed to parse delivery response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryGateway trait
// ---------------------------------------------------------------------------

/// Fire-and-forget message delivery; one best-effort attempt.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    async fn deliver(
        &self,
        destination: &str,
        text: &str,
        audio: Option<&AudioClip>,
    ) -> Result<(), DeliveryError>;
}

// ---------------------------------------------------------------------------
// WhatsAppGateway
// ---------------------------------------------------------------------------

/// Graph API messaging client.
pub struct WhatsAppGateway {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    normalizer: Box<dyn NumberNormalizer>,
}

impl WhatsAppGateway {
    /// Build a gateway from application config with the default number
    /// normalizer.
    ///
    /// Fails fast with [`ConfigError::MissingCredential`] when the access
    /// token or business phone id is absent.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, ConfigError> {
        let normalizer = Box::new(DefaultNormalizer::new(config.default_country_code.clone()));
        Self::with_normalizer(config, normalizer)
    }

    /// Build a gateway with a caller-supplied normalization strategy.
    pub fn with_normalizer(
        config: &DeliveryConfig,
        normalizer: Box<dyn NumberNormalizer>,
    ) -> Result<Self, ConfigError> {
        let access_token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingCredential {
                service: "delivery",
                field: "access_token",
            })?
            .to_string();

        let phone_id = config
            .business_phone_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingCredential {
                service: "delivery",
                field: "business_phone_id",
            })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            base_url: format!("{}/{}/{}", config.base_url, config.api_version, phone_id),
            access_token,
            normalizer,
        })
    }

    /// Upload the voice note and return its media id.
    async fn upload_media(&self, audio: &AudioClip) -> Result<String, DeliveryError> {
        let file = reqwest::multipart::Part::bytes(audio.bytes.clone())
            .file_name("instructions.mp3")
            .mime_str(&audio.mime_type)
            .map_err(|e| DeliveryError::Parse(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .part("file", file);

        let response = self
            .client
            .post(format!("{}/media", self.base_url))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DeliveryError::Parse(e.to_string()))?;

        json["id"]
            .as_str()
            .map(String::from)
            .ok_or(DeliveryError::MissingMediaId)
    }

    async fn send_message(&self, body: serde_json::Value) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DeliveryGateway for WhatsAppGateway {
    async fn deliver(
        &self,
        destination: &str,
        text: &str,
        audio: Option<&AudioClip>,
    ) -> Result<(), DeliveryError> {
        let to = self.normalizer.normalize(destination);

        // Media must be uploaded before any message can reference it.
        let media_id = match audio {
            Some(clip) => Some(self.upload_media(clip).await?),
            None => None,
        };

        self.send_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type":    "individual",
            "to":                &to,
            "type":              "text",
            "text": {
                "preview_url": false,
                "body":        text
            }
        }))
        .await?;

        if let Some(id) = media_id {
            self.send_message(serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type":    "individual",
                "to":                &to,
                "type":              "audio",
                "audio": { "id": id }
            }))
            .await?;
        }

        log::info!("delivery: messages sent to {to}");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DeliveryError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::Status { status, body })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> DeliveryConfig {
        DeliveryConfig {
            access_token: Some("token".into()),
            business_phone_id: Some("12345".into()),
            ..DeliveryConfig::default()
        }
    }

    #[test]
    fn from_config_requires_access_token() {
        let mut config = make_config();
        config.access_token = None;
        let err = WhatsAppGateway::from_config(&config);
        assert!(matches!(
            err,
            Err(ConfigError::MissingCredential {
                field: "access_token",
                ..
            })
        ));
    }

    #[test]
    fn from_config_requires_business_phone_id() {
        let mut config = make_config();
        config.business_phone_id = Some("".into());
        let err = WhatsAppGateway::from_config(&config);
        assert!(matches!(
            err,
            Err(ConfigError::MissingCredential {
                field: "business_phone_id",
                ..
            })
        ));
    }

    #[test]
    fn base_url_embeds_version_and_phone_id() {
        let gateway = WhatsAppGateway::from_config(&make_config()).unwrap();
        assert_eq!(
            gateway.base_url,
            "https://graph.facebook.com/v23.0/12345"
        );
    }

    #[test]
    fn gateway_is_object_safe() {
        let gateway = WhatsAppGateway::from_config(&make_config()).unwrap();
        let _: Box<dyn DeliveryGateway> = Box::new(gateway);
    }
}
