//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across
//! threads. Credentials may also arrive via environment variables
//! (`XI_API_KEY`, `TRANSLATOR_API_KEY`, `WHATSAPP_ACCESS_TOKEN`,
//! `WHATSAPP_BUSINESS_PHONE_NUMBER_ID`), which take precedence over the
//! file so keys never have to be written to disk.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A required credential or endpoint is missing.
///
/// Raised by client constructors so misconfiguration fails fast, before any
/// network call is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{service}: `{field}` is not configured")]
    MissingCredential {
        service: &'static str,
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-to-text backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Base URL of the transcription API.
    pub base_url: String,
    /// API key — read from `XI_API_KEY` when unset here.
    pub api_key: Option<String>,
    /// Transcription model identifier.
    pub model: String,
    /// Process multi-channel audio as separate transcripts.
    pub use_multi_channel: bool,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            model: "scribe_v1".into(),
            use_multi_channel: false,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Settings for the context-aware translation backend.
///
/// Any provider speaking the OpenAI chat-completions wire format works —
/// Ollama (OpenAI mode), OpenAI, Groq, LM Studio, vLLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Base URL of the API endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0). Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:7b".into(),
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Settings for the text-to-speech backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of the synthesis API.
    pub base_url: String,
    /// API key — read from `XI_API_KEY` when unset here.
    pub api_key: Option<String>,
    /// Default voice id used when the caller gives no hint.
    pub voice_id: String,
    /// Default multilingual TTS model.
    pub model: String,
    /// Output container/bitrate requested from the backend.
    pub output_format: String,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            voice_id: "JBFqnCBsd6RMkjVDRZzb".into(),
            model: "eleven_multilingual_v2".into(),
            output_format: "mp3_44100_128".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryConfig
// ---------------------------------------------------------------------------

/// Settings for the out-of-band messaging gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Graph API root.
    pub base_url: String,
    /// Graph API version segment.
    pub api_version: String,
    /// Access token — read from `WHATSAPP_ACCESS_TOKEN` when unset here.
    pub access_token: Option<String>,
    /// Business phone number id — read from
    /// `WHATSAPP_BUSINESS_PHONE_NUMBER_ID` when unset here.
    pub business_phone_id: Option<String>,
    /// Country code prefixed onto destination numbers without one.
    pub default_country_code: String,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".into(),
            api_version: "v23.0".into(),
            access_token: None,
            business_phone_id: None,
            default_country_code: "92".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationConfig
// ---------------------------------------------------------------------------

/// Settings for the live conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Number of committed turns supplied as translation context.
    pub context_window: usize,
    /// Doctor's working language code.
    pub doctor_language: String,
    /// Default patient language code (overridden per encounter).
    pub patient_language: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            context_window: 3,
            doctor_language: "eng".into(),
            patient_language: "urd".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Bounded retry for the idempotent service calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first. The backends'
    /// original behaviour is a single attempt.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use medbridge::config::AppConfig;
///
/// // Load (returns Default when the file is missing)
/// let config = AppConfig::load().unwrap();
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Speech-to-text backend.
    pub transcription: TranscriptionConfig,
    /// Context-aware translation backend.
    pub translation: TranslationConfig,
    /// Text-to-speech backend.
    pub synthesis: SynthesisConfig,
    /// Messaging gateway.
    pub delivery: DeliveryConfig,
    /// Live conversation settings.
    pub conversation: ConversationConfig,
    /// Retry policy for idempotent service calls.
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`,
    /// then apply environment-variable credential overrides.
    ///
    /// Returns `Ok(AppConfig::default())` (plus env overrides) when the
    /// file does not exist yet, so callers never special-case a first run.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppPaths::new().settings_file)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path (useful for tests). Does not consult the
    /// environment.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay credentials from the environment onto the loaded file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("XI_API_KEY") {
            if !key.is_empty() {
                self.transcription.api_key = Some(key.clone());
                self.synthesis.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("TRANSLATOR_API_KEY") {
            if !key.is_empty() {
                self.translation.api_key = Some(key);
            }
        }
        if let Ok(token) = std::env::var("WHATSAPP_ACCESS_TOKEN") {
            if !token.is_empty() {
                self.delivery.access_token = Some(token);
            }
        }
        if let Ok(id) = std::env::var("WHATSAPP_BUSINESS_PHONE_NUMBER_ID") {
            if !id.is_empty() {
                self.delivery.business_phone_id = Some(id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
