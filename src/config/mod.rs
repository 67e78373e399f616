//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each backend,
//! `AppPaths` for cross-platform data directories, TOML persistence via
//! `AppConfig::load` / `AppConfig::save`, and `ConfigError` for fail-fast
//! credential validation.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ConfigError, ConversationConfig, DeliveryConfig, RetryConfig, SynthesisConfig,
    TranscriptionConfig, TranslationConfig,
};
