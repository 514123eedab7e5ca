// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{ChatError, Result};
use config::{Config, Environment, File, Map};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `DOCCHAT_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "DOCCHAT";

/// Conventional variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::build(path, None)?;

        if config.gemini.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                config.gemini.api_key = ApiKey::new(key);
            }
        }

        Ok(config)
    }

    /// Build configuration from defaults, an optional file and the environment.
    ///
    /// `env` replaces the process environment when given, which keeps tests
    /// independent of each other.
    pub fn build(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(file)
            // Override with environment variables (prefix: DOCCHAT_)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ChatError::Config(e.to_string()))
    }

    /// Reject settings that would make every session fail.
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.is_empty() {
            return Err(ChatError::Config(format!(
                "Gemini API key missing: set gemini.api_key, {}_GEMINI__API_KEY or {}",
                ENV_PREFIX, API_KEY_ENV
            )));
        }
        if self.document.ttl_seconds == 0 {
            return Err(ChatError::Config("document.ttl_seconds must be positive".to_string()));
        }
        if self.polling.interval_ms == 0 {
            return Err(ChatError::Config("polling.interval_ms must be positive".to_string()));
        }
        if self.polling.max_attempts == 0 {
            return Err(ChatError::Config("polling.max_attempts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".doccache-chat")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
