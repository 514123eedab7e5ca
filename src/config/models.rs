//! Configuration data structures for doccache-chat.
//!
//! This module defines the schema for the application settings: the HTTP
//! server, the Gemini API connection, the cached document, cache creation,
//! file-status polling and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// The document that every chat session uploads and caches.
    #[serde(default)]
    pub document: DocumentConfig,

    /// Cached-content registration settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// File-status polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Gemini API key. Wiped from memory on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

/// Settings for the upstream Gemini API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`. Falls back to `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: ApiKey,

    /// Base URL of the Generative Language API.
    /// Default: `https://generativelanguage.googleapis.com`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API version path segment.
    /// Default: `v1beta`
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds.
    /// Default: `120`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// The document uploaded for every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Local path of the document.
    /// Default: `assets/law.pdf`
    #[serde(default = "default_document_path")]
    pub path: String,

    /// Display name used for both the uploaded file and the cache entry.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Content type requested on upload.
    /// Default: `application/pdf`
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Lifetime of the cache entry in seconds.
    /// Default: `600` (10 minutes)
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

/// Settings for cache registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Model the cache (and every query against it) is bound to.
    /// Default: `models/gemini-1.5-flash-001`
    #[serde(default = "default_model")]
    pub model: String,

    /// Directive restricting answers to the cached document.
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
}

/// Settings for waiting on server-side document processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed delay between status checks in milliseconds.
    /// Default: `2000`
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Maximum number of status checks before giving up.
    /// Default: `150` (5 minutes at the default interval)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys in logged provider responses.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::default(),
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
            display_name: default_display_name(),
            mime_type: default_mime_type(),
            ttl_seconds: default_ttl(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_instruction: default_system_instruction(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_version() -> String {
    "v1beta".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_document_path() -> String {
    "assets/law.pdf".to_string()
}

fn default_display_name() -> String {
    "Founders Guide to UK Crypto Law".to_string()
}

fn default_mime_type() -> String {
    "application/pdf".to_string()
}

fn default_ttl() -> u64 {
    600
}

fn default_model() -> String {
    "models/gemini-1.5-flash-001".to_string()
}

fn default_system_instruction() -> String {
    "You are an expert in UK Crypto Law. Answer ONLY from the cached PDF. \
     If the user asks unrelated questions, politely decline."
        .to_string()
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    150
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
