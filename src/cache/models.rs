//! Domain types for the document cache: what gets uploaded, what the file
//! service reports back, and the handle a chat session queries against.

// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// The local document to upload and cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    pub path: PathBuf,
    pub display_name: String,
    pub mime_type: String,
    pub ttl_seconds: u64,
}

impl DocumentReference {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
            mime_type: "application/pdf".to_string(),
            ttl_seconds,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// TTL in the `"<seconds>s"` duration format the API expects.
    pub fn ttl_string(&self) -> String {
        format!("{}s", self.ttl_seconds)
    }
}

impl From<&AppConfig> for DocumentReference {
    fn from(config: &AppConfig) -> Self {
        DocumentReference::new(
            &config.document.path,
            &config.document.display_name,
            config.document.ttl_seconds,
        )
        .with_mime_type(&config.document.mime_type)
    }
}

/// Server-side processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Pending,
    Ready,
    Failed,
}

/// An uploaded file as observed through the file service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    pub mime_type: String,
    /// Content URI; set once processing completes.
    pub uri: Option<String>,
    pub state: FileState,
}

/// Handle to a registered cache entry.
///
/// `CacheInitializer::initialize` returns one once the document is uploaded,
/// processed and cached. Chat views only query with a handle they got that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheHandle {
    /// Cache resource name, e.g. `cachedContents/abc123`.
    pub name: String,
    /// Model the cache is bound to; queries must use the same model.
    pub model: String,
    pub display_name: String,
    pub expire_time: DateTime<Utc>,
}

impl CacheHandle {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_time
    }

    /// Expiry when the provider response omits one.
    pub fn expiry_from_ttl(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        ChronoDuration::try_seconds(ttl)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Fixed-interval polling bounds for document processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 150,
        }
    }
}

impl From<&AppConfig> for PollPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.polling.max_attempts,
        }
    }
}
