// Gemini cached content models for cache creation API
// Author: kelexine (https://github.com/kelexine)

use super::models::Content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to create a cached content entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCachedContentRequest {
    pub model: String,
    pub display_name: String,
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub ttl: String, // e.g., "600s" for 10 minutes
}

/// Response from cache creation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedContentResponse {
    pub name: String, // e.g., "cachedContents/abc123"
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expire_time: Option<DateTime<Utc>>,
}
