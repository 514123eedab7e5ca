// Query forwarding against a cached document
// Author: kelexine (https://github.com/kelexine)

use crate::cache::CacheHandle;
use crate::error::{ChatError, Result};
use crate::gemini::{Content, GeminiBackend, GenerateContentRequest};
use std::sync::Arc;
use tracing::{debug, error};

/// Returned when the model produces no text.
pub const FALLBACK_ANSWER: &str = "No relevant answer found.";

/// Sends single questions to the model, scoped to one cache entry.
///
/// Each call is independent: only the cached document and the new question
/// are sent, never earlier turns.
pub struct QueryForwarder {
    backend: Arc<dyn GeminiBackend>,
}

impl QueryForwarder {
    pub fn new(backend: Arc<dyn GeminiBackend>) -> Self {
        Self { backend }
    }

    /// Ask `user_text` against `cache`. Input is passed through unvalidated.
    pub async fn query(&self, cache: &CacheHandle, user_text: &str) -> Result<String> {
        let request = GenerateContentRequest {
            cached_content: cache.name.clone(),
            contents: vec![Content::user_text(user_text)],
        };

        let response = self
            .backend
            .generate_content(&cache.model, &request)
            .await
            .map_err(|e| {
                error!("Error querying model {}: {}", cache.model, e);
                ChatError::Generation(e.to_string())
            })?;

        let text = response.text();
        if text.is_empty() {
            debug!("Empty generation for cache {}", cache.name);
            return Ok(FALLBACK_ANSWER.to_string());
        }

        Ok(text)
    }
}
