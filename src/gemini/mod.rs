// Gemini API client module
// Author: kelexine (https://github.com/kelexine)

pub mod cache_models;
mod client;
pub mod models;

pub use cache_models::{CachedContentResponse, CreateCachedContentRequest};
pub use client::GeminiClient;
pub use models::{Content, GenerateContentRequest, GenerateContentResponse, Part};

use crate::cache::{DocumentReference, RemoteFile};
use crate::error::Result;
use async_trait::async_trait;

/// The subset of the Gemini API this service talks to.
///
/// `GeminiClient` is the HTTP implementation; tests substitute scripted ones.
#[async_trait]
pub trait GeminiBackend: Send + Sync {
    /// Upload a local document to the Files API.
    async fn upload_file(&self, document: &DocumentReference) -> Result<RemoteFile>;

    /// Fetch the current state of an uploaded file (`files/...`).
    async fn get_file(&self, name: &str) -> Result<RemoteFile>;

    /// Register a cached content entry.
    async fn create_cached_content(
        &self,
        request: &CreateCachedContentRequest,
    ) -> Result<CachedContentResponse>;

    /// Delete a cached content entry (`cachedContents/...`).
    async fn delete_cached_content(&self, name: &str) -> Result<()>;

    /// Call `generateContent` on `model`.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}
