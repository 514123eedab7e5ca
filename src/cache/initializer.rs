// Cache initializer - upload, wait for processing, register cache entry
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheHandle, DocumentReference, FileState, PollPolicy, RemoteFile};
use crate::config::AppConfig;
use crate::error::{ChatError, Result};
use crate::gemini::{Content, CreateCachedContentRequest, GeminiBackend};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Model and system instruction every cache entry is created with.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub model: String,
    pub system_instruction: String,
}

impl From<&AppConfig> for CacheSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.cache.model.clone(),
            system_instruction: config.cache.system_instruction.clone(),
        }
    }
}

/// Turns a local document into a server-side cache entry.
pub struct CacheInitializer {
    backend: Arc<dyn GeminiBackend>,
    settings: CacheSettings,
    poll: PollPolicy,
}

impl CacheInitializer {
    pub fn new(backend: Arc<dyn GeminiBackend>, settings: CacheSettings, poll: PollPolicy) -> Self {
        Self {
            backend,
            settings,
            poll,
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Upload `document`, wait until the file service has processed it, then
    /// register a cache entry bound to the configured model and instruction.
    ///
    /// Nothing is retried: the first failing call aborts initialization.
    pub async fn initialize(&self, document: &DocumentReference) -> Result<CacheHandle> {
        let file = self.prepare(document).await?;
        self.create_cache(document, &file).await
    }

    /// Upload `document` and wait until the file service has processed it.
    /// Nothing remote needs cleaning up if this future is dropped.
    pub async fn prepare(&self, document: &DocumentReference) -> Result<RemoteFile> {
        let uploaded = self.backend.upload_file(document).await.map_err(|e| {
            error!("Error uploading {}: {}", document.path.display(), e);
            ChatError::Upload(e.to_string())
        })?;
        info!("Uploaded {} as {}", document.display_name, uploaded.name);

        self.wait_until_processed(&uploaded.name).await
    }

    /// Register a cache entry for a processed file.
    pub async fn create_cache(
        &self,
        document: &DocumentReference,
        file: &RemoteFile,
    ) -> Result<CacheHandle> {
        let file_uri = file.uri.clone().ok_or_else(|| {
            error!("File {} is active but has no URI", file.name);
            ChatError::Upload(format!("file {} has no content URI", file.name))
        })?;
        info!("Document processing complete: {}", file_uri);

        let mime_type = if file.mime_type.is_empty() {
            document.mime_type.clone()
        } else {
            file.mime_type.clone()
        };

        let request = CreateCachedContentRequest {
            model: self.settings.model.clone(),
            display_name: document.display_name.clone(),
            system_instruction: Content::system(&self.settings.system_instruction),
            contents: vec![Content::user_file(mime_type, file_uri)],
            ttl: document.ttl_string(),
        };

        let created = self
            .backend
            .create_cached_content(&request)
            .await
            .map_err(|e| {
                error!("Error creating cache for {}: {}", file.name, e);
                ChatError::CacheCreation(e.to_string())
            })?;

        let handle = CacheHandle {
            name: created.name,
            model: created.model.unwrap_or_else(|| self.settings.model.clone()),
            display_name: created
                .display_name
                .unwrap_or_else(|| document.display_name.clone()),
            expire_time: created
                .expire_time
                .unwrap_or_else(|| CacheHandle::expiry_from_ttl(Utc::now(), document.ttl_seconds)),
        };

        info!("Cache initialized: {} (expires {})", handle.name, handle.expire_time);
        Ok(handle)
    }

    /// Check the file state at a fixed interval until it leaves `Pending`.
    ///
    /// Performs at most `max_attempts` status checks, sleeping `interval`
    /// between consecutive ones.
    async fn wait_until_processed(&self, name: &str) -> Result<RemoteFile> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let file = self.backend.get_file(name).await.map_err(|e| {
                error!("Error checking status of {}: {}", name, e);
                ChatError::Upload(e.to_string())
            })?;

            match file.state {
                FileState::Ready => {
                    debug!("File {} ready after {} status checks", name, attempts);
                    return Ok(file);
                }
                FileState::Failed => {
                    error!("Processing of {} failed", name);
                    return Err(ChatError::ProcessingFailed(format!(
                        "file {} entered FAILED state",
                        name
                    )));
                }
                FileState::Pending if attempts >= self.poll.max_attempts => {
                    warn!("File {} still processing after {} status checks", name, attempts);
                    return Err(ChatError::ProcessingTimeout { attempts });
                }
                FileState::Pending => {
                    info!("Waiting for {} to be processed", name);
                    tokio::time::sleep(self.poll.interval).await;
                }
            }
        }
    }

    /// Delete the remote cache entry behind `handle`.
    pub async fn release(&self, handle: &CacheHandle) -> Result<()> {
        self.backend.delete_cached_content(&handle.name).await
    }
}
