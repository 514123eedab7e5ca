// Gemini API client for files, cached contents and generation
// Author: kelexine (https://github.com/kelexine)

use super::cache_models::{CachedContentResponse, CreateCachedContentRequest};
use super::models::{
    FileResource, GenerateContentRequest, GenerateContentResponse, UploadFileInfo,
    UploadFileMetadata, UploadFileResponse,
};
use super::GeminiBackend;
use crate::cache::{DocumentReference, RemoteFile};
use crate::config::GeminiConfig;
use crate::error::{ChatError, Result};
use crate::utils::logging::sanitize;
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Google Generative Language API.
///
/// Handles authentication and request construction for:
/// - File upload and status lookup
/// - Context caching
/// - Content generation (blocking)
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
    sanitize_logs: bool,
}

impl GeminiClient {
    /// Create a new Gemini client. The API key comes from `config` and is
    /// attached to every request.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| ChatError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client for {}", config.api_base_url);

        Ok(Self {
            http_client,
            config: config.clone(),
            sanitize_logs: true,
        })
    }

    /// Whether upstream error bodies are scrubbed of API keys before logging.
    pub fn with_sanitized_logs(mut self, enabled: bool) -> Self {
        self.sanitize_logs = enabled;
        self
    }

    /// Get the API base_url
    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.api_version,
            path.trim_start_matches('/')
        )
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/{}/files",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.api_version
        )
    }

    /// Turn a non-2xx response into `ChatError::GeminiApi`.
    async fn check_status(&self, response: Response, operation: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let logged = if self.sanitize_logs {
            sanitize(&error_text)
        } else {
            error_text.clone()
        };
        error!("{} failed: HTTP {} - Response body: {}", operation, status, logged);

        let message = Self::extract_error_message(&error_text).unwrap_or(error_text);
        Err(ChatError::GeminiApi {
            status: status.as_u16(),
            message: if self.sanitize_logs { sanitize(&message) } else { message },
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        let response_text = response.text().await.map_err(|e| ChatError::GeminiApi {
            status: 0,
            message: format!("Failed to read {} response body: {}", operation, e),
        })?;

        serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse {} response: {}", operation, e);
            ChatError::GeminiApi {
                status: 0,
                message: format!("{} response parsing error: {}", operation, e),
            }
        })
    }

    fn transport_error(operation: &str, e: reqwest::Error) -> ChatError {
        ChatError::GeminiApi {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            message: format!("{} HTTP error: {}", operation, e),
        }
    }

    /// Extract error message from API response JSON
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(response_text) {
            if let Some(error) = error_resp.error {
                return error.message.or(error.status);
            }
        }
        None
    }
}

/// Qualify a bare model id (`gemini-1.5-flash-001`) as a resource name.
pub(crate) fn model_resource(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Body for the Files API `multipart` upload protocol: a JSON metadata part
/// followed by the raw document bytes.
pub(crate) fn multipart_related_body(
    boundary: &str,
    metadata: &[u8],
    mime_type: &str,
    data: &[u8],
) -> Bytes {
    let mut body = BytesMut::with_capacity(data.len() + metadata.len() + 256);

    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=utf-8\r\n\r\n");
    body.put_slice(metadata);
    body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.put_slice(data);
    body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    body.freeze()
}

#[async_trait]
impl GeminiBackend for GeminiClient {
    async fn upload_file(&self, document: &DocumentReference) -> Result<RemoteFile> {
        let data = tokio::fs::read(&document.path).await?;
        debug!(
            "Uploading {} ({} bytes, {})",
            document.path.display(),
            data.len(),
            document.mime_type
        );

        let metadata = serde_json::to_vec(&UploadFileMetadata {
            file: UploadFileInfo {
                display_name: document.display_name.clone(),
            },
        })?;
        let boundary = format!("doccache-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, &document.mime_type, &data);

        let response = self
            .http_client
            .post(self.upload_url())
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .header("X-Goog-Upload-Protocol", "multipart")
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| Self::transport_error("Upload", e))?;

        let response = self.check_status(response, "Upload").await?;
        let uploaded: UploadFileResponse = Self::parse_json(response, "Upload").await?;

        debug!("Uploaded file: {}", uploaded.file.name);
        Ok(uploaded.file.into())
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        let response = self
            .http_client
            .get(self.api_url(name))
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .send()
            .await
            .map_err(|e| Self::transport_error("File status", e))?;

        let response = self.check_status(response, "File status").await?;
        let file: FileResource = Self::parse_json(response, "File status").await?;

        if let Some(status) = &file.error {
            debug!(
                "File {} reports error {:?}: {}",
                file.name,
                status.code,
                status.message.as_deref().unwrap_or("")
            );
        }

        Ok(file.into())
    }

    async fn create_cached_content(
        &self,
        request: &CreateCachedContentRequest,
    ) -> Result<CachedContentResponse> {
        debug!("Creating cache for model: {}", request.model);

        let response = self
            .http_client
            .post(self.api_url("cachedContents"))
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| Self::transport_error("Create cache", e))?;

        let response = self.check_status(response, "Create cache").await?;
        let cache: CachedContentResponse = Self::parse_json(response, "Create cache").await?;

        debug!("Cache created: {}", cache.name);
        Ok(cache)
    }

    async fn delete_cached_content(&self, name: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.api_url(name))
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .send()
            .await
            .map_err(|e| Self::transport_error("Delete cache", e))?;

        self.check_status(response, "Delete cache").await?;
        debug!("Cache deleted: {}", name);
        Ok(())
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.api_url(&format!("{}:generateContent", model_resource(model)));
        debug!("Calling generateContent API for model: {}", model);

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| Self::transport_error("Generate", e))?;

        let response = self.check_status(response, "Generate").await?;
        let generated: GenerateContentResponse = Self::parse_json(response, "Generate").await?;

        debug!("Successfully received Gemini response");
        Ok(generated)
    }
}
