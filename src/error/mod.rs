// Error types for doccache-chat
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Document upload failed: {0}")]
    Upload(String),

    #[error("Document processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Document still processing after {attempts} status checks")]
    ProcessingTimeout { attempts: u32 },

    #[error("Cache creation failed: {0}")]
    CacheCreation(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Cache not initialized")]
    UninitializedCache,

    #[error("Gemini API error (HTTP {status}): {message}")]
    GeminiApi { status: u16, message: String },

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Short machine-readable kind, used in HTTP error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Upload(_) => "upload_error",
            ChatError::ProcessingFailed(_) => "processing_error",
            ChatError::ProcessingTimeout { .. } => "processing_timeout",
            ChatError::CacheCreation(_) => "cache_creation_error",
            ChatError::Generation(_) => "generation_error",
            ChatError::UninitializedCache => "uninitialized_cache",
            ChatError::GeminiApi { .. } => "api_error",
            ChatError::SessionNotFound(_) => "not_found_error",
            ChatError::InvalidRequest(_) | ChatError::Json(_) => "invalid_request_error",
            ChatError::Config(_) | ChatError::ConfigParsing(_) => "configuration_error",
            ChatError::Io(_) | ChatError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::InvalidRequest(_) | ChatError::Json(_) => StatusCode::BAD_REQUEST,
            ChatError::UninitializedCache => StatusCode::CONFLICT,
            ChatError::Upload(_)
            | ChatError::ProcessingFailed(_)
            | ChatError::CacheCreation(_)
            | ChatError::Generation(_)
            | ChatError::GeminiApi { .. } => StatusCode::BAD_GATEWAY,
            ChatError::ProcessingTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert ChatError to HTTP responses for Axum
impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let body = json!({
            "type": "error",
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        });

        (self.status_code(), axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
