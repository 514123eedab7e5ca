// Gemini Generative Language API type definitions (v1beta)
// Author: kelexine (https://github.com/kelexine)

use crate::cache::{FileState, RemoteFile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content in a turn (user or model)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default = "default_role", skip_serializing_if = "String::is_empty")]
    pub role: String, // "user" or "model"; empty for system instructions
    #[serde(default)]
    pub parts: Vec<Part>,
}

fn default_role() -> String {
    "model".to_string()
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn user_file(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::FileData {
                file_data: FileData {
                    mime_type: mime_type.into(),
                    file_uri: file_uri.into(),
                },
            }],
        }
    }

    /// System instructions carry no role.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: String::new(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

/// Individual part of content in a Gemini request/response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Text content part.
    Text { text: String },

    /// Reference to an uploaded file.
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },

    /// Anything else the model may emit (function calls, inline data...).
    Other(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// File resource as returned by the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub state: WireFileState,
    #[serde(default)]
    pub error: Option<Status>,
}

/// Processing state as spelled on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireFileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
}

impl From<WireFileState> for FileState {
    fn from(state: WireFileState) -> Self {
        match state {
            WireFileState::StateUnspecified | WireFileState::Processing => FileState::Pending,
            WireFileState::Active => FileState::Ready,
            WireFileState::Failed => FileState::Failed,
        }
    }
}

impl From<FileResource> for RemoteFile {
    fn from(file: FileResource) -> Self {
        RemoteFile {
            name: file.name,
            mime_type: file.mime_type,
            uri: file.uri.filter(|uri| !uri.is_empty()),
            state: file.state.into(),
        }
    }
}

/// Google RPC status, used for file processing errors.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `upload/v1beta/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFileResponse {
    pub file: FileResource,
}

/// Metadata part of a multipart upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadFileMetadata {
    pub file: UploadFileInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileInfo {
    pub display_name: String,
}

/// `generateContent` request scoped to a cache entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Cache resource name (`cachedContents/...`).
    pub cached_content: String,
    pub contents: Vec<Content>,
}

/// `generateContent` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Response carrying a single text candidate.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: "model".to_string(),
                    parts: vec![Part::Text { text: text.into() }],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
            prompt_feedback: None,
        }
    }
}
