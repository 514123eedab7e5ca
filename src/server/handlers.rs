// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::chat::ViewSnapshot;
use crate::error::ChatError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("assets/index.html");

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub view: ViewSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub model: String,
    pub document: String,
    pub timestamp: String,
}

/// Serve the chat page.
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let title = escape_html(&state.sessions.document().display_name);
    Html(INDEX_HTML.replace("{{TITLE}}", &title))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.len().await,
        model: state.sessions.model().to_string(),
        document: state.sessions.document().display_name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Page load: open a session and start caching the document.
pub async fn create_session_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let (id, view) = state.sessions.open().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            id,
            view: view.snapshot(),
        }),
    )
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ChatError> {
    let view = state.sessions.get(id).await?;
    Ok(Json(SessionResponse {
        id,
        view: view.snapshot(),
    }))
}

/// Submit a question and wait for the view to settle.
pub async fn ask_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: String,
) -> Result<Json<SessionResponse>, ChatError> {
    let req: AskRequest = serde_json::from_str(&body).map_err(|e| {
        debug!("Failed to deserialize ask request: {}", e);
        ChatError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;

    let view = state.sessions.get(id).await?;
    info!("Received question for session {} ({} chars)", id, req.text.len());

    let snapshot = view.submit(req.text).await;
    Ok(Json(SessionResponse { id, view: snapshot }))
}

/// Page unload: tear the session down.
pub async fn close_session_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ChatError> {
    state.sessions.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
