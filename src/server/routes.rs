// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    ask_handler, close_session_handler, create_session_handler, get_session_handler,
    health_handler, index_handler,
};
use super::middleware::{no_store_layer, request_id_layers};
use crate::chat::SessionRegistry;
use crate::error::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
}

pub fn create_router(sessions: SessionRegistry) -> Result<Router> {
    let state = AppState { sessions };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let api = Router::new()
        .route("/api/sessions", post(create_session_handler))
        .route(
            "/api/sessions/:id",
            get(get_session_handler).delete(close_session_handler),
        )
        .route("/api/sessions/:id/ask", post(ask_handler))
        .layer(no_store_layer());

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .merge(api)
        // Questions are short; anything larger is not a question
        .layer(tower_http::limit::RequestBodyLimitLayer::new(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
