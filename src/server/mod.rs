//! Axum-based HTTP server for doccache-chat.
//!
//! Serves the browser chat page and the JSON session API the page drives:
//! one session per page load, each owning a chat view.
//!
//! # Components
//!
//! - `handlers`: Page, session and health endpoints.
//! - `middleware`: Request ID tracking.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{AskRequest, HealthResponse, SessionResponse};
pub use routes::{create_router, AppState};
