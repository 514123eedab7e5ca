// HTTP surface tests through the axum router
// Author: kelexine (https://github.com/kelexine)

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::FakeBackend;
use doccache_chat::chat::{SessionRegistry, INIT_ERROR_MESSAGE};
use doccache_chat::server::create_router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(backend: FakeBackend) -> Router {
    let (initializer, forwarder) = common::stack(Arc::new(backend), common::fast_poll());
    create_router(SessionRegistry::new(initializer, forwarder, common::document())).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn open_settled_session(app: &Router) -> (String, Value) {
    let (status, body) = send(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    loop {
        let (_, body) = send(app, "GET", &format!("/api/sessions/{}", id), None).await;
        let phase = body["view"]["phase"].as_str().unwrap().to_string();
        if phase != "initializing" && phase != "uninitialized" {
            return (id, body);
        }
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_index_page_shows_document_title() {
    let app = app(FakeBackend::new());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Founders Guide to UK Crypto Law Chatbot"));
    assert!(!html.contains("{{TITLE}}"));
}

#[tokio::test]
async fn test_health() {
    let app = app(FakeBackend::new());
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
    assert_eq!(body["model"], common::MODEL);
}

#[tokio::test]
async fn test_session_ask_round_trip() {
    let app = app(FakeBackend::new().answering("A crypto-asset is property."));
    let (id, body) = open_settled_session(&app).await;
    assert_eq!(body["view"]["phase"], "ready");
    assert_eq!(body["view"]["cache"]["name"], common::CACHE_NAME);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/ask", id),
        Some(r#"{"text":"What counts as a crypto-asset under UK law?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["response"], "A crypto-asset is property.");
    assert_eq!(body["view"]["input"], "");
}

#[tokio::test]
async fn test_failed_session_reports_init_error() {
    let app = app(FakeBackend::new().failing_upload());
    let (_, body) = open_settled_session(&app).await;

    assert_eq!(body["view"]["phase"], "failed");
    assert_eq!(body["view"]["response"], INIT_ERROR_MESSAGE);
    assert!(body["view"]["cache"].is_null());
}

#[tokio::test]
async fn test_api_responses_are_not_cached() {
    let app = app(FakeBackend::new());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = app(FakeBackend::new());
    let (status, body) = send(
        &app,
        "GET",
        "/api/sessions/9b2f7c1e-8d4a-4f6b-a1c3-0e5d7f9b2a4c",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "not_found_error");
}

#[tokio::test]
async fn test_malformed_question_is_bad_request() {
    let app = app(FakeBackend::new());
    let (id, _) = open_settled_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/ask", id),
        Some(r#"{"question": 42}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_delete_closes_session() {
    let app = app(FakeBackend::new());
    let (id, _) = open_settled_session(&app).await;
    let uri = format!("/api/sessions/{}", id);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions"], 0);
}
