// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use doccache_chat::error::ChatError;
use uuid::Uuid;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        ChatError::Upload("rejected".to_string()),
        ChatError::ProcessingFailed("files/abc".to_string()),
        ChatError::ProcessingTimeout { attempts: 150 },
        ChatError::CacheCreation("quota".to_string()),
        ChatError::Generation("blocked".to_string()),
        ChatError::UninitializedCache,
        ChatError::SessionNotFound(Uuid::nil()),
        ChatError::InvalidRequest("Bad request".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_processing_timeout_reports_attempts() {
    let error = ChatError::ProcessingTimeout { attempts: 3 };
    assert!(format!("{}", error).contains("3 status checks"));
}

#[test]
fn test_gemini_api_error() {
    let error = ChatError::GeminiApi {
        status: 403,
        message: "Permission denied".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("403"));
    assert!(display.contains("Permission denied"));
}

#[test]
fn test_status_codes() {
    assert_eq!(ChatError::SessionNotFound(Uuid::nil()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(ChatError::InvalidRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(ChatError::UninitializedCache.status_code(), StatusCode::CONFLICT);
    assert_eq!(ChatError::Upload("x".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(ChatError::Generation("x".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        ChatError::ProcessingTimeout { attempts: 1 }.status_code(),
        StatusCode::GATEWAY_TIMEOUT
    );
    assert_eq!(
        ChatError::Config("x".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_error_kinds() {
    assert_eq!(ChatError::Upload("x".into()).kind(), "upload_error");
    assert_eq!(ChatError::CacheCreation("x".into()).kind(), "cache_creation_error");
    assert_eq!(ChatError::UninitializedCache.kind(), "uninitialized_cache");
    assert_eq!(ChatError::SessionNotFound(Uuid::nil()).kind(), "not_found_error");
}

#[test]
fn test_into_response_status() {
    let response = ChatError::SessionNotFound(Uuid::nil()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
