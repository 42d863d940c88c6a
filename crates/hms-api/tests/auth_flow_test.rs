//! Integration tests for the login / refresh / me flow

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use hms_api::{models::*, store::InMemoryUserStore, ApiServer, ApiServerConfig};
use hms_auth::TokenIssuer;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

fn create_test_app() -> Router {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    };
    let issuer = TokenIssuer::new(b"test-secret", Duration::minutes(1), Duration::minutes(10));

    ApiServer::new(config, issuer, Arc::new(InMemoryUserStore::new())).build_router()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get_me(app: &Router, token: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .uri("/api/v1/me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn register_and_login(app: &Router, username: &str, role: &str) -> LoginResponse {
    let (status, _) = post_json(
        app,
        "/api/v1/register",
        json!({ "username": username, "password": "hunter22", "role": role }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        app,
        "/api/v1/login",
        json!({ "username": username, "password": "hunter22" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = create_test_app();
    let login = register_and_login(&app, "alice", "doctor").await;

    assert!(!login.access_token.is_empty());
    assert!(!login.refresh_token.is_empty());
    assert_eq!(login.user.username, "alice");
    assert_eq!(login.user.role, UserRole::Doctor);

    let (status, body) = get_me(&app, &login.access_token).await;
    assert_eq!(status, StatusCode::OK);

    let me: CurrentUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(me.id, login.user.id);
    assert_eq!(me.username, "alice");
    assert_eq!(me.role, UserRole::Doctor);
    assert_eq!(me.token_type, "access");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = create_test_app();
    register_and_login(&app, "bob", "receptionist").await;

    let (status, body) = post_json(
        &app,
        "/api/v1/register",
        json!({ "username": "bob", "password": "another1", "role": "doctor" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code.as_deref(), Some("USER_EXISTS"));
}

#[tokio::test]
async fn test_register_unknown_role() {
    let app = create_test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/register",
        json!({ "username": "carol", "password": "hunter22", "role": "nurse" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code.as_deref(), Some("VALIDATION_FAILED"));
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = create_test_app();
    register_and_login(&app, "dave", "doctor").await;

    let (wrong_status, wrong_body) = post_json(
        &app,
        "/api/v1/login",
        json!({ "username": "dave", "password": "not-it" }),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &app,
        "/api/v1/login",
        json!({ "username": "nobody", "password": "hunter22" }),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let error: ErrorResponse = serde_json::from_slice(&wrong_body).unwrap();
    assert_eq!(error.code.as_deref(), Some("AUTHENTICATION_FAILED"));
}

#[tokio::test]
async fn test_refresh_flow() {
    let app = create_test_app();
    let login = register_and_login(&app, "erin", "receptionist").await;

    let (status, body) = post_json(
        &app,
        "/api/v1/refresh",
        json!({ "refresh_token": login.refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let refreshed: RefreshResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(refreshed.expires_in, 60);

    let (status, body) = get_me(&app, &refreshed.access_token).await;
    assert_eq!(status, StatusCode::OK);
    let me: CurrentUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(me.id, login.user.id);
    assert_eq!(me.role, UserRole::Receptionist);
    assert_eq!(me.token_type, "access");
}

#[tokio::test]
async fn test_me_accepts_refresh_token() {
    let app = create_test_app();
    let login = register_and_login(&app, "frank", "doctor").await;

    let (status, body) = get_me(&app, &login.refresh_token).await;
    assert_eq!(status, StatusCode::OK);

    let me: CurrentUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(me.id, login.user.id);
    assert_eq!(me.token_type, "refresh");
}

#[tokio::test]
async fn test_refresh_with_bad_token() {
    let app = create_test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/refresh",
        json!({ "refresh_token": "not.a.token" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code.as_deref(), Some("BAD_CLAIM"));
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = create_test_app();

    let request = Request::builder()
        .uri("/api/v1/me")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code.as_deref(), Some("MISSING_AUTH"));
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let app = create_test_app();

    for uri in ["/api/health", "/api/openapi.json"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
    }
}
