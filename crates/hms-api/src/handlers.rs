use axum::{extract::State, http::StatusCode, Extension, Json};
use hms_auth::{
    authenticate, hash_password, verify_against_dummy, AuthError, AuthInfo, RefreshError,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::middleware::{unauthorized, Rejection};
use crate::models::*;
use crate::store::{StoreError, UserRecord};
use crate::AppState;

fn internal_error(message: &str) -> Rejection {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message, "INTERNAL_ERROR")),
    )
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Register a staff account
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), Rejection> {
    let role = req.validate().map_err(|message| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(message, "VALIDATION_FAILED")),
        )
    })?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal_error("Failed to create user")
    })?;

    let record = UserRecord::new(req.username, password_hash, role);

    state
        .users
        .insert(record.clone())
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new(e.to_string(), "USER_EXISTS")),
            ),
            StoreError::Backend(_) => {
                error!("Create user error: {}", e);
                internal_error("Failed to create user")
            }
        })?;

    info!(user_id = %record.id, role = %record.role, "Registered user {}", record.username);

    Ok((StatusCode::CREATED, Json(User::from(&record))))
}

/// Log in and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Rejection> {
    debug!("Login attempt for {}", req.username);

    let record = state
        .users
        .find_by_username(&req.username)
        .await
        .map_err(|e| {
            error!("Login error: {}", e);
            internal_error("Login failed due to an internal error")
        })?;

    let invalid_credentials = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "invalid username or password",
                AuthError::AuthenticationFailed.code(),
            )),
        )
    };

    let Some(record) = record else {
        verify_against_dummy(&req.password);
        warn!("Login failed: unknown user {}", req.username);
        return Err(invalid_credentials());
    };

    if authenticate(&req.password, &record.password_hash).is_err() {
        warn!("Login failed: wrong password for {}", req.username);
        return Err(invalid_credentials());
    }

    let tokens = state.issuer.tokenize(&record.principal()).map_err(|e| {
        error!("Token issuance failed: {}", e);
        internal_error("Login failed due to an internal error")
    })?;

    info!(user_id = %record.id, "User {} logged in", record.username);

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: User::from(&record),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Refresh token rejected", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, Rejection> {
    let access_token = state
        .issuer
        .refresh(&req.refresh_token)
        .map_err(|e| match e {
            RefreshError::Auth(err) => {
                warn!(code = err.code(), "Refresh rejected: {}", err);
                unauthorized(&err)
            }
            RefreshError::Issue(err) => {
                error!("Token issuance failed: {}", err);
                internal_error("Refresh failed due to an internal error")
            }
        })?;

    Ok(Json(RefreshResponse {
        access_token,
        expires_in: state.issuer.access_ttl().num_seconds(),
    }))
}

/// Identity of the authenticated caller
///
/// Accepts both token kinds; `token_type` in the response says which one was
/// presented.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(Extension(info): Extension<AuthInfo>) -> Json<CurrentUser> {
    Json(info.into())
}
