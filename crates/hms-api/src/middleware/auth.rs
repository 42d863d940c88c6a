//! Bearer token authentication middleware
//!
//! `require_auth` validates the `Authorization: Bearer <token>` header and
//! makes the decoded [`AuthInfo`] available to handlers via `Extension`.
//! `require_role` layers a role check on top of it.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use hms_auth::{AuthError, AuthInfo, Role, TokenVerifier};
use std::sync::Arc;
use tracing::{error, warn};

use crate::models::ErrorResponse;

pub type Rejection = (StatusCode, Json<ErrorResponse>);

/// Verification state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub verifier: Arc<TokenVerifier>,
}

impl JwtState {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

/// 401 response for a classified token or credential failure
pub fn unauthorized(err: &AuthError) -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(err.to_string(), err.code())),
    )
}

fn reject(message: &str, code: &str) -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message, code)),
    )
}

/// Pull the token out of an `Authorization` header value
///
/// Exactly two space-separated parts, scheme matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Some(token)
        }
        _ => None,
    }
}

/// Authentication gate for protected routes
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - The Authorization header is missing
/// - The header is not `Bearer <token>`
/// - The token fails validation (the body carries the failure code)
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| reject("Authorization header is missing", "MISSING_AUTH"))?;

    let token = bearer_token(header_value).ok_or_else(|| {
        reject(
            "Invalid authorization header format. Expected 'Bearer <token>'",
            "INVALID_AUTH_FORMAT",
        )
    })?;

    let info = state.verifier.authorize(token).map_err(|e| {
        warn!(code = e.code(), "Rejected bearer token: {}", e);
        unauthorized(&e)
    })?;

    request.extensions_mut().insert(info);

    Ok(next.run(request).await)
}

/// Role gate, layered inside [`require_auth`]
///
/// Only access tokens pass, and only for the expected role.
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let Some(info) = request.extensions().get::<AuthInfo>() else {
        error!("require_role used without require_auth");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(
                "Authentication context missing",
                "INTERNAL_ERROR",
            )),
        ));
    };

    if !info.is_access() {
        return Err(reject("Invalid token type", "INVALID_TOKEN_TYPE"));
    }

    if info.role != required {
        warn!(
            user = %info.username,
            role = %info.role,
            required = %required,
            "Role check failed"
        );
        return Err(reject("Unauthorized", "ROLE_MISMATCH"));
    }

    Ok(next.run(request).await)
}
