//! Failure taxonomy for the token authority

use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use crate::claims::TokenKind;

/// Client-caused token and credential failures
///
/// Every variant ends up as `401 Unauthorized` at the HTTP boundary; the
/// variants exist so the boundary can log and report them distinctly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Credentials did not match a known account
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Token was refused for a reason other than its claims or signature,
    /// such as a foreign signing algorithm
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token is malformed or a claim is missing or has the wrong shape
    #[error("bad jwt claim: {0}")]
    BadClaim(String),

    /// `exp` is at or before the current time
    #[error("token is expired")]
    TokenExpired,

    /// Signature does not match the shared secret
    #[error("signature is invalid")]
    InvalidSignature,
}

impl AuthError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            AuthError::AuthorizationFailed(_) => "AUTHORIZATION_FAILED",
            AuthError::BadClaim(_) => "BAD_CLAIM",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAlgorithm => {
                AuthError::AuthorizationFailed("wrong signing algorithm".to_string())
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => AuthError::BadClaim(err.to_string()),
            _ => AuthError::AuthorizationFailed(err.to_string()),
        }
    }
}

/// Signing failure while minting a token
///
/// Points at a broken secret or key setup, never at the caller's input.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The encoder rejected the claims or key
    #[error("error while signing {kind} token: {source}")]
    Signing {
        kind: TokenKind,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    /// Issue time plus lifetime falls outside the representable time range
    #[error("{kind} token lifetime of {seconds}s overflows the expiry time")]
    ExpiryOutOfRange { kind: TokenKind, seconds: i64 },
}

/// Failure of a refresh exchange
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The presented token was rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The replacement access token could not be minted
    #[error(transparent)]
    Issue(#[from] IssueError),
}

/// Rejected token authority configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No signing secret was supplied
    #[error("JWT secret must not be empty")]
    EmptySecret,

    /// A token lifetime is zero or negative
    #[error("{name} lifetime must be positive, got {seconds}s")]
    NonPositiveLifetime { name: &'static str, seconds: i64 },

    /// A token lifetime exceeds the supported maximum
    #[error("{name} lifetime of {seconds}s exceeds the maximum of {max}s")]
    LifetimeTooLarge {
        name: &'static str,
        seconds: i64,
        max: i64,
    },
}
