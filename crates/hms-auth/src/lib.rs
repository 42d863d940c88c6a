//! Token authority for the hospital records backend
//!
//! Issues, validates and refreshes HS256-signed bearer tokens. Two capability
//! types split the work: [`TokenVerifier`] only validates, [`TokenIssuer`]
//! also mints access/refresh pairs.

pub mod claims;
pub mod config;
pub mod error;
pub mod issuer;
pub mod jwt;
pub mod password;

pub use claims::{AuthInfo, Principal, Role, TokenClaims, TokenKind, TokenPair};
pub use config::AuthConfig;
pub use error::{AuthError, ConfigError, IssueError, RefreshError};
pub use issuer::TokenIssuer;
pub use jwt::TokenVerifier;
pub use password::{
    authenticate, hash_password, verify_against_dummy, verify_password, PasswordError,
};

// Re-export useful types
pub use jsonwebtoken::Algorithm;
