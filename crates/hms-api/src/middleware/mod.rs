//! API Middleware
//!
//! Authentication and role gates for protected endpoints.

pub mod auth;

pub use auth::{require_auth, require_role, unauthorized, JwtState, Rejection};
