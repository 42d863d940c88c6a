use chrono::{DateTime, Utc};
use hms_auth::{AuthInfo, Role, TokenKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::UserRecord;

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Doctor,
    Receptionist,
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Doctor => UserRole::Doctor,
            Role::Receptionist => UserRole::Receptionist,
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Doctor => Role::Doctor,
            UserRole::Receptionist => Role::Receptionist,
        }
    }
}

/// Staff account as returned by the API (never includes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            role: record.role.into(),
            created_at: record.created_at,
        }
    }
}

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Login name (3-100 characters)
    pub username: String,
    /// Password (at least 6 characters)
    pub password: String,
    /// `doctor` or `receptionist`
    pub role: String,
}

impl RegisterRequest {
    /// Check field constraints, returning the parsed role
    pub fn validate(&self) -> Result<Role, String> {
        let username_len = self.username.chars().count();
        if !(3..=100).contains(&username_len) {
            return Err("username must be between 3 and 100 characters".to_string());
        }
        if self.password.chars().count() < 6 {
            return Err("password must be at least 6 characters".to_string());
        }
        self.role.parse::<Role>()
    }
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Refresh token exchange request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token exchange response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Identity carried by the caller's bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
    /// `access` or `refresh`
    pub token_type: String,
}

impl From<AuthInfo> for CurrentUser {
    fn from(info: AuthInfo) -> Self {
        Self {
            id: info.id,
            username: info.username,
            role: info.role.into(),
            expires_at: info.expires_at,
            token_type: match info.kind {
                TokenKind::Access => "access".to_string(),
                TokenKind::Refresh => "refresh".to_string(),
            },
        }
    }
}
