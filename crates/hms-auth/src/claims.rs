//! Claim model carried inside every signed token

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IssueError;

/// Staff role embedded in a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Receptionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            other => Err(format!(
                "unknown role '{}', expected 'doctor' or 'receptionist'",
                other
            )),
        }
    }
}

/// Discriminates the two tokens minted at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "access-token")]
    Access,
    #[serde(rename = "refresh-token")]
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// The authenticated identity a token speaks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}

/// JWT payload
///
/// Decoding into this struct is the single place where claim shape is
/// checked: a missing field, a non-UUID `sub`, an unknown `role` or `type`
/// all fail deserialization with a message naming the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    /// Expiration time (Unix seconds)
    pub exp: i64,
    /// Issued at (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl TokenClaims {
    pub fn new(
        principal: &Principal,
        kind: TokenKind,
        validity: Duration,
    ) -> Result<Self, IssueError> {
        Self::issued_at(principal, kind, validity, Utc::now())
    }

    pub(crate) fn issued_at(
        principal: &Principal,
        kind: TokenKind,
        validity: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, IssueError> {
        let expires_at = now
            .checked_add_signed(validity)
            .ok_or(IssueError::ExpiryOutOfRange {
                kind,
                seconds: validity.num_seconds(),
            })?;

        Ok(Self {
            sub: principal.id,
            username: principal.username.clone(),
            role: principal.role,
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
            kind,
        })
    }

    /// Expired unless `exp` is strictly after `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.sub, self.username.clone(), self.role)
    }
}

/// Validated view of a token handed to request handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl AuthInfo {
    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }
}

/// Access and refresh token minted together at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal::new(
            Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap(),
            "alice",
            Role::Doctor,
        )
    }

    #[test]
    fn test_claims_wire_format() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let claims =
            TokenClaims::issued_at(&alice(), TokenKind::Refresh, Duration::minutes(1), now)
                .unwrap();

        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["sub"], "11111111-1111-1111-1111-111111111111");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "doctor");
        assert_eq!(json["exp"], 1_700_000_060);
        assert_eq!(json["iat"], 1_700_000_000);
        assert_eq!(json["type"], "refresh-token");
    }

    #[test]
    fn test_claims_without_iat_decode() {
        let json = serde_json::json!({
            "sub": "11111111-1111-1111-1111-111111111111",
            "username": "bob",
            "role": "receptionist",
            "exp": 1_700_000_000,
            "type": "access-token",
        });

        let claims: TokenClaims = serde_json::from_value(json).unwrap();
        assert_eq!(claims.iat, None);
        assert_eq!(claims.role, Role::Receptionist);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = serde_json::json!({
            "sub": "11111111-1111-1111-1111-111111111111",
            "username": "bob",
            "role": "nurse",
            "exp": 1_700_000_000,
            "type": "access-token",
        });

        let err = serde_json::from_value::<TokenClaims>(json).unwrap_err();
        assert!(err.to_string().contains("nurse"));
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let claims =
            TokenClaims::issued_at(&alice(), TokenKind::Access, Duration::zero(), now).unwrap();

        assert!(claims.is_expired_at(now));
        assert!(!claims.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_pre_epoch_expiry_is_negative() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let claims =
            TokenClaims::issued_at(&alice(), TokenKind::Access, Duration::days(-30_000), now)
                .unwrap();

        assert!(claims.exp < 0);
        assert!(claims.is_expired_at(now));
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let result = TokenClaims::issued_at(
            &alice(),
            TokenKind::Refresh,
            Duration::seconds(9_000_000_000_000),
            now,
        );

        assert!(matches!(
            result,
            Err(IssueError::ExpiryOutOfRange {
                kind: TokenKind::Refresh,
                seconds: 9_000_000_000_000,
            })
        ));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!("receptionist".parse::<Role>().unwrap(), Role::Receptionist);
        assert!("Doctor".parse::<Role>().is_err());
        assert_eq!(Role::Receptionist.to_string(), "receptionist");
    }
}
