//! Token authority configuration

use std::fmt;

use chrono::Duration;

use crate::error::ConfigError;

/// Default access token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;

/// Default refresh token lifetime (7 days)
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on either token lifetime (10 years)
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Secret and lifetimes a [`TokenIssuer`](crate::TokenIssuer) is built from
///
/// Callers own where the secret comes from; nothing in this crate reads the
/// process environment.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl AuthConfig {
    pub fn new(secret: impl Into<Vec<u8>>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Config with the default lifetimes
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(
            secret,
            Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
        )
    }

    /// Reject an empty secret and lifetimes outside `1..=MAX_TTL_SECS` seconds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        for (name, ttl) in [("access", self.access_ttl), ("refresh", self.refresh_ttl)] {
            if ttl <= Duration::zero() {
                return Err(ConfigError::NonPositiveLifetime {
                    name,
                    seconds: ttl.num_seconds(),
                });
            }
            if ttl > Duration::seconds(MAX_TTL_SECS) {
                return Err(ConfigError::LifetimeTooLarge {
                    name,
                    seconds: ttl.num_seconds(),
                    max: MAX_TTL_SECS,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuthConfig::with_secret("secret");
        assert!(config.validate().is_ok());
        assert_eq!(config.access_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_ttl, Duration::days(7));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = AuthConfig::with_secret(Vec::<u8>::new());
        assert_eq!(config.validate(), Err(ConfigError::EmptySecret));
    }

    #[test]
    fn test_non_positive_lifetimes_rejected() {
        let config = AuthConfig::new("secret", Duration::zero(), Duration::hours(1));
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveLifetime {
                name: "access",
                seconds: 0
            })
        );

        let config = AuthConfig::new("secret", Duration::minutes(1), Duration::seconds(-5));
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveLifetime {
                name: "refresh",
                seconds: -5
            })
        );
    }

    #[test]
    fn test_oversized_lifetimes_rejected() {
        let config = AuthConfig::new(
            "secret",
            Duration::seconds(9_000_000_000_000),
            Duration::days(1),
        );
        assert_eq!(
            config.validate(),
            Err(ConfigError::LifetimeTooLarge {
                name: "access",
                seconds: 9_000_000_000_000,
                max: MAX_TTL_SECS,
            })
        );

        let config = AuthConfig::new(
            "secret",
            Duration::minutes(15),
            Duration::seconds(MAX_TTL_SECS + 1),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LifetimeTooLarge { name: "refresh", .. })
        ));

        let config = AuthConfig::new(
            "secret",
            Duration::minutes(15),
            Duration::seconds(MAX_TTL_SECS),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig::with_secret("super-secret-value");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("<redacted>"));
    }
}
