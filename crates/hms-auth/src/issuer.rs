//! Token issuance and refresh

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::{debug, warn};

use crate::claims::{AuthInfo, Principal, TokenClaims, TokenKind, TokenPair};
use crate::config::AuthConfig;
use crate::error::{AuthError, ConfigError, IssueError, RefreshError};
use crate::jwt::{TokenVerifier, SIGNING_ALGORITHM};

/// Issuing capability: mints access/refresh pairs and exchanges refresh
/// tokens for new access tokens
///
/// Holds no mutable state, so one instance can be shared across tasks
/// behind an `Arc`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer with the lifetimes taken as given
    ///
    /// Non-positive lifetimes produce tokens that are already expired when
    /// minted. Services should go through [`TokenIssuer::from_config`].
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            verifier: TokenVerifier::new(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Build an issuer from validated configuration
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            &config.secret,
            config.access_ttl,
            config.refresh_ttl,
        ))
    }

    /// Verify-only capability over the same secret
    pub fn verifier(&self) -> TokenVerifier {
        self.verifier.clone()
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mint an access token and a refresh token for `principal`
    ///
    /// Fails only when signing fails or a lifetime pushes `exp` past the
    /// representable time range.
    pub fn tokenize(&self, principal: &Principal) -> Result<TokenPair, IssueError> {
        let now = Utc::now();

        let access_token = self.sign(&TokenClaims::issued_at(
            principal,
            TokenKind::Access,
            self.access_ttl,
            now,
        )?)?;
        let refresh_token = self.sign(&TokenClaims::issued_at(
            principal,
            TokenKind::Refresh,
            self.refresh_ttl,
            now,
        )?)?;

        debug!(subject = %principal.id, role = %principal.role, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn authorize(&self, token: &str) -> Result<AuthInfo, AuthError> {
        self.verifier.authorize(token)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The presented token is not required to be a refresh token: an
    /// unexpired access token is exchanged as well. Callers must only pass
    /// the refresh token they got from [`TokenIssuer::tokenize`]. The refresh
    /// token itself is not rotated and stays valid until its own expiry.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, RefreshError> {
        self.refresh_at(refresh_token, Utc::now())
    }

    pub(crate) fn refresh_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, RefreshError> {
        let claims = self.verifier.decode_at(refresh_token, now)?;

        if claims.kind != TokenKind::Refresh {
            warn!(
                subject = %claims.sub,
                "Refresh exchange presented an {} token", claims.kind
            );
        }

        let access = TokenClaims::issued_at(
            &claims.principal(),
            TokenKind::Access,
            self.access_ttl,
            now,
        )?;
        let token = self.sign(&access)?;

        debug!(subject = %claims.sub, "Refreshed access token");
        Ok(token)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, IssueError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key).map_err(|source| {
            IssueError::Signing {
                kind: claims.kind,
                source,
            }
        })
    }
}
