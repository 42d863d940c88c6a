//! JWT (JSON Web Token) validation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

use crate::claims::{AuthInfo, TokenClaims};
use crate::error::AuthError;

/// The only algorithm tokens are signed and accepted with
pub(crate) const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Just enough of the JOSE header to see which algorithm a token claims
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Verify-only capability over the shared secret
///
/// Cannot mint tokens. Handed to request gates that only need to check them.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier using HMAC-SHA256 (symmetric secret)
    ///
    /// jsonwebtoken only checks the signature. Expiration is checked here
    /// against a signed `exp`, so pre-1970 values still count as expired.
    /// Issuer, audience and not-before are not part of these tokens and are
    /// not checked.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validate a token and return the identity it carries
    pub fn authorize(&self, token: &str) -> Result<AuthInfo, AuthError> {
        self.authorize_at(token, Utc::now())
    }

    pub(crate) fn authorize_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthInfo, AuthError> {
        let claims = self.decode_at(token, now)?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::BadClaim(format!("exp {} is out of range", claims.exp)))?;

        Ok(AuthInfo {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
            expires_at,
            kind: claims.kind,
        })
    }

    /// Full parse/validate pipeline shared by authorize and refresh
    pub(crate) fn decode_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, AuthError> {
        // Refuse foreign algorithms before the secret is touched
        check_algorithm(token)?;

        let raw = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::from(e)
            })?
            .claims;

        // An expired token reports TokenExpired even when its other claims are bad
        let raw_exp = raw.get("exp").and_then(serde_json::Value::as_i64);
        if raw_exp.is_some_and(|exp| exp <= now.timestamp()) {
            return Err(AuthError::TokenExpired);
        }

        let claims: TokenClaims =
            serde_json::from_value(raw).map_err(|e| AuthError::BadClaim(e.to_string()))?;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }

        if claims.username.is_empty() {
            return Err(AuthError::BadClaim(
                "username must not be empty".to_string(),
            ));
        }

        debug!(subject = %claims.sub, kind = %claims.kind, "Token verified");
        Ok(claims)
    }
}

fn check_algorithm(token: &str) -> Result<(), AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::BadClaim(
            "token must have three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| AuthError::BadClaim(format!("header is not base64url: {}", e)))?;
    let header: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::BadClaim(format!("header is not valid JSON: {}", e)))?;

    if header.alg != "HS256" {
        return Err(AuthError::AuthorizationFailed(format!(
            "wrong signing algorithm '{}'",
            header.alg
        )));
    }

    Ok(())
}
