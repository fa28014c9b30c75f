//! Bearer token verification and issuance.
//!
//! Tokens are HMAC-signed JWTs carrying `sub`, `roles`, `iat` and `exp`.
//! The verifier and the authentication service that mints tokens must agree
//! on the signing secret and algorithm, so `issue` lives next to `verify`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity claims extracted from a verified token. Never persisted; lives
/// for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated subject.
    pub sub: String,

    /// Role names granted to the subject.
    pub roles: Vec<String>,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiry, seconds since the Unix epoch. Mandatory; `now >= exp` makes
    /// the token invalid.
    pub exp: i64,
}

/// Why a token was rejected. All kinds surface as an anonymous context at
/// the filter layer, never as a hard failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed token")]
    Malformed,

    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("token expired")]
    Expired,

    #[error("token missing required claims")]
    MissingClaims,
}

/// Parse a configured algorithm name. Only the HMAC family is supported.
pub fn parse_algorithm(name: &str) -> Option<Algorithm> {
    match name {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        _ => None,
    }
}

/// Validates bearer tokens against a fixed signing secret.
///
/// Stateless; safe to share across requests behind an `Arc`.
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenVerifier {
    /// Build a verifier. The caller is responsible for rejecting an empty
    /// secret before this point (config validation does). `default_ttl` is
    /// the lifetime of tokens minted through [`issue`](Self::issue).
    pub fn new(secret: &str, algorithm: Algorithm, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Strict expiry: no clock-skew grace.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            validation,
            default_ttl,
        }
    }

    /// Verify a raw token (scheme prefix already stripped) and extract its
    /// claims.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::InvalidSignature => VerificationError::SignatureMismatch,
                ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => {
                    VerificationError::MissingClaims
                }
                _ => VerificationError::Malformed,
            },
        )?;

        if data.claims.sub.is_empty() {
            return Err(VerificationError::MissingClaims);
        }

        Ok(data.claims)
    }

    /// Mint a token this verifier will accept, with the configured default
    /// lifetime. Used by the collaborating authentication service; the
    /// gateway itself only verifies.
    pub fn issue(
        &self,
        subject: &str,
        roles: Vec<String>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_ttl(subject, roles, self.default_ttl)
    }

    /// Mint a token with an explicit lifetime.
    pub fn issue_with_ttl(
        &self,
        subject: &str,
        roles: Vec<String>,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();
        let claims = Claims {
            sub: subject.to_string(),
            roles,
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
