//! Stateless HS256 token issue and verification.
//!
//! Wire format: `base64url(header).base64url(payload).base64url(HMAC-SHA256)` with header
//! `{"typ":"JWT","alg":"HS256"}`. Verification is pinned to HS256: a token whose header
//! claims any other algorithm is rejected, never re-interpreted.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::warn;
use ulid::Ulid;

use super::claims::Claims;
use super::clock::Clock;

/// Library default token lifetime (1 hour).
pub const DEFAULT_TTL_SECS: u64 = 3600;

const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

/// Why a token could not be issued or verified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token secret is not configured")]
    MissingSecret,
    /// Wrong part count, bad encoding, unparsable payload or a missing `exp`
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    /// Header names an algorithm other than HS256
    #[error("token algorithm not accepted")]
    AlgorithmMismatch,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Secret and lifetime for a [`TokenService`].
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_secs: u64,
}

impl TokenConfig {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    #[must_use]
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Issues and verifies signed tokens.
///
/// Construct once at start-up and share by `Arc`; the keys and validation rules are
/// immutable afterwards.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if config.secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            warn!(
                secret_len = config.secret.len(),
                "Token secret is shorter than recommended (32 bytes)"
            );
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl_secs: config.ttl_secs,
            clock,
        })
    }

    #[must_use]
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Sign `claims`, stamping `iat = now`, `exp = now + ttl` and a fresh `jti`.
    pub fn issue(&self, mut claims: Claims) -> Result<String, TokenError> {
        let now = self.clock.now_secs();
        for reserved in ["iat", "exp", "jti"] {
            claims.extra.remove(reserved);
        }
        claims.iat = Some(now);
        claims.exp = Some(now.saturating_add(self.ttl_secs));
        claims.jti = Some(Ulid::new().to_string());

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check structure, signature, algorithm and expiry; return the claims on success.
    ///
    /// A token is still valid in the second its `exp` names.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| map_jwt_error(e.kind()))?;
        let claims = data.claims;

        let exp = claims.exp.ok_or(TokenError::Malformed)?;
        if exp < self.clock.now_secs() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::AlgorithmMismatch
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
