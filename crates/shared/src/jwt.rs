//! Session token signing and verification (HS256).
//!
//! The API only verifies. Issuing lives here so the identity callback and
//! tests agree on one claim layout.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::Claims;
use crate::config::JwtSettings;
use crate::types::UserId;

/// Session token settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared with the identity flow.
    pub secret: String,
    /// Lifetime of an issued session token.
    pub session_ttl: Duration,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

impl JwtConfig {
    /// Settings with a one hour session and no leeway.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            session_ttl: Duration::hours(1),
            leeway_secs: 0,
        }
    }

    /// Set the session lifetime. A negative value issues already-expired tokens.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the tolerated clock skew.
    #[must_use]
    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

impl From<&JwtSettings> for JwtConfig {
    fn from(settings: &JwtSettings) -> Self {
        let ttl = i64::try_from(settings.session_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::hours(1));
        Self::new(settings.secret.clone()).with_session_ttl(ttl)
    }
}

/// Why a token could not be issued or verified.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Bad signature, bad encoding or missing claims.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// `exp` is in the past.
    #[error("token has expired")]
    Expired,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("session_ttl", &self.config.session_ttl)
            .field("secret", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Build a service from its settings.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
        }
    }

    /// Issue a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Signing`] if the token cannot be encoded.
    pub fn issue(&self, user_id: UserId, name: Option<&str>, role: &str) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, name, role, Utc::now() + self.config.session_ttl);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verify a session token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Expired`] for an expired token and
    /// [`JwtError::Malformed`] for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.leeway = self.config.leeway_secs;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Malformed(e.to_string()),
            })
    }
}
