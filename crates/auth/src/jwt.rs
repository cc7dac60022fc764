//! JWT session tokens.
//!
//! Tokens are stateless HS256 JWTs carrying the user id and an absolute
//! expiry. There is no revocation list: a token stays valid until `exp`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use ledger_core::types::UserId;

/// Token lifetime used by the API.
pub const DEFAULT_EXPIRY_HOURS: i64 = 24;

/// Reasons a bearer token is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token identity claim is missing or invalid")]
    ClaimMissing,
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::MissingRequiredClaim(_) => TokenError::ClaimMissing,
            _ => TokenError::Malformed,
        }
    }
}

/// Time source for issuing and checking expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock with second resolution, for expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            secs: AtomicI64::new(start.timestamp()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.secs.store(at.timestamp(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}

/// JWT claims payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub user_id: UserId,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// JWT ID (unique identifier for this token).
    pub jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Create claims for a user issued at `now`.
    pub fn new(user_id: UserId, now: DateTime<Utc>, expiry_hours: i64) -> Self {
        Self {
            user_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Configuration for JWT authentication.
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token expiry duration in hours.
    pub expiry_hours: i64,
    /// Issuer claim.
    pub issuer: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours: DEFAULT_EXPIRY_HOURS,
            issuer: None,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiry_hours", &self.expiry_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Issues and validates session tokens under the process-wide signing key.
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtAuth {
    /// Create a new JWT authenticator on the wall clock.
    pub fn new(config: JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against `clock` below, not by the library.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        if let Some(ref iss) = config.issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            encoding_key,
            decoding_key,
            config,
            validation,
            clock,
        }
    }

    /// Issue a token for `user_id`, valid for the configured number of hours.
    pub fn create_token(&self, user_id: UserId) -> Result<String, TokenError> {
        let mut claims = Claims::new(user_id, self.clock.now(), self.config.expiry_hours);
        claims.iss = self.config.issuer.clone();
        self.create_token_with_claims(&claims)
    }

    /// Create a token with custom claims.
    pub fn create_token_with_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token and return its claims.
    ///
    /// The identity claim is checked by hand so that a token with a missing
    /// or non-integer `user_id` reports `ClaimMissing` rather than `Malformed`.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;
        let raw = data.claims;

        let user_id = raw
            .get("user_id")
            .and_then(Value::as_i64)
            .ok_or(TokenError::ClaimMissing)?;
        let exp = raw
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(TokenError::ClaimMissing)?;

        if self.clock.now().timestamp() >= exp {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            user_id,
            iat: raw.get("iat").and_then(Value::as_i64).unwrap_or_default(),
            exp,
            jti: raw
                .get("jti")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            iss: raw.get("iss").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// Validate a token and return only the embedded user id.
    pub fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        self.validate_token(token).map(|c| c.user_id)
    }

    pub fn expiry_hours(&self) -> i64 {
        self.config.expiry_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn create_test_auth(clock: Arc<ManualClock>) -> JwtAuth {
        JwtAuth::with_clock(JwtConfig::new("test-secret-key-12345"), clock)
    }

    #[test]
    fn test_create_and_validate_token() {
        let clock = Arc::new(ManualClock::new(start()));
        let auth = create_test_auth(clock);

        let token = auth.create_token(42).unwrap();
        let claims = auth.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_token_valid_until_expiry_instant() {
        let clock = Arc::new(ManualClock::new(start()));
        let auth = create_test_auth(clock.clone());
        let token = auth.create_token(7).unwrap();

        clock.advance(Duration::hours(24) - Duration::seconds(1));
        assert_eq!(auth.validate(&token), Ok(7));

        clock.advance(Duration::seconds(1));
        assert_eq!(auth.validate(&token), Err(TokenError::Expired));

        clock.advance(Duration::days(3));
        assert_eq!(auth.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token_is_malformed() {
        let auth = create_test_auth(Arc::new(ManualClock::new(start())));

        assert_eq!(auth.validate("invalid-token"), Err(TokenError::Malformed));
        assert_eq!(auth.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let ours = create_test_auth(clock.clone());
        let theirs = JwtAuth::with_clock(JwtConfig::new("some-other-secret"), clock);

        let token = theirs.create_token(1).unwrap();
        assert_eq!(ours.validate(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let auth = create_test_auth(clock.clone());
        let token = auth.create_token(1).unwrap();
        let other = auth.create_token(2).unwrap();

        // Header and signature from token 1, payload from token 2.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(auth.validate(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_wrong_claim_type_is_claim_missing() {
        let clock = Arc::new(ManualClock::new(start()));
        let auth = create_test_auth(clock);
        let key = EncodingKey::from_secret(b"test-secret-key-12345");
        let exp = (start() + Duration::hours(1)).timestamp();

        let as_string = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "user_id": "42", "exp": exp }),
            &key,
        )
        .unwrap();
        assert_eq!(auth.validate(&as_string), Err(TokenError::ClaimMissing));

        let absent = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "exp": exp }),
            &key,
        )
        .unwrap();
        assert_eq!(auth.validate(&absent), Err(TokenError::ClaimMissing));
    }

    #[test]
    fn test_issuer_is_enforced_when_configured() {
        let clock = Arc::new(ManualClock::new(start()));
        let mut config = JwtConfig::new("test-secret-key-12345");
        config.issuer = Some("budgify-api".into());
        let auth = JwtAuth::with_clock(config, clock.clone());

        let token = auth.create_token(5).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("budgify-api"));

        let anonymous = create_test_auth(clock).create_token(5).unwrap();
        assert!(auth.validate(&anonymous).is_err());
    }
}
