//! Token Service
//!
//! HS256 JWT codec for access and refresh tokens. Claims carry the
//! session linkage (`user_id`, `session_id`) so validation can locate the
//! matching KV presence record in O(1); the JTI doubles as the presence
//! value. The signing secret is loaded once at startup and immutable for
//! the process lifetime.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::shared::security::generate_random_id;

/// Token errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signature does not verify, algorithm is not HMAC, or claims are
    /// malformed. An expired-but-well-signed token is NOT this error.
    #[error("invalid token")]
    Invalid,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl From<TokenError> for crate::shared::error::AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::Unauthorized("invalid token".to_string()),
            TokenError::Encoding(msg) => Self::Internal(msg),
        }
    }
}

/// JWT claims for both token kinds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Fresh 128-bit hex ID per mint, mirrored into the KV
    pub jti: String,
    pub user_id: String,
    pub session_id: String,
}

/// A minted or parsed access token.
///
/// Only `value`, `type` and `expired_at` go on the wire; the claim fields
/// feed the KV presence check.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub value: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub expired_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub jti: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    #[serde(skip_serializing)]
    pub session_id: String,
}

/// A minted or parsed refresh token. Same structure as [`AccessToken`],
/// stored under a distinct KV key.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken {
    pub value: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub expired_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub jti: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    #[serde(skip_serializing)]
    pub session_id: String,
}

/// JWT mint/parse service.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_life: Duration,
    refresh_token_life: Duration,
}

impl TokenService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            access_token_life: Duration::from_secs(settings.access_token_expiry_secs),
            refresh_token_life: Duration::from_secs(settings.refresh_token_expiry_secs),
        }
    }

    /// Lifetime of access tokens (also the TTL of their KV records).
    pub fn access_token_life(&self) -> Duration {
        self.access_token_life
    }

    /// Lifetime of refresh tokens (also the TTL of their KV records).
    pub fn refresh_token_life(&self) -> Duration {
        self.refresh_token_life
    }

    /// Mint an access token bound to a session.
    pub fn issue_access(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<AccessToken, TokenError> {
        let (value, claims, expired_at) = self.mint(user_id, session_id, self.access_token_life)?;
        Ok(AccessToken {
            value,
            token_type: "Bearer".to_string(),
            expired_at,
            jti: claims.jti,
            user_id: claims.user_id,
            session_id: claims.session_id,
        })
    }

    /// Mint a refresh token bound to a session.
    pub fn issue_refresh(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<RefreshToken, TokenError> {
        let (value, claims, expired_at) =
            self.mint(user_id, session_id, self.refresh_token_life)?;
        Ok(RefreshToken {
            value,
            token_type: "Bearer".to_string(),
            expired_at,
            jti: claims.jti,
            user_id: claims.user_id,
            session_id: claims.session_id,
        })
    }

    /// Parse an access token string.
    ///
    /// Returns the token together with a validity flag: `false` means the
    /// signature verifies but the token is expired, and callers must
    /// reject it. Everything else wrong with the string is
    /// [`TokenError::Invalid`].
    pub fn parse_access(&self, value: &str) -> Result<(AccessToken, bool), TokenError> {
        let (claims, valid) = self.parse(value)?;
        let token = AccessToken {
            value: value.to_string(),
            token_type: "Bearer".to_string(),
            expired_at: timestamp_to_datetime(claims.exp),
            jti: claims.jti,
            user_id: claims.user_id,
            session_id: claims.session_id,
        };
        Ok((token, valid))
    }

    /// Parse a refresh token string; same contract as [`Self::parse_access`].
    pub fn parse_refresh(&self, value: &str) -> Result<(RefreshToken, bool), TokenError> {
        let (claims, valid) = self.parse(value)?;
        let token = RefreshToken {
            value: value.to_string(),
            token_type: "Bearer".to_string(),
            expired_at: timestamp_to_datetime(claims.exp),
            jti: claims.jti,
            user_id: claims.user_id,
            session_id: claims.session_id,
        };
        Ok((token, valid))
    }

    fn mint(
        &self,
        user_id: &str,
        session_id: &str,
        life: Duration,
    ) -> Result<(String, Claims, DateTime<Utc>), TokenError> {
        let expired_at = Utc::now() + chrono::Duration::seconds(life.as_secs() as i64);

        let claims = Claims {
            exp: expired_at.timestamp(),
            jti: generate_random_id(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        };

        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok((value, claims, expired_at))
    }

    fn parse(&self, value: &str) -> Result<(Claims, bool), TokenError> {
        // Expiry is checked by hand below so that an expired token still
        // decodes and can be reported as (token, valid=false).
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(value, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;

        let valid = token_data.claims.exp > Utc::now().timestamp();
        Ok((token_data.claims, valid))
    }
}

fn timestamp_to_datetime(exp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(exp, 0).single().unwrap_or_else(Utc::now)
}
