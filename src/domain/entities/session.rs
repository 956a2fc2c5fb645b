//! Session entity, token presence records, and the session store trait.
//!
//! Sessions live only in the expiring KV store, never in Postgres. A
//! session hash expires with its tokens; the per-user index set has no
//! TTL and is garbage-collected opportunistically on enumeration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::error::AppError;

/// A logical authenticated presence for one (user, client) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 128-bit random hex ID
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Caller-supplied client identifier (`X-API-ClientID`)
    pub client_id: String,

    /// Client IP address at login
    pub ip_address: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session record for login.
    pub fn new(id: String, user_id: String, client_id: String, ip_address: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            client_id,
            ip_address,
            created_at: now,
            updated_at: now,
        }
    }
}

/// KV presence record for an access token. Presence of a matching record
/// is the authoritative validity signal; the JWT signature alone is not
/// sufficient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenRecord {
    pub jti: String,
    pub user_id: String,
    pub session_id: String,
}

/// KV presence record for a refresh token, under a distinct key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub jti: String,
    pub user_id: String,
    pub session_id: String,
}

/// Store trait for sessions and token presence records.
///
/// The store offers no compound transactions; the services own cross-key
/// consistency. Every deletion is idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write all session fields and set the TTL.
    async fn create_session(&self, session: &Session, ttl: Duration) -> Result<(), AppError>;

    /// Fetch one session; `None` when the hash is empty or expired.
    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, AppError>;

    /// Enumerate the index set, fetching each session. Dangling IDs whose
    /// hash has expired are removed from the index on the way through.
    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError>;

    /// Add the session ID to the per-user index set.
    async fn add_user_session_to_index(&self, session: &Session) -> Result<(), AppError>;

    /// Remove a session ID from the per-user index set (idempotent).
    async fn remove_user_session_from_index(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AppError>;

    /// Touch `updated_at` and extend the TTL. The TTL is only ever
    /// extended: a refresh must never shorten a session.
    async fn update_session_expiry(&self, session: &Session, ttl: Duration)
        -> Result<(), AppError>;

    /// Delete the session hash (idempotent).
    async fn delete_session(&self, session: &Session) -> Result<(), AppError>;

    /// SETEX the access-token presence record.
    async fn create_access_token(
        &self,
        token: &AccessTokenRecord,
        ttl: Duration,
    ) -> Result<(), AppError>;

    /// Compare the stored JTI with the presented one. An absent key is a
    /// clean `false`, not an error.
    async fn check_access_token(&self, token: &AccessTokenRecord) -> Result<bool, AppError>;

    /// Delete the access-token key (idempotent).
    async fn delete_access_token(&self, token: &AccessTokenRecord) -> Result<(), AppError>;

    /// SETEX the refresh-token presence record.
    async fn create_refresh_token(
        &self,
        token: &RefreshTokenRecord,
        ttl: Duration,
    ) -> Result<(), AppError>;

    /// Compare the stored JTI with the presented one; absent key is `false`.
    async fn check_refresh_token(&self, token: &RefreshTokenRecord) -> Result<bool, AppError>;

    /// Delete the refresh-token key (idempotent).
    async fn delete_refresh_token(&self, token: &RefreshTokenRecord) -> Result<(), AppError>;
}
