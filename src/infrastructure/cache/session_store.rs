//! Redis Session Store
//!
//! Session hashes with TTL, the per-user session index set, and the
//! access/refresh token presence records. All operations are standalone
//! commands; cross-key consistency belongs to the services.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::warn;

use super::keys;
use crate::domain::{AccessTokenRecord, RefreshTokenRecord, Session, SessionStore};
use crate::shared::error::AppError;

const FIELD_CLIENT: &str = "client";
const FIELD_IP: &str = "ip";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_UPDATED_AT: &str = "updated_at";

/// Redis implementation of [`SessionStore`].
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn parse_timestamp(value: Option<&String>, field: &str) -> Result<DateTime<Utc>, AppError> {
        let raw = value
            .ok_or_else(|| AppError::Internal(format!("session hash missing {}", field)))?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::Internal(format!("malformed session {}: {}", field, e)))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create_session(&self, session: &Session, ttl: Duration) -> Result<(), AppError> {
        let key = keys::session(&session.user_id, &session.id);
        let fields = [
            (FIELD_CLIENT, session.client_id.clone()),
            (FIELD_IP, session.ip_address.clone()),
            (FIELD_CREATED_AT, session.created_at.to_rfc3339()),
            (FIELD_UPDATED_AT, session.updated_at.to_rfc3339()),
        ];

        let mut conn = self.redis.clone();
        conn.hset_multiple::<_, _, _, ()>(&key, &fields).await?;
        conn.expire::<_, ()>(&key, ttl.as_secs() as i64).await?;

        Ok(())
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, AppError> {
        let key = keys::session(user_id, session_id);

        let mut conn = self.redis.clone();
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        Ok(Some(Session {
            id: session_id.to_string(),
            user_id: user_id.to_string(),
            client_id: fields.get(FIELD_CLIENT).cloned().unwrap_or_default(),
            ip_address: fields.get(FIELD_IP).cloned().unwrap_or_default(),
            created_at: Self::parse_timestamp(fields.get(FIELD_CREATED_AT), FIELD_CREATED_AT)?,
            updated_at: Self::parse_timestamp(fields.get(FIELD_UPDATED_AT), FIELD_UPDATED_AT)?,
        }))
    }

    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError> {
        let index_key = keys::session_index(user_id);

        let mut conn = self.redis.clone();
        let session_ids: Vec<String> = conn.smembers(&index_key).await?;

        let mut sessions = Vec::with_capacity(session_ids.len());
        for session_id in session_ids {
            match self.get_session(user_id, &session_id).await? {
                Some(session) => sessions.push(session),
                // The hash expired under the index's nose: drop the
                // dangling ID and keep going.
                None => {
                    warn!(user_id, session_id, "removing expired session from index");
                    self.remove_user_session_from_index(user_id, &session_id)
                        .await?;
                }
            }
        }

        Ok(sessions)
    }

    async fn add_user_session_to_index(&self, session: &Session) -> Result<(), AppError> {
        let key = keys::session_index(&session.user_id);

        let mut conn = self.redis.clone();
        conn.sadd::<_, _, ()>(&key, &session.id).await?;

        Ok(())
    }

    async fn remove_user_session_from_index(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AppError> {
        let key = keys::session_index(user_id);

        let mut conn = self.redis.clone();
        conn.srem::<_, _, ()>(&key, session_id).await?;

        Ok(())
    }

    async fn update_session_expiry(
        &self,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let key = keys::session(&session.user_id, &session.id);

        let mut conn = self.redis.clone();
        let remaining: i64 = conn.ttl(&key).await?;

        conn.hset::<_, _, _, ()>(&key, FIELD_UPDATED_AT, Utc::now().to_rfc3339())
            .await?;

        // Only ever extend: a refresh must never shorten a session.
        if remaining < ttl.as_secs() as i64 {
            conn.expire::<_, ()>(&key, ttl.as_secs() as i64).await?;
        }

        Ok(())
    }

    async fn delete_session(&self, session: &Session) -> Result<(), AppError> {
        let key = keys::session(&session.user_id, &session.id);

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key).await?;

        Ok(())
    }

    async fn create_access_token(
        &self,
        token: &AccessTokenRecord,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let key = keys::access_token(&token.user_id, &token.session_id);

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, &token.jti, ttl.as_secs())
            .await?;

        Ok(())
    }

    async fn check_access_token(&self, token: &AccessTokenRecord) -> Result<bool, AppError> {
        let key = keys::access_token(&token.user_id, &token.session_id);

        let mut conn = self.redis.clone();
        let stored: Option<String> = conn.get(&key).await?;

        Ok(stored.as_deref() == Some(token.jti.as_str()))
    }

    async fn delete_access_token(&self, token: &AccessTokenRecord) -> Result<(), AppError> {
        let key = keys::access_token(&token.user_id, &token.session_id);

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key).await?;

        Ok(())
    }

    async fn create_refresh_token(
        &self,
        token: &RefreshTokenRecord,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let key = keys::refresh_token(&token.user_id, &token.session_id);

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, &token.jti, ttl.as_secs())
            .await?;

        Ok(())
    }

    async fn check_refresh_token(&self, token: &RefreshTokenRecord) -> Result<bool, AppError> {
        let key = keys::refresh_token(&token.user_id, &token.session_id);

        let mut conn = self.redis.clone();
        let stored: Option<String> = conn.get(&key).await?;

        Ok(stored.as_deref() == Some(token.jti.as_str()))
    }

    async fn delete_refresh_token(&self, token: &RefreshTokenRecord) -> Result<(), AppError> {
        let key = keys::refresh_token(&token.user_id, &token.session_id);

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key).await?;

        Ok(())
    }
}
