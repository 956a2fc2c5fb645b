//! Redis Verification Token Store
//!
//! One-shot tokens for email verification, forgot password, and email
//! change. Every entry is written with the short verification TTL and
//! deleted on first successful use.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::keys;
use crate::domain::{EmailChangeRequest, VerificationTokenStore};
use crate::shared::error::AppError;

const FIELD_EMAIL: &str = "email";
const FIELD_TOKEN: &str = "token";

/// Redis implementation of [`VerificationTokenStore`].
#[derive(Clone)]
pub struct RedisVerificationStore {
    redis: ConnectionManager,
    token_ttl: Duration,
}

impl RedisVerificationStore {
    pub fn new(redis: ConnectionManager, token_ttl: Duration) -> Self {
        Self { redis, token_ttl }
    }
}

#[async_trait]
impl VerificationTokenStore for RedisVerificationStore {
    async fn create_email_verification_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let key = keys::email_verification(user_id);

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, token, self.token_ttl.as_secs())
            .await?;

        Ok(())
    }

    async fn get_email_verification_token(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, AppError> {
        let key = keys::email_verification(user_id);

        let mut conn = self.redis.clone();
        let token: Option<String> = conn.get(&key).await?;

        Ok(token)
    }

    async fn delete_email_verification_token(&self, user_id: &str) -> Result<(), AppError> {
        let key = keys::email_verification(user_id);

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key).await?;

        Ok(())
    }

    async fn create_forgot_password_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let key = keys::forgot_password(token);

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, user_id, self.token_ttl.as_secs())
            .await?;

        Ok(())
    }

    async fn get_forgot_password_token(&self, token: &str) -> Result<Option<String>, AppError> {
        let key = keys::forgot_password(token);

        let mut conn = self.redis.clone();
        let user_id: Option<String> = conn.get(&key).await?;

        Ok(user_id)
    }

    async fn delete_forgot_password_token(&self, token: &str) -> Result<(), AppError> {
        let key = keys::forgot_password(token);

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key).await?;

        Ok(())
    }

    async fn create_email_change_request(
        &self,
        user_id: &str,
        request: &EmailChangeRequest,
    ) -> Result<(), AppError> {
        let key = keys::email_change(user_id);
        let fields = [
            (FIELD_EMAIL, request.new_email.clone()),
            (FIELD_TOKEN, request.token.clone()),
        ];

        let mut conn = self.redis.clone();
        conn.hset_multiple::<_, _, _, ()>(&key, &fields).await?;
        conn.expire::<_, ()>(&key, self.token_ttl.as_secs() as i64)
            .await?;

        Ok(())
    }

    async fn get_email_change_request(
        &self,
        user_id: &str,
    ) -> Result<Option<EmailChangeRequest>, AppError> {
        let key = keys::email_change(user_id);

        let mut conn = self.redis.clone();
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        Ok(Some(EmailChangeRequest {
            new_email: fields.get(FIELD_EMAIL).cloned().unwrap_or_default(),
            token: fields.get(FIELD_TOKEN).cloned().unwrap_or_default(),
        }))
    }

    async fn delete_email_change_request(&self, user_id: &str) -> Result<(), AppError> {
        let key = keys::email_change(user_id);

        let mut conn = self.redis.clone();
        conn.del::<_, ()>(&key).await?;

        Ok(())
    }
}
