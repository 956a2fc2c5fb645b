//! HTTP Handlers
//!
//! Route handlers grouped by concern, plus the per-request service
//! constructors they share.

pub mod auth;
pub mod session;
pub mod user;

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::application::services::{
    AuthService, AuthServiceImpl, SessionService, SessionServiceImpl, UserService, UserServiceImpl,
};
use crate::infrastructure::cache::{RedisSessionStore, RedisVerificationStore};
use crate::infrastructure::repositories::{PgPasswordHistoryRepository, PgUserRepository};
use crate::startup::AppState;

/// Build the auth service from shared state.
pub(crate) fn auth_service(state: &AppState) -> impl AuthService {
    AuthServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgPasswordHistoryRepository::new(state.db.clone())),
        Arc::new(RedisSessionStore::new(state.redis.clone())),
        Arc::new(RedisVerificationStore::new(
            state.redis.clone(),
            state.verification_token_ttl(),
        )),
        state.token_service.clone(),
        state.mailer.clone(),
        state.log_producer.clone(),
    )
}

/// Build the session service from shared state.
pub(crate) fn session_service(state: &AppState) -> impl SessionService {
    SessionServiceImpl::new(
        Arc::new(RedisSessionStore::new(state.redis.clone())),
        state.token_service.clone(),
    )
}

/// Build the user service from shared state.
pub(crate) fn user_service(state: &AppState) -> impl UserService {
    UserServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgPasswordHistoryRepository::new(state.db.clone())),
        Arc::new(RedisSessionStore::new(state.redis.clone())),
        Arc::new(RedisVerificationStore::new(
            state.redis.clone(),
            state.verification_token_ttl(),
        )),
        state.mailer.clone(),
        state.settings.upload_dir.clone(),
    )
}

/// Best-effort client IP from proxy headers.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or_default()
        .trim()
        .to_string()
}
