//! Token Validation Middleware
//!
//! Bearer-token middleware for protected routes. A JWT is never trusted
//! on signature alone: the matching KV presence record must exist, which
//! is what makes synchronous revocation (deleting the key) effective.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::application::services::TokenError;
use crate::domain::{AccessTokenRecord, RefreshTokenRecord, SessionStore};
use crate::infrastructure::cache::RedisSessionStore;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("no token provided".into()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::BadRequest("bad authorization header format".into()))
}

/// Validates access tokens: JWT signature and expiry, then the KV
/// presence record. The parsed token is inserted into request extensions.
pub async fn validate_access_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let value = bearer_token(&request)?;

    let (token, valid) = state.token_service.parse_access(value).map_err(|e| match e {
        TokenError::Invalid => AppError::Unauthorized("invalid token".into()),
        TokenError::Encoding(msg) => AppError::Internal(msg),
    })?;
    if !valid {
        return Err(AppError::Unauthorized("invalid token".into()));
    }

    let store = RedisSessionStore::new(state.redis.clone());
    let exists = store
        .check_access_token(&AccessTokenRecord {
            jti: token.jti.clone(),
            user_id: token.user_id.clone(),
            session_id: token.session_id.clone(),
        })
        .await?;

    if !exists {
        return Err(AppError::Unauthorized("invalid token".into()));
    }

    request.extensions_mut().insert(token);

    Ok(next.run(request).await)
}

/// Validates refresh tokens; same dual validation under the refresh key.
pub async fn validate_refresh_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let value = bearer_token(&request)?;

    let (token, valid) = state
        .token_service
        .parse_refresh(value)
        .map_err(|e| match e {
            TokenError::Invalid => AppError::Unauthorized("invalid token".into()),
            TokenError::Encoding(msg) => AppError::Internal(msg),
        })?;
    if !valid {
        return Err(AppError::Unauthorized("invalid token".into()));
    }

    let store = RedisSessionStore::new(state.redis.clone());
    let exists = store
        .check_refresh_token(&RefreshTokenRecord {
            jti: token.jti.clone(),
            user_id: token.user_id.clone(),
            session_id: token.session_id.clone(),
        })
        .await?;

    if !exists {
        return Err(AppError::Unauthorized("invalid token".into()));
    }

    request.extensions_mut().insert(token);

    Ok(next.run(request).await)
}
