//! Session Handlers
//!
//! Token rotation and session management for the authenticated user.

use axum::{extract::State, Extension, Json};

use crate::application::dto::response::{
    AccessTokenResponse, ListSessionsResponse, RefreshTokenResponse, SuccessResponse,
    UserSessionResponse,
};
use crate::application::services::{AccessToken, RefreshToken, SessionService};
use crate::domain::Session;
use crate::shared::error::AppError;
use crate::startup::AppState;

use super::session_service;

/// List the user's live sessions
///
/// GET /api/v1/me/session
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<ListSessionsResponse>, AppError> {
    let sessions = session_service(&state).list_sessions(&access_token).await?;

    let sessions = sessions
        .into_iter()
        .map(|s| UserSessionResponse::from_session(s, &access_token.session_id))
        .collect();

    Ok(Json(ListSessionsResponse {
        success: true,
        sessions,
    }))
}

/// Revoke the current session
///
/// DELETE /api/v1/me/session
pub async fn end_current_session(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<SuccessResponse>, AppError> {
    let session = Session::new(
        access_token.session_id.clone(),
        access_token.user_id.clone(),
        String::new(),
        String::new(),
    );

    session_service(&state).remove_session(&session).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Revoke every session except the current one
///
/// DELETE /api/v1/me/session/other
pub async fn end_other_sessions(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<SuccessResponse>, AppError> {
    let current = Session::new(
        access_token.session_id.clone(),
        access_token.user_id.clone(),
        String::new(),
        String::new(),
    );

    session_service(&state)
        .remove_all_other_sessions(&current)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Trade the access token for a refresh token on the same session
///
/// POST /api/v1/me/session/refresh_token
pub async fn generate_refresh_token(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let refresh_token = session_service(&state)
        .generate_refresh_token(&access_token)
        .await?;

    Ok(Json(RefreshTokenResponse {
        success: true,
        refresh_token,
    }))
}

/// Trade the refresh token for a fresh access token
///
/// POST /api/v1/me/session/access_token
pub async fn generate_access_token(
    State(state): State<AppState>,
    Extension(refresh_token): Extension<RefreshToken>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let access_token = session_service(&state)
        .generate_access_token(&refresh_token)
        .await?;

    Ok(Json(AccessTokenResponse {
        success: true,
        access_token,
    }))
}
