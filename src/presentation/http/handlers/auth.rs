//! Authentication Handlers

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SendVerificationRequest, VerificationParams,
};
use crate::application::dto::response::{LoginResponse, SuccessResponse};
use crate::application::services::AuthService;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::{auth_service, client_ip};

/// The only verification type the resend endpoint understands.
const VERIFICATION_TYPE_EMAIL: &str = "email.verify";

/// Register a new user
///
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    auth_service(&state)
        .register(&body.fullname, &body.email, &body.password)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Login with credentials
///
/// POST /api/v1/auth/login, client identified by `X-API-ClientID`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let client_id = headers
        .get("X-API-ClientID")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ip = client_ip(&headers);

    let access_token = auth_service(&state)
        .login(&body.email, &body.password, &client_id, &ip)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        require_tfa: false,
        access_token,
    }))
}

/// Redeem an email verification link
///
/// GET /api/v1/auth/verification?id=&token=
pub async fn verify_email(
    State(state): State<AppState>,
    Query(params): Query<VerificationParams>,
) -> Result<Json<SuccessResponse>, AppError> {
    if params.id.is_empty() || params.token.is_empty() {
        return Err(AppError::BadRequest("bad request".into()));
    }

    auth_service(&state)
        .verify_email(&params.id, &params.token)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Re-send an email verification token
///
/// POST /api/v1/auth/verification
pub async fn send_verification(
    State(state): State<AppState>,
    Json(body): Json<SendVerificationRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    if body.verification_type != VERIFICATION_TYPE_EMAIL {
        return Err(AppError::BadRequest("unknown verification type".into()));
    }

    auth_service(&state)
        .send_email_verification(&body.recipient)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Request a password-reset token
///
/// POST /api/v1/auth/password/forgot
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    auth_service(&state).forgot_password(&body.email).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Redeem a password-reset token
///
/// POST /api/v1/auth/password/reset
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    auth_service(&state)
        .reset_password(&body.token, &body.password)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}
