//! User Handlers
//!
//! Profile, email, password, picture, and account-deletion endpoints.

use axum::{
    extract::{Multipart, Query, State},
    http::{header::CONTENT_LENGTH, HeaderMap},
    Extension, Json,
};
use validator::Validate;

use crate::application::dto::request::{
    ChangePasswordRequest, DeleteAccountRequest, EmailChangeRequest, UpdateInfoRequest,
    VerificationParams,
};
use crate::application::dto::response::{
    CurrentEmailResponse, InfoDetailResponse, SuccessResponse,
};
use crate::application::services::{AccessToken, UserService};
use crate::domain::UserBioUpdate;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::user_service;

/// Upload ceiling for profile pictures, enforced before the multipart
/// body is touched.
const PICTURE_FILE_LIMIT: u64 = 200 * 1024;

/// PNG file signature
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Profile details of the authenticated user
///
/// GET /api/v1/me
pub async fn get_info(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<InfoDetailResponse>, AppError> {
    let bio = user_service(&state)
        .get_info_detail(&access_token.user_id)
        .await?;

    Ok(Json(InfoDetailResponse::from_bio(
        access_token.user_id.clone(),
        bio,
    )))
}

/// Update the profile
///
/// POST /api/v1/me
pub async fn update_info(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
    Json(body): Json<UpdateInfoRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    let update = UserBioUpdate {
        fullname: body.fullname,
        location: body.location,
        bio: body.bio,
        web: body.web,
    };

    user_service(&state)
        .update_info(&access_token.user_id, &update)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Current email address
///
/// GET /api/v1/me/email
pub async fn get_current_email(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<CurrentEmailResponse>, AppError> {
    let email = user_service(&state)
        .get_current_email(&access_token.user_id)
        .await?;

    Ok(Json(CurrentEmailResponse {
        success: true,
        email,
    }))
}

/// Start an email change
///
/// POST /api/v1/me/email
pub async fn request_email_change(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
    Json(body): Json<EmailChangeRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    user_service(&state)
        .request_email_change(&access_token.user_id, &body.email)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Redeem an email-change link
///
/// GET /api/v1/me/email/verification?id=&token= (no auth; the token is
/// the credential)
pub async fn verify_email_change(
    State(state): State<AppState>,
    Query(params): Query<VerificationParams>,
) -> Result<Json<SuccessResponse>, AppError> {
    if params.id.is_empty() || params.token.is_empty() {
        return Err(AppError::BadRequest("bad request".into()));
    }

    user_service(&state)
        .verify_email_change(&params.id, &params.token)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Rotate the password
///
/// POST /api/v1/me/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    user_service(&state)
        .change_password(
            &access_token.user_id,
            &body.password_current,
            &body.password,
        )
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Upload a profile picture
///
/// POST /api/v1/me/picture, multipart field `file`, PNG only
pub async fn set_picture(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<SuccessResponse>, AppError> {
    // Reject oversized bodies before any multipart parsing happens.
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if matches!(content_length, Some(len) if len > PICTURE_FILE_LIMIT) {
        return Err(AppError::PayloadTooLarge("file too large".into()));
    }

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("cannot parse file".into()))?
    {
        if field.name() == Some("file") {
            data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("cannot read file".into()))?,
            );
            break;
        }
    }
    let data = data.ok_or_else(|| AppError::BadRequest("cannot parse file".into()))?;

    if !data.starts_with(&PNG_MAGIC) {
        return Err(AppError::BadRequest("picture must be a .png file".into()));
    }

    user_service(&state)
        .set_profile_picture(&access_token.user_id, &data)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Remove the profile picture
///
/// DELETE /api/v1/me/picture
pub async fn delete_picture(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
) -> Result<Json<SuccessResponse>, AppError> {
    user_service(&state)
        .delete_profile_picture(&access_token.user_id)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Delete the account
///
/// POST /api/v1/me/delete
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(access_token): Extension<AccessToken>,
    Json(body): Json<DeleteAccountRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    body.validate().map_err(validation_error)?;

    user_service(&state)
        .delete_account(&access_token.user_id, &body.password)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}
