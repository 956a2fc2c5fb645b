//! Request DTOs
//!
//! Data structures for API request bodies and query strings. Fields all
//! default to empty strings so that a missing field surfaces as a 422
//! field error rather than a body-decode failure.

use serde::Deserialize;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 128, message = "fullname must be 3-128 characters"))]
    pub fullname: String,

    #[serde(default)]
    #[validate(
        length(max = 128, message = "email must be at most 128 characters"),
        custom(function = "crate::shared::validation::validate_email_format")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(
        length(min = 8, max = 128, message = "password must be 8-128 characters"),
        custom(function = "crate::shared::validation::validate_password_strength")
    )]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        length(max = 128, message = "email must be at most 128 characters"),
        custom(function = "crate::shared::validation::validate_email_format")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
}

/// Verification link parameters (`?id=&token=`)
#[derive(Debug, Deserialize)]
pub struct VerificationParams {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub token: String,
}

/// Resend-verification request
#[derive(Debug, Deserialize, Validate)]
pub struct SendVerificationRequest {
    #[serde(default, rename = "type")]
    #[validate(length(
        min = 1,
        max = 32,
        message = "type must be at most 32 characters"
    ))]
    pub verification_type: String,

    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 128,
        message = "recipient must be at most 128 characters"
    ))]
    pub recipient: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(
        length(max = 128, message = "email must be at most 128 characters"),
        custom(function = "crate::shared::validation::validate_email_format")
    )]
    pub email: String,
}

/// Password-reset request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,

    #[serde(default)]
    #[validate(
        length(min = 8, max = 128, message = "password must be 8-128 characters"),
        custom(function = "crate::shared::validation::validate_password_strength")
    )]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInfoRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 128, message = "fullname must be 3-128 characters"))]
    pub fullname: String,

    #[serde(default)]
    #[validate(length(max = 128, message = "location must be at most 128 characters"))]
    pub location: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "bio must be at most 255 characters"))]
    pub bio: String,

    #[serde(default)]
    #[validate(length(max = 128, message = "web must be at most 128 characters"))]
    pub web: String,
}

/// Email change request
#[derive(Debug, Deserialize, Validate)]
pub struct EmailChangeRequest {
    #[serde(default)]
    #[validate(
        length(max = 128, message = "email must be at most 128 characters"),
        custom(function = "crate::shared::validation::validate_email_format")
    )]
    pub email: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(
        min = 8,
        max = 128,
        message = "password_current must be 8-128 characters"
    ))]
    pub password_current: String,

    #[serde(default)]
    #[validate(
        length(min = 8, max = 128, message = "password must be 8-128 characters"),
        custom(function = "crate::shared::validation::validate_password_strength")
    )]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Account deletion request
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
}
