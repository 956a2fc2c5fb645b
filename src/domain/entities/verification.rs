//! One-shot verification token store trait.
//!
//! Covers the three transient token flows: email verification (keyed by
//! user), forgot password (keyed by the token itself), and email change
//! (keyed by user, carrying the candidate address). All entries live for
//! five minutes and are deleted on first successful use.

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Pending email change: the candidate address and the token that must be
/// presented to commit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChangeRequest {
    pub new_email: String,
    pub token: String,
}

/// Store trait for one-shot tokens.
///
/// Deletions are idempotent; a missing key on delete is success.
#[async_trait]
pub trait VerificationTokenStore: Send + Sync {
    /// Store (or overwrite) the email-verification token for a user.
    async fn create_email_verification_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<(), AppError>;

    /// Fetch the stored email-verification token for a user.
    async fn get_email_verification_token(&self, user_id: &str)
        -> Result<Option<String>, AppError>;

    /// Drop the email-verification token for a user.
    async fn delete_email_verification_token(&self, user_id: &str) -> Result<(), AppError>;

    /// Store a forgot-password token mapping back to its user.
    async fn create_forgot_password_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<(), AppError>;

    /// Resolve a forgot-password token to its user ID.
    async fn get_forgot_password_token(&self, token: &str) -> Result<Option<String>, AppError>;

    /// Drop a forgot-password token.
    async fn delete_forgot_password_token(&self, token: &str) -> Result<(), AppError>;

    /// Store (or overwrite) the pending email change for a user.
    async fn create_email_change_request(
        &self,
        user_id: &str,
        request: &EmailChangeRequest,
    ) -> Result<(), AppError>;

    /// Fetch the pending email change for a user.
    async fn get_email_change_request(
        &self,
        user_id: &str,
    ) -> Result<Option<EmailChangeRequest>, AppError>;

    /// Drop the pending email change for a user.
    async fn delete_email_change_request(&self, user_id: &str) -> Result<(), AppError>;
}
