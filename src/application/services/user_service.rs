//! User Service
//!
//! Profile management: bio read/update, email change, password change,
//! profile picture storage, and account deletion.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::GenericImageView;
use tracing::{info, warn};

use crate::domain::{
    AccessTokenRecord, EmailChangeRequest, PasswordHistoryRepository, RefreshTokenRecord, Session,
    SessionStore, UserBio, UserBioUpdate, UserRepository, VerificationTokenStore,
    PASSWORD_REUSE_WINDOW,
};
use crate::infrastructure::email::{templates, EmailSender};
use crate::shared::error::AppError;
use crate::shared::security::{check_password, generate_random_id, hash_password, tokens_match};

/// Base of the email-change confirmation link.
const EMAIL_CHANGE_LINK_BASE: &str = "http://localhost:3000/api/v1/me/email/verification";

/// Accepted profile picture dimensions, inclusive on both ends.
const PICTURE_MIN_DIMENSION: u32 = 200;
const PICTURE_MAX_DIMENSION: u32 = 500;

/// User service trait for dependency injection
#[async_trait]
pub trait UserService: Send + Sync {
    /// Profile details for the authenticated user.
    async fn get_info_detail(&self, user_id: &str) -> Result<UserBio, AppError>;

    /// Apply a profile update (empty optional fields preserve stored
    /// values, fullname always overwrites).
    async fn update_info(&self, user_id: &str, update: &UserBioUpdate) -> Result<(), AppError>;

    /// Current email address.
    async fn get_current_email(&self, user_id: &str) -> Result<String, AppError>;

    /// Start an email change; mails the confirmation link.
    async fn request_email_change(&self, user_id: &str, new_email: &str) -> Result<(), AppError>;

    /// Commit a pending email change with its token.
    async fn verify_email_change(&self, user_id: &str, token: &str) -> Result<(), AppError>;

    /// Rotate the password, enforcing the reuse window.
    async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    /// Store a PNG profile picture (already size- and magic-checked by
    /// the transport layer) and point the bio at it.
    async fn set_profile_picture(&self, user_id: &str, data: &[u8]) -> Result<(), AppError>;

    /// Remove the stored picture file (tolerating its absence) and clear
    /// the bio column.
    async fn delete_profile_picture(&self, user_id: &str) -> Result<(), AppError>;

    /// Soft-delete the account and revoke every session.
    async fn delete_account(&self, user_id: &str, password: &str) -> Result<(), AppError>;
}

/// UserService implementation, generic over the store backends.
pub struct UserServiceImpl<U, P, S, V>
where
    U: UserRepository,
    P: PasswordHistoryRepository,
    S: SessionStore,
    V: VerificationTokenStore,
{
    user_repo: Arc<U>,
    password_history_repo: Arc<P>,
    session_store: Arc<S>,
    verification_store: Arc<V>,
    mailer: Arc<dyn EmailSender>,
    upload_dir: String,
}

impl<U, P, S, V> UserServiceImpl<U, P, S, V>
where
    U: UserRepository,
    P: PasswordHistoryRepository,
    S: SessionStore,
    V: VerificationTokenStore,
{
    pub fn new(
        user_repo: Arc<U>,
        password_history_repo: Arc<P>,
        session_store: Arc<S>,
        verification_store: Arc<V>,
        mailer: Arc<dyn EmailSender>,
        upload_dir: String,
    ) -> Self {
        Self {
            user_repo,
            password_history_repo,
            session_store,
            verification_store,
            mailer,
            upload_dir,
        }
    }

    /// The four idempotent unlinks that tear a session down.
    async fn remove_session(&self, session: &Session) -> Result<(), AppError> {
        self.session_store.delete_session(session).await?;

        self.session_store
            .delete_access_token(&AccessTokenRecord {
                jti: String::new(),
                user_id: session.user_id.clone(),
                session_id: session.id.clone(),
            })
            .await?;

        self.session_store
            .delete_refresh_token(&RefreshTokenRecord {
                jti: String::new(),
                user_id: session.user_id.clone(),
                session_id: session.id.clone(),
            })
            .await?;

        self.session_store
            .remove_user_session_from_index(&session.user_id, &session.id)
            .await
    }
}

#[async_trait]
impl<U, P, S, V> UserService for UserServiceImpl<U, P, S, V>
where
    U: UserRepository + 'static,
    P: PasswordHistoryRepository + 'static,
    S: SessionStore + 'static,
    V: VerificationTokenStore + 'static,
{
    async fn get_info_detail(&self, user_id: &str) -> Result<UserBio, AppError> {
        // The ID comes from a validated access token, so absence would
        // mean the account vanished mid-session.
        self.user_repo
            .get_user_bio_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    async fn update_info(&self, user_id: &str, update: &UserBioUpdate) -> Result<(), AppError> {
        self.user_repo.update_user_bio_by_id(user_id, update).await
    }

    async fn get_current_email(&self, user_id: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        Ok(user.email)
    }

    async fn request_email_change(&self, user_id: &str, new_email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if user.email == new_email {
            return Err(AppError::BadRequest(
                "new email can't be the same as the current one".to_string(),
            ));
        }

        if self.user_repo.get_user_by_email(new_email).await?.is_some() {
            return Err(AppError::BadRequest(
                "email is already registered".to_string(),
            ));
        }

        let token = generate_random_id();
        self.verification_store
            .create_email_change_request(
                user_id,
                &EmailChangeRequest {
                    new_email: new_email.to_string(),
                    token: token.clone(),
                },
            )
            .await?;

        let link = format!("{}?id={}&token={}", EMAIL_CHANGE_LINK_BASE, user_id, token);
        self.mailer
            .send(
                new_email,
                new_email,
                &templates::email_change_verification(&link),
            )
            .await
    }

    async fn verify_email_change(&self, user_id: &str, token: &str) -> Result<(), AppError> {
        let request = self
            .verification_store
            .get_email_change_request(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("invalid token".to_string()))?;

        if !tokens_match(token, &request.token) {
            warn!(%user_id, "email change token mismatch");
            return Err(AppError::BadRequest("invalid token".to_string()));
        }

        info!(%user_id, "committing email change");
        self.user_repo
            .update_email_by_id(user_id, &request.new_email)
            .await?;

        self.verification_store
            .delete_email_change_request(user_id)
            .await
    }

    async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !check_password(current_password, &user.password_hash)? {
            return Err(AppError::Unauthorized("password is incorrect".to_string()));
        }

        let hashes = self
            .password_history_repo
            .last_n_hashes(user_id, PASSWORD_REUSE_WINDOW)
            .await?;
        for hash in &hashes {
            if check_password(new_password, hash)? {
                return Err(AppError::BadRequest(
                    "new password can't be the same as one of the last 3 passwords".to_string(),
                ));
            }
        }

        let password_hash = hash_password(new_password)?;

        self.user_repo
            .update_password_by_id(user_id, &password_hash)
            .await?;

        self.password_history_repo
            .create_record(user_id, &password_hash)
            .await
    }

    async fn set_profile_picture(&self, user_id: &str, data: &[u8]) -> Result<(), AppError> {
        // Strict decode: a forged PNG header does not survive this.
        let picture = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|_| AppError::BadRequest("picture must be a .png file".to_string()))?;

        let (width, height) = picture.dimensions();
        let in_range = |d: u32| (PICTURE_MIN_DIMENSION..=PICTURE_MAX_DIMENSION).contains(&d);
        if !in_range(width) || !in_range(height) {
            return Err(AppError::BadRequest(format!(
                "picture must be between {min}x{min} and {max}x{max} pixels",
                min = PICTURE_MIN_DIMENSION,
                max = PICTURE_MAX_DIMENSION,
            )));
        }

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create upload dir: {}", e)))?;

        let relative_path = format!("{}/{}.png", self.upload_dir, generate_random_id());
        tokio::fs::write(&relative_path, data)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store picture: {}", e)))?;

        info!(%user_id, path = %relative_path, "stored profile picture");

        // The previous file, if any, stays on disk.
        self.user_repo
            .update_picture_by_id(user_id, &relative_path)
            .await
    }

    async fn delete_profile_picture(&self, user_id: &str) -> Result<(), AppError> {
        let bio = self
            .user_repo
            .get_user_bio_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !bio.picture.is_empty() {
            match tokio::fs::remove_file(Path::new(&bio.picture)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::Internal(format!(
                        "failed to remove picture: {}",
                        e
                    )))
                }
            }
        }

        self.user_repo.update_picture_by_id(user_id, "").await
    }

    async fn delete_account(&self, user_id: &str, password: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !check_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized("password is incorrect".to_string()));
        }

        info!(%user_id, "soft-deleting account");
        self.user_repo.delete_user_by_id(user_id).await?;

        let sessions = self.session_store.get_all_sessions(user_id).await?;
        for session in &sessions {
            self.remove_session(session).await?;
        }

        Ok(())
    }
}
