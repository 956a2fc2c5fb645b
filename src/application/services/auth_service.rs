//! Authentication Service
//!
//! Registration, email verification, login, and the forgot/reset password
//! flow. This service is the only place the user store, the session
//! store, the token codec, the mailer, and the audit-log producer meet.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{
    AccessTokenRecord, PasswordHistoryRepository, Session, SessionStore, User, UserBio,
    UserRepository, VerificationTokenStore, PASSWORD_REUSE_WINDOW,
};
use crate::infrastructure::email::{templates, EmailSender};
use crate::infrastructure::producer::{LogProducer, LoginLog};
use crate::shared::error::AppError;
use crate::shared::security::{check_password, generate_random_id, hash_password, tokens_match};

use super::token_service::{AccessToken, TokenService};

/// Base of the verification link mailed out at registration.
const VERIFICATION_LINK_BASE: &str = "http://localhost:3000/api/v1/auth/verification";

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new, inactive account and mail the verification link.
    async fn register(&self, fullname: &str, email: &str, password: &str)
        -> Result<(), AppError>;

    /// Re-issue and mail a verification token for an inactive account.
    async fn send_email_verification(&self, email: &str) -> Result<(), AppError>;

    /// Activate an account with its one-shot verification token.
    async fn verify_email(&self, user_id: &str, token: &str) -> Result<(), AppError>;

    /// Authenticate and open a session; returns the access token. The
    /// refresh token is minted separately by trading the access token.
    async fn login(
        &self,
        email: &str,
        password: &str,
        client_id: &str,
        ip_address: &str,
    ) -> Result<AccessToken, AppError>;

    /// Issue and mail a password-reset token.
    async fn forgot_password(&self, email: &str) -> Result<(), AppError>;

    /// Redeem a reset token for a new password.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError>;
}

/// AuthService implementation, generic over the store backends.
pub struct AuthServiceImpl<U, P, S, V>
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
    token_service: Arc<TokenService>,
    mailer: Arc<dyn EmailSender>,
    log_producer: Arc<dyn LogProducer>,
}

impl<U, P, S, V> AuthServiceImpl<U, P, S, V>
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
        token_service: Arc<TokenService>,
        mailer: Arc<dyn EmailSender>,
        log_producer: Arc<dyn LogProducer>,
    ) -> Self {
        Self {
            user_repo,
            password_history_repo,
            session_store,
            verification_store,
            token_service,
            mailer,
            log_producer,
        }
    }

    fn verification_link(user_id: &str, token: &str) -> String {
        format!("{}?id={}&token={}", VERIFICATION_LINK_BASE, user_id, token)
    }

    /// Store a fresh verification token (overwriting any prior one) and
    /// mail the link.
    async fn issue_verification_token(
        &self,
        user_id: &str,
        recipient_name: &str,
        recipient_email: &str,
    ) -> Result<(), AppError> {
        let token = generate_random_id();

        self.verification_store
            .create_email_verification_token(user_id, &token)
            .await?;

        let link = Self::verification_link(user_id, &token);
        debug!(%link, "sending verification link");

        self.mailer
            .send(
                recipient_name,
                recipient_email,
                &templates::email_verification(&link),
            )
            .await
    }
}

#[async_trait]
impl<U, P, S, V> AuthService for AuthServiceImpl<U, P, S, V>
where
    U: UserRepository + 'static,
    P: PasswordHistoryRepository + 'static,
    S: SessionStore + 'static,
    V: VerificationTokenStore + 'static,
{
    async fn register(
        &self,
        fullname: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        if self.user_repo.get_user_by_email(email).await?.is_some() {
            info!("registration rejected, user already exists");
            return Err(AppError::Conflict("user already exists".to_string()));
        }

        let password_hash = hash_password(password)?;

        let now = Utc::now();
        let user = User {
            id: generate_random_id(),
            email: email.to_string(),
            password_hash: password_hash.clone(),
            is_active: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let bio = UserBio::new(user.id.clone(), fullname.to_string());

        info!(user_id = %user.id, "creating user");
        self.user_repo.create_user(&user, &bio).await?;

        self.password_history_repo
            .create_record(&user.id, &password_hash)
            .await?;

        // A failed send fails the call; the user row remains and the
        // resend endpoint is the recovery path.
        self.issue_verification_token(&user.id, fullname, email)
            .await
    }

    async fn send_email_verification(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if user.is_active {
            return Err(AppError::BadRequest("user is already active".to_string()));
        }

        self.issue_verification_token(&user.id, email, email).await
    }

    async fn verify_email(&self, user_id: &str, token: &str) -> Result<(), AppError> {
        let stored = self
            .verification_store
            .get_email_verification_token(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("invalid token".to_string()))?;

        if !tokens_match(token, &stored) {
            warn!(%user_id, "verification token mismatch");
            return Err(AppError::Unauthorized(
                "invalid verification token".to_string(),
            ));
        }

        info!(%user_id, "activating user account");
        self.user_repo
            .update_activation_status_by_id(user_id, true)
            .await?;

        // One-shot: the token is gone after first use.
        self.verification_store
            .delete_email_verification_token(user_id)
            .await
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        client_id: &str,
        ip_address: &str,
    ) -> Result<AccessToken, AppError> {
        let user = self
            .user_repo
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("user is not active".to_string()));
        }

        if !check_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized("password is incorrect".to_string()));
        }

        let session_id = generate_random_id();
        let access_token = self.token_service.issue_access(&user.id, &session_id)?;

        self.session_store
            .create_access_token(
                &AccessTokenRecord {
                    jti: access_token.jti.clone(),
                    user_id: access_token.user_id.clone(),
                    session_id: access_token.session_id.clone(),
                },
                self.token_service.access_token_life(),
            )
            .await?;

        let session = Session::new(
            session_id,
            user.id.clone(),
            client_id.to_string(),
            ip_address.to_string(),
        );
        self.session_store
            .create_session(&session, self.token_service.access_token_life())
            .await?;

        self.session_store
            .add_user_session_to_index(&session)
            .await?;

        // The only place a bus failure fails the caller.
        self.log_producer
            .emit_login(&LoginLog {
                user_id: user.id.clone(),
                remote_ip: ip_address.to_string(),
            })
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "login succeeded");
        Ok(access_token)
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::BadRequest("user is not active".to_string()));
        }

        let token = generate_random_id();
        self.verification_store
            .create_forgot_password_token(&user.id, &token)
            .await?;

        self.mailer
            .send(email, email, &templates::password_reset(&token))
            .await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let user_id = self
            .verification_store
            .get_forgot_password_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_string()))?;

        let hashes = self
            .password_history_repo
            .last_n_hashes(&user_id, PASSWORD_REUSE_WINDOW)
            .await?;
        for hash in &hashes {
            if check_password(new_password, hash)? {
                return Err(AppError::BadRequest(
                    "new password can't be the same as one of the last 3 passwords".to_string(),
                ));
            }
        }

        let password_hash = hash_password(new_password)?;

        // The account may have been deleted while the token was in flight.
        self.user_repo
            .get_user_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_string()))?;

        self.user_repo
            .update_password_by_id(&user_id, &password_hash)
            .await?;

        self.password_history_repo
            .create_record(&user_id, &password_hash)
            .await?;

        self.verification_store
            .delete_forgot_password_token(token)
            .await
    }
}
