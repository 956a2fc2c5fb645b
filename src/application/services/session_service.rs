//! Session Service
//!
//! Token rotation (access ↔ refresh) and session enumeration/revocation.
//! Rotation always binds the new token to the session of the presented
//! one and extends the owning session's TTL, which by the store's
//! only-extend rule never shortens it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{AccessTokenRecord, RefreshTokenRecord, Session, SessionStore};
use crate::shared::error::AppError;

use super::token_service::{AccessToken, RefreshToken, TokenService};

/// Session service trait for dependency injection
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Trade a valid access token for a refresh token on the same session.
    async fn generate_refresh_token(
        &self,
        access_token: &AccessToken,
    ) -> Result<RefreshToken, AppError>;

    /// Trade a valid refresh token for a fresh access token on the same
    /// session. The new access-token record overwrites the previous one,
    /// implicitly invalidating it.
    async fn generate_access_token(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AccessToken, AppError>;

    /// All live sessions of the token's user.
    async fn list_sessions(&self, access_token: &AccessToken) -> Result<Vec<Session>, AppError>;

    /// Tear down one session: hash, token records, and index membership.
    async fn remove_session(&self, session: &Session) -> Result<(), AppError>;

    /// Tear down every session of the user except the given one.
    async fn remove_all_other_sessions(&self, current: &Session) -> Result<(), AppError>;
}

/// SessionService implementation over a session store backend.
pub struct SessionServiceImpl<S>
where
    S: SessionStore,
{
    session_store: Arc<S>,
    token_service: Arc<TokenService>,
}

impl<S> SessionServiceImpl<S>
where
    S: SessionStore,
{
    pub fn new(session_store: Arc<S>, token_service: Arc<TokenService>) -> Self {
        Self {
            session_store,
            token_service,
        }
    }
}

#[async_trait]
impl<S> SessionService for SessionServiceImpl<S>
where
    S: SessionStore + 'static,
{
    async fn generate_refresh_token(
        &self,
        access_token: &AccessToken,
    ) -> Result<RefreshToken, AppError> {
        let refresh_token = self
            .token_service
            .issue_refresh(&access_token.user_id, &access_token.session_id)?;

        self.session_store
            .create_refresh_token(
                &RefreshTokenRecord {
                    jti: refresh_token.jti.clone(),
                    user_id: refresh_token.user_id.clone(),
                    session_id: refresh_token.session_id.clone(),
                },
                self.token_service.refresh_token_life(),
            )
            .await?;

        let session = Session::new(
            refresh_token.session_id.clone(),
            refresh_token.user_id.clone(),
            String::new(),
            String::new(),
        );
        self.session_store
            .update_session_expiry(&session, self.token_service.refresh_token_life())
            .await?;

        Ok(refresh_token)
    }

    async fn generate_access_token(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AccessToken, AppError> {
        let access_token = self
            .token_service
            .issue_access(&refresh_token.user_id, &refresh_token.session_id)?;

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
            access_token.session_id.clone(),
            access_token.user_id.clone(),
            String::new(),
            String::new(),
        );
        self.session_store
            .update_session_expiry(&session, self.token_service.access_token_life())
            .await?;

        Ok(access_token)
    }

    async fn list_sessions(&self, access_token: &AccessToken) -> Result<Vec<Session>, AppError> {
        self.session_store
            .get_all_sessions(&access_token.user_id)
            .await
    }

    async fn remove_session(&self, session: &Session) -> Result<(), AppError> {
        info!(
            user_id = %session.user_id,
            session_id = %session.id,
            "removing session"
        );

        // Each unlink is idempotent; a partial failure surfaces to the
        // caller, who may simply retry.
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

    async fn remove_all_other_sessions(&self, current: &Session) -> Result<(), AppError> {
        let sessions = self
            .session_store
            .get_all_sessions(&current.user_id)
            .await?;

        for session in sessions.iter().filter(|s| s.id != current.id) {
            self.remove_session(session).await?;
        }

        Ok(())
    }
}
