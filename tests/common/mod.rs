//! Common Test Utilities
//!
//! In-memory implementations of the store traits plus recording fakes
//! for the mailer and the audit-log producer. The services run unchanged
//! against these, which is what makes the scenarios below executable
//! without live Postgres/Redis.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use userland::application::services::{
    AuthServiceImpl, SessionServiceImpl, TokenService, UserServiceImpl,
};
use userland::config::JwtSettings;
use userland::domain::{
    AccessTokenRecord, EmailChangeRequest, PasswordHistoryRepository, RefreshTokenRecord, Session,
    SessionStore, User, UserBio, UserBioUpdate, UserRepository, VerificationTokenStore,
};
use userland::infrastructure::email::{EmailSender, MailContent};
use userland::infrastructure::producer::{LogProducer, LoginLog};
use userland::shared::error::AppError;

// ---------------------------------------------------------------------------
// User repository fake

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
    bios: Mutex<HashMap<String, UserBio>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(id).filter(|u| u.deleted_at.is_none()).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn create_user(&self, user: &User, bio: &UserBio) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.email == user.email && u.deleted_at.is_none())
        {
            return Err(AppError::Conflict("user already exists".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        self.bios
            .lock()
            .unwrap()
            .insert(bio.user_id.clone(), bio.clone());
        Ok(())
    }

    async fn update_activation_status_by_id(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password_by_id(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_email_by_id(&self, id: &str, email: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.email == email && u.deleted_at.is_none() && u.id != id)
        {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }
        let user = users
            .get_mut(id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn get_user_bio_by_id(&self, id: &str) -> Result<Option<UserBio>, AppError> {
        Ok(self.bios.lock().unwrap().get(id).cloned())
    }

    async fn update_user_bio_by_id(&self, id: &str, update: &UserBioUpdate) -> Result<(), AppError> {
        let mut bios = self.bios.lock().unwrap();
        let bio = bios
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        // Mirror the SQL COALESCE(NULLIF(..., ''), ...) semantics.
        bio.fullname = update.fullname.clone();
        if !update.location.is_empty() {
            bio.location = update.location.clone();
        }
        if !update.bio.is_empty() {
            bio.bio = update.bio.clone();
        }
        if !update.web.is_empty() {
            bio.web = update.web.clone();
        }
        bio.updated_at = Utc::now();
        Ok(())
    }

    async fn update_picture_by_id(&self, id: &str, path: &str) -> Result<(), AppError> {
        let mut bios = self.bios.lock().unwrap();
        let bio = bios
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        bio.picture = path.to_string();
        bio.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user_by_id(&self, id: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Password history fake

#[derive(Default)]
pub struct MemoryPasswordHistoryRepository {
    records: Mutex<Vec<(String, String)>>,
}

impl MemoryPasswordHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_for(&self, user_id: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .count()
    }
}

#[async_trait]
impl PasswordHistoryRepository for MemoryPasswordHistoryRepository {
    async fn create_record(&self, user_id: &str, password_hash: &str) -> Result<(), AppError> {
        self.records
            .lock()
            .unwrap()
            .push((user_id.to_string(), password_hash.to_string()));
        Ok(())
    }

    async fn last_n_hashes(&self, user_id: &str, n: usize) -> Result<Vec<String>, AppError> {
        let records = self.records.lock().unwrap();
        let mut hashes: Vec<String> = records
            .iter()
            .rev()
            .filter(|(uid, _)| uid == user_id)
            .take(n)
            .map(|(_, hash)| hash.clone())
            .collect();
        hashes.reverse();
        Ok(hashes)
    }
}

// ---------------------------------------------------------------------------
// Session store fake

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<(String, String), Session>>,
    session_ttls: Mutex<HashMap<(String, String), Duration>>,
    index: Mutex<HashMap<String, HashSet<String>>>,
    access_tokens: Mutex<HashMap<(String, String), String>>,
    refresh_tokens: Mutex<HashMap<(String, String), String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate TTL expiry of a session hash: the hash disappears while
    /// the index still carries the ID, exactly the state opportunistic
    /// GC has to clean up.
    pub fn expire_session(&self, user_id: &str, session_id: &str) {
        let key = (user_id.to_string(), session_id.to_string());
        self.sessions.lock().unwrap().remove(&key);
        self.session_ttls.lock().unwrap().remove(&key);
    }

    pub fn session_ttl(&self, user_id: &str, session_id: &str) -> Option<Duration> {
        self.session_ttls
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), session_id.to_string()))
            .copied()
    }

    pub fn index_contains(&self, user_id: &str, session_id: &str) -> bool {
        self.index
            .lock()
            .unwrap()
            .get(user_id)
            .is_some_and(|set| set.contains(session_id))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, session: &Session, ttl: Duration) -> Result<(), AppError> {
        let key = (session.user_id.clone(), session.id.clone());
        self.sessions.lock().unwrap().insert(key.clone(), session.clone());
        self.session_ttls.lock().unwrap().insert(key, ttl);
        Ok(())
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, AppError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), session_id.to_string()))
            .cloned())
    }

    async fn get_all_sessions(&self, user_id: &str) -> Result<Vec<Session>, AppError> {
        let ids: Vec<String> = self
            .index
            .lock()
            .unwrap()
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        let mut sessions = Vec::new();
        for session_id in ids {
            match self.get_session(user_id, &session_id).await? {
                Some(session) => sessions.push(session),
                None => {
                    self.remove_user_session_from_index(user_id, &session_id)
                        .await?;
                }
            }
        }
        Ok(sessions)
    }

    async fn add_user_session_to_index(&self, session: &Session) -> Result<(), AppError> {
        self.index
            .lock()
            .unwrap()
            .entry(session.user_id.clone())
            .or_default()
            .insert(session.id.clone());
        Ok(())
    }

    async fn remove_user_session_from_index(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AppError> {
        if let Some(set) = self.index.lock().unwrap().get_mut(user_id) {
            set.remove(session_id);
        }
        Ok(())
    }

    async fn update_session_expiry(
        &self,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let key = (session.user_id.clone(), session.id.clone());
        if let Some(stored) = self.sessions.lock().unwrap().get_mut(&key) {
            stored.updated_at = Utc::now();
        }
        let mut ttls = self.session_ttls.lock().unwrap();
        if let Some(current) = ttls.get_mut(&key) {
            // Only ever extend.
            if *current < ttl {
                *current = ttl;
            }
        }
        Ok(())
    }

    async fn delete_session(&self, session: &Session) -> Result<(), AppError> {
        let key = (session.user_id.clone(), session.id.clone());
        self.sessions.lock().unwrap().remove(&key);
        self.session_ttls.lock().unwrap().remove(&key);
        Ok(())
    }

    async fn create_access_token(
        &self,
        token: &AccessTokenRecord,
        _ttl: Duration,
    ) -> Result<(), AppError> {
        self.access_tokens.lock().unwrap().insert(
            (token.user_id.clone(), token.session_id.clone()),
            token.jti.clone(),
        );
        Ok(())
    }

    async fn check_access_token(&self, token: &AccessTokenRecord) -> Result<bool, AppError> {
        Ok(self
            .access_tokens
            .lock()
            .unwrap()
            .get(&(token.user_id.clone(), token.session_id.clone()))
            .is_some_and(|jti| *jti == token.jti))
    }

    async fn delete_access_token(&self, token: &AccessTokenRecord) -> Result<(), AppError> {
        self.access_tokens
            .lock()
            .unwrap()
            .remove(&(token.user_id.clone(), token.session_id.clone()));
        Ok(())
    }

    async fn create_refresh_token(
        &self,
        token: &RefreshTokenRecord,
        _ttl: Duration,
    ) -> Result<(), AppError> {
        self.refresh_tokens.lock().unwrap().insert(
            (token.user_id.clone(), token.session_id.clone()),
            token.jti.clone(),
        );
        Ok(())
    }

    async fn check_refresh_token(&self, token: &RefreshTokenRecord) -> Result<bool, AppError> {
        Ok(self
            .refresh_tokens
            .lock()
            .unwrap()
            .get(&(token.user_id.clone(), token.session_id.clone()))
            .is_some_and(|jti| *jti == token.jti))
    }

    async fn delete_refresh_token(&self, token: &RefreshTokenRecord) -> Result<(), AppError> {
        self.refresh_tokens
            .lock()
            .unwrap()
            .remove(&(token.user_id.clone(), token.session_id.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Verification token store fake

#[derive(Default)]
pub struct MemoryVerificationStore {
    email_verification: Mutex<HashMap<String, String>>,
    forgot_password: Mutex<HashMap<String, String>>,
    email_change: Mutex<HashMap<String, EmailChangeRequest>>,
}

impl MemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forgot_password_tokens(&self) -> Vec<String> {
        self.forgot_password.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl VerificationTokenStore for MemoryVerificationStore {
    async fn create_email_verification_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<(), AppError> {
        self.email_verification
            .lock()
            .unwrap()
            .insert(user_id.to_string(), token.to_string());
        Ok(())
    }

    async fn get_email_verification_token(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(self.email_verification.lock().unwrap().get(user_id).cloned())
    }

    async fn delete_email_verification_token(&self, user_id: &str) -> Result<(), AppError> {
        self.email_verification.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn create_forgot_password_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<(), AppError> {
        self.forgot_password
            .lock()
            .unwrap()
            .insert(token.to_string(), user_id.to_string());
        Ok(())
    }

    async fn get_forgot_password_token(&self, token: &str) -> Result<Option<String>, AppError> {
        Ok(self.forgot_password.lock().unwrap().get(token).cloned())
    }

    async fn delete_forgot_password_token(&self, token: &str) -> Result<(), AppError> {
        self.forgot_password.lock().unwrap().remove(token);
        Ok(())
    }

    async fn create_email_change_request(
        &self,
        user_id: &str,
        request: &EmailChangeRequest,
    ) -> Result<(), AppError> {
        self.email_change
            .lock()
            .unwrap()
            .insert(user_id.to_string(), request.clone());
        Ok(())
    }

    async fn get_email_change_request(
        &self,
        user_id: &str,
    ) -> Result<Option<EmailChangeRequest>, AppError> {
        Ok(self.email_change.lock().unwrap().get(user_id).cloned())
    }

    async fn delete_email_change_request(&self, user_id: &str) -> Result<(), AppError> {
        self.email_change.lock().unwrap().remove(user_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mailer and producer fakes

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(
        &self,
        to_name: &str,
        to_email: &str,
        mail: &MailContent,
    ) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("mail transport down".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            to_name: to_name.to_string(),
            to_email: to_email.to_string(),
            subject: mail.subject.clone(),
            html: mail.html.clone(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLogProducer {
    logins: Mutex<Vec<LoginLog>>,
    fail: AtomicBool,
}

impl RecordingLogProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_emits(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn logins(&self) -> Vec<LoginLog> {
        self.logins.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogProducer for RecordingLogProducer {
    async fn emit_login(&self, login: &LoginLog) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("bus unavailable".to_string()));
        }
        self.logins.lock().unwrap().push(login.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness

pub type TestAuthService = AuthServiceImpl<
    MemoryUserRepository,
    MemoryPasswordHistoryRepository,
    MemorySessionStore,
    MemoryVerificationStore,
>;

pub type TestSessionService = SessionServiceImpl<MemorySessionStore>;

pub type TestUserService = UserServiceImpl<
    MemoryUserRepository,
    MemoryPasswordHistoryRepository,
    MemorySessionStore,
    MemoryVerificationStore,
>;

/// Everything a service scenario needs, wired against the fakes.
pub struct TestHarness {
    pub users: Arc<MemoryUserRepository>,
    pub history: Arc<MemoryPasswordHistoryRepository>,
    pub sessions: Arc<MemorySessionStore>,
    pub verification: Arc<MemoryVerificationStore>,
    pub mailer: Arc<RecordingMailer>,
    pub producer: Arc<RecordingLogProducer>,
    pub token_service: Arc<TokenService>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            history: Arc::new(MemoryPasswordHistoryRepository::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            verification: Arc::new(MemoryVerificationStore::new()),
            mailer: Arc::new(RecordingMailer::new()),
            producer: Arc::new(RecordingLogProducer::new()),
            token_service: Arc::new(TokenService::new(&JwtSettings {
                secret: "test-secret".to_string(),
                access_token_expiry_secs: 3600,
                refresh_token_expiry_secs: 86400,
                verification_token_expiry_secs: 300,
            })),
        }
    }

    pub fn auth_service(&self) -> TestAuthService {
        let mailer: Arc<dyn EmailSender> = self.mailer.clone();
        let producer: Arc<dyn LogProducer> = self.producer.clone();
        AuthServiceImpl::new(
            self.users.clone(),
            self.history.clone(),
            self.sessions.clone(),
            self.verification.clone(),
            self.token_service.clone(),
            mailer,
            producer,
        )
    }

    pub fn session_service(&self) -> TestSessionService {
        SessionServiceImpl::new(self.sessions.clone(), self.token_service.clone())
    }

    pub fn user_service(&self, upload_dir: &str) -> TestUserService {
        let mailer: Arc<dyn EmailSender> = self.mailer.clone();
        UserServiceImpl::new(
            self.users.clone(),
            self.history.clone(),
            self.sessions.clone(),
            self.verification.clone(),
            mailer,
            upload_dir.to_string(),
        )
    }
}

/// Shorthand for a registered-and-verified user ready to log in.
pub async fn register_and_verify(harness: &TestHarness, fullname: &str, email: &str, password: &str) {
    use userland::application::services::AuthService;

    let auth = harness.auth_service();
    auth.register(fullname, email, password).await.unwrap();

    let user = harness
        .users
        .get_user_by_email(email)
        .await
        .unwrap()
        .expect("user should exist after registration");
    let token = harness
        .verification
        .get_email_verification_token(&user.id)
        .await
        .unwrap()
        .expect("verification token should be stored");

    auth.verify_email(&user.id, &token).await.unwrap();
}
