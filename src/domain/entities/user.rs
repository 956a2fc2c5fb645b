//! User entity and repository trait.
//!
//! Maps to the `users` and `user_bio` tables in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: VARCHAR(32) PRIMARY KEY (128-bit random hex)
/// - email: VARCHAR(128) NOT NULL, unique among live rows
/// - password_hash: VARCHAR(255) NOT NULL (bcrypt)
/// - is_active: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - deleted_at: TIMESTAMPTZ NULL (soft delete)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 128-bit random hex ID (primary key)
    pub id: String,

    /// Email address (unique among non-deleted users, case-sensitive)
    pub email: String,

    /// bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// False until the email address has been verified
    pub is_active: bool,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Soft-delete timestamp (None while the account lives)
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One-to-one profile companion to [`User`].
///
/// Created in the same transaction as the user row; `picture` holds the
/// relative path of the stored profile image, or an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBio {
    pub user_id: String,
    pub fullname: String,
    pub location: String,
    pub bio: String,
    pub web: String,
    pub picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserBio {
    /// Fresh bio for a newly registered user: fullname only, everything
    /// else empty.
    pub fn new(user_id: String, fullname: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            fullname,
            location: String::new(),
            bio: String::new(),
            web: String::new(),
            picture: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile fields accepted by a bio update. Empty `location` / `bio` /
/// `web` strings preserve the stored value; `fullname` always overwrites.
#[derive(Debug, Clone)]
pub struct UserBioUpdate {
    pub fullname: String,
    pub location: String,
    pub bio: String,
    pub web: String,
}

/// Repository trait for User data access operations.
///
/// Implementations of this trait handle the actual database interactions.
/// The trait is defined in the domain layer to maintain dependency
/// inversion; an in-memory implementation backs the service tests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a live (non-deleted) user by ID.
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Find a live (non-deleted) user by email address.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert the user and its bio row atomically.
    ///
    /// A duplicate email among live users surfaces as `AppError::Conflict`.
    async fn create_user(&self, user: &User, bio: &UserBio) -> Result<(), AppError>;

    /// Flip the activation flag.
    async fn update_activation_status_by_id(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<(), AppError>;

    /// Replace the stored password hash.
    async fn update_password_by_id(&self, id: &str, password_hash: &str) -> Result<(), AppError>;

    /// Replace the email address.
    async fn update_email_by_id(&self, id: &str, email: &str) -> Result<(), AppError>;

    /// Fetch the bio row for a user.
    async fn get_user_bio_by_id(&self, id: &str) -> Result<Option<UserBio>, AppError>;

    /// Apply a profile update (see [`UserBioUpdate`] semantics).
    async fn update_user_bio_by_id(&self, id: &str, bio: &UserBioUpdate) -> Result<(), AppError>;

    /// Point the picture column at a stored file path (empty to clear).
    async fn update_picture_by_id(&self, id: &str, path: &str) -> Result<(), AppError>;

    /// Soft-delete the user (set `deleted_at`).
    async fn delete_user_by_id(&self, id: &str) -> Result<(), AppError>;
}
