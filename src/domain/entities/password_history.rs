//! Password history entity and repository trait.
//!
//! Maps to the append-only `password_history` table. The newest row for a
//! user always equals the hash on the user row, and the last three rows
//! are consulted on every password change to block reuse.

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Number of prior hashes a new password is checked against.
pub const PASSWORD_REUSE_WINDOW: usize = 3;

/// Repository trait for password history access.
#[async_trait]
pub trait PasswordHistoryRepository: Send + Sync {
    /// Append a hash for a user.
    async fn create_record(&self, user_id: &str, password_hash: &str) -> Result<(), AppError>;

    /// Last `n` hashes for a user, ordered oldest to newest.
    async fn last_n_hashes(&self, user_id: &str, n: usize) -> Result<Vec<String>, AppError>;
}
