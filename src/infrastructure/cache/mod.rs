//! Cache Module
//!
//! Redis connection management and the expiring KV stores backing
//! sessions, token presence records, and one-shot verification tokens.

mod session_store;
mod verification_store;

pub use session_store::RedisSessionStore;
pub use verification_store::RedisVerificationStore;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
///
/// The connection manager handles connection pooling and automatic
/// reconnection when the connection is lost.
#[instrument(skip(settings), fields(addr = %settings.addr))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.connection_url())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Key layout of the expiring KV store.
///
/// The colon-delimited shapes are a stable external contract between
/// process restarts; do not reorder or rename segments.
pub mod keys {
    /// Session record hash: `user:{uid}:session:{sid}`
    pub fn session(user_id: &str, session_id: &str) -> String {
        format!("user:{}:session:{}", user_id, session_id)
    }

    /// Per-user session index set: `user:{uid}:session`
    pub fn session_index(user_id: &str) -> String {
        format!("user:{}:session", user_id)
    }

    /// Access-token presence record: `user:{uid}:session:{sid}:accesstoken`
    pub fn access_token(user_id: &str, session_id: &str) -> String {
        format!("user:{}:session:{}:accesstoken", user_id, session_id)
    }

    /// Refresh-token presence record: `user:{uid}:session:{sid}:refreshtoken`
    pub fn refresh_token(user_id: &str, session_id: &str) -> String {
        format!("user:{}:session:{}:refreshtoken", user_id, session_id)
    }

    /// Email verification token: `user:{uid}:verification:token`
    pub fn email_verification(user_id: &str) -> String {
        format!("user:{}:verification:token", user_id)
    }

    /// Forgot-password token (keyed by the token itself):
    /// `forgotPassword:token:{token}`
    pub fn forgot_password(token: &str) -> String {
        format!("forgotPassword:token:{}", token)
    }

    /// Pending email change hash: `user:{uid}:emailChangeVerification:token`
    pub fn email_change(user_id: &str) -> String {
        format!("user:{}:emailChangeVerification:token", user_id)
    }

}
