//! Security Primitives
//!
//! Password hashing, random identifier generation, and constant-time
//! token comparison used by the services.

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::RngCore;
use subtle::ConstantTimeEq;

use super::error::AppError;

/// Random identifiers (session IDs, JTIs, one-shot tokens) are 128-bit
/// values rendered as lowercase hex.
const RANDOM_ID_BYTES: usize = 128 / 8;

/// Hash a plaintext password with bcrypt.
///
/// `DEFAULT_COST` is 12, comfortably above the cost-10 floor this service
/// requires.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// A malformed stored hash is an internal error, not a mismatch.
pub fn check_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    verify(password, password_hash)
        .map_err(|e| AppError::Internal(format!("password verification failed: {}", e)))
}

/// Generate a 128-bit random identifier as a 32-character hex string.
pub fn generate_random_id() -> String {
    let mut bytes = [0u8; RANDOM_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Compare two one-shot tokens in constant time.
pub fn tokens_match(supplied: &str, stored: &str) -> bool {
    supplied.as_bytes().ct_eq(stored.as_bytes()).into()
}
