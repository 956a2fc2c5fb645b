//! Repository Implementations
//!
//! PostgreSQL-backed implementations of the domain repository traits.

mod password_history_repository;
mod user_repository;

pub use password_history_repository::PgPasswordHistoryRepository;
pub use user_repository::PgUserRepository;
