//! # Domain Entities
//!
//! Core domain entities for the identity and session service. The
//! relational entities map directly to their database tables; sessions
//! and one-shot tokens live only in the expiring KV store.
//!
//! ## Entities
//!
//! - **User / UserBio**: account plus its one-to-one profile row
//! - **PasswordHistory**: append-only log of prior password hashes
//! - **Session**: an authenticated presence with its access/refresh
//!   token presence records
//! - **EmailChangeRequest**: a pending email change awaiting its token
//!
//! ## Store Traits
//!
//! Each entity group has an associated trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle; in-memory fakes back the
//! service-level tests.

mod password_history;
mod session;
mod user;
mod verification;

pub use user::{User, UserBio, UserBioUpdate, UserRepository};

pub use password_history::{PasswordHistoryRepository, PASSWORD_REUSE_WINDOW};

pub use session::{AccessTokenRecord, RefreshTokenRecord, Session, SessionStore};

pub use verification::{EmailChangeRequest, VerificationTokenStore};
