//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **TokenService**: JWT mint/parse for access and refresh tokens
//! - **AuthService**: registration, verification, login, password reset
//! - **SessionService**: token rotation, session list/revocation
//! - **UserService**: profile, email change, password change, pictures,
//!   account deletion

pub mod auth_service;
pub mod session_service;
pub mod token_service;
pub mod user_service;

// Re-export token service types
pub use token_service::{AccessToken, Claims, RefreshToken, TokenError, TokenService};

// Re-export auth service types
pub use auth_service::{AuthService, AuthServiceImpl};

// Re-export session service types
pub use session_service::{SessionService, SessionServiceImpl};

// Re-export user service types
pub use user_service::{UserService, UserServiceImpl};
