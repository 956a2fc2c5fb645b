//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration is loaded once at startup from:
//! - Environment variables (deployment names like `API_PORT`, or prefixed
//!   with `APP__` for everything else)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use userland::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Server will listen on {}", settings.server_addr());
//! ```

mod settings;

pub use settings::*;
