//! # Userland
//!
//! A self-contained identity and session service over HTTP/JSON:
//! - Account registration with email verification
//! - Bearer-token login with Redis-backed sessions
//! - Access/refresh token rotation with synchronous revocation
//! - Password history, email change, profile pictures, account deletion
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities and store traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Postgres, Redis, mailer, and log-producer
//!   implementations
//! - **Presentation Layer**: HTTP handlers and token middleware
//!
//! ## Module Structure
//!
//! ```text
//! userland/
//! +-- config/        Configuration management
//! +-- domain/        Domain entities and store traits
//! +-- application/   Application services and DTOs
//! +-- infrastructure/ Database, cache, mail and bus implementations
//! +-- presentation/  HTTP routes and middleware
//! +-- shared/        Common utilities (errors, security, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
