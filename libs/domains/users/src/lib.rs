//! Users Domain
//!
//! This module provides a complete domain implementation for user management
//! with a concurrent bulk pipeline.
//!
//! # Features
//!
//! - Parallel synthetic user generation (bounded worker pool)
//! - Parallel bulk import with store-level deduplication and
//!   partial-failure accounting
//! - Password hashing with Argon2
//! - Bearer token lifecycle (issue, revoke-all on login/logout)
//! - Role-based access control via static permission tables
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, auth context, token ledger
//! └──────┬──────┘
//!        │      ┌───────────────┐
//!        ├─────►│ Bulk pipeline │  ← Partitioning, worker pool
//!        │      └───────┬───────┘
//! ┌──────▼──────────────▼──────┐
//! │        Repositories        │  ← Data access (traits + implementations)
//! └──────────────┬─────────────┘
//!                │
//! ┌──────────────▼─────────────┐
//! │           Models           │  ← Entities, DTOs, enums
//! └────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_users::{
//!     handlers,
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//!     tokens::InMemoryTokenRepository,
//! };
//!
//! // Create repositories and service
//! let service = Arc::new(UserService::new(
//!     InMemoryUserRepository::new(),
//!     InMemoryTokenRepository::new(),
//! ));
//!
//! // Create Axum routers
//! let users = handlers::users_router(Arc::clone(&service));
//! let auth = handlers::auth_router(service);
//! ```

pub mod bulk;
pub mod error;
pub mod handlers;
pub mod hasher;
pub mod models;
pub mod repository;
pub mod service;
pub mod tokens;

// Re-export commonly used types
pub use bulk::{BulkConfig, BulkPipeline};
pub use error::{UserError, UserResult};
pub use hasher::{Argon2Hasher, CredentialHasher};
pub use models::{
    AuthResponse, GeneratedUser, Gender, ImportSummary, LoginRequest, Permission, Role, User,
    UserResponse, UserStatus,
};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::{AuthContext, CurrentUser, UserService};
pub use tokens::{InMemoryTokenRepository, Token, TokenLedger, TokenRepository};
