//! Loyalty Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for both loyalty services. It includes:
//!
//! - Connection pool management with sqlx
//! - Embedded schema migrations, one set per service
//! - Repository implementations for all domain entities
//! - Transactional balance mutations with row locking

pub mod migrate;
pub mod pool;
pub mod repositories;

pub use migrate::{run_accrual_migrations, run_mart_migrations};
pub use pool::{create_pool, ping};
pub use repositories::*;

// Re-export commonly used types
pub use loyalty_core::{AppError, AppResult};
pub use sqlx::PgPool;
