//! Repository implementations
//!
//! This module contains concrete implementations of the repository traits
//! defined in loyalty-core, using sqlx for PostgreSQL access.

pub mod accrual_order_repo;
pub mod ledger_repo;
pub mod reward_repo;
pub mod user_order_repo;
pub mod user_repo;

pub use accrual_order_repo::PgAccrualOrderRepository;
pub use ledger_repo::PgLedgerRepository;
pub use reward_repo::PgRewardRepository;
pub use user_order_repo::PgUserOrderRepository;
pub use user_repo::PgUserRepository;

/// SQLSTATE of a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// Whether the error is a unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}
