//! Business logic services for the loyalty services
//!
//! This crate contains the order-accrual pipeline and the balance ledger:
//! reward matching, the accrual worker pool fed by a task queue, the
//! rate-limited status lookup, and the Mart-side poller that brings
//! accrual results back into the user ledger.
//!
//! # Architecture
//!
//! Services are generic over the repository traits of `loyalty-core` and
//! own their dependencies through `Arc`, so the binaries wire them to
//! PostgreSQL while tests use in-memory doubles. Long-running components
//! (worker pool, poller) are explicit objects started once and stopped
//! through a `CancellationToken`.
//!
//! # Services
//!
//! - `RewardRegistry` - Reward rule registration
//! - `RewardMatcher` - Accrual computation for a list of goods
//! - `AccrualOrderRegistry` - Order registration and rate-limited status lookup
//! - `AccrualWorkerPool` - Workers consuming the accrual task queue
//! - `OrderSyncPoller` - Periodic status sync from the Accrual service
//! - `LedgerService` - Balance, credits and withdrawals
//! - `MartOrderService` - Order number uploads
//! - `UserService` - Registration and login

pub mod accrual_client;
pub mod accrual_orders;
pub mod ledger;
pub mod mart_orders;
pub mod matching;
pub mod order_sync;
pub mod rate_limit;
pub mod rewards;
pub mod users;
pub mod worker_pool;

#[cfg(test)]
pub(crate) mod test_support;

pub use accrual_client::HttpAccrualClient;
pub use accrual_orders::AccrualOrderRegistry;
pub use ledger::LedgerService;
pub use mart_orders::MartOrderService;
pub use matching::{MatchOutcome, RewardMatcher};
pub use order_sync::{OrderSyncPoller, PollSchedule, TickOutcome};
pub use rate_limit::LookupRateLimiter;
pub use rewards::RewardRegistry;
pub use users::UserService;
pub use worker_pool::{AccrualProcessor, AccrualTask, AccrualWorkerPool, TaskQueue, TaskReceiver};

/// Business logic constants
pub mod constants {
    /// Path of the status lookup on the Accrual service
    pub const ACCRUAL_ORDERS_PATH: &str = "/api/orders";

    /// Retry delay assumed when a 429 carries no usable `Retry-After`
    pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

    /// Smallest `Retry-After` ever reported by the lookup limiter
    pub const MIN_RETRY_AFTER_SECS: u64 = 1;
}
