//! Domain models for the loyalty services
//!
//! This module contains all the core domain models used by both the Accrual
//! and the Mart service.

pub mod accrual_order;
pub mod balance;
pub mod reward;
pub mod status;
pub mod user_order;

pub use accrual_order::{AccrualOrder, AccrualOrderView, Good};
pub use balance::{Balance, User, Withdrawal};
pub use reward::{RewardKind, RewardRule};
pub use status::OrderStatus;
pub use user_order::{OrderSyncUpdate, UploadOutcome, UserOrder};
