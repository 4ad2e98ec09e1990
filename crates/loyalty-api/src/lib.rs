//! API layer for the loyalty services
//!
//! HTTP handlers and DTOs of the Accrual service (reward rules, order
//! registration, status lookup) and of the Mart service (users, order
//! uploads, balance and withdrawals).

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use handlers::{configure_accrual, configure_mart, json_config};
pub use state::{
    PgAccrualOrderRegistry, PgLedgerService, PgMartOrderService, PgRewardRegistry,
    PgUserService,
};
