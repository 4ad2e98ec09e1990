//! Common traits for repositories and collaborators
//!
//! Defines the storage abstractions of both services and the client used by
//! the Mart to reach the Accrual service.

use crate::error::AppError;
use crate::models::{
    AccrualOrder, AccrualOrderView, Balance, OrderStatus, OrderSyncUpdate, RewardRule,
    UploadOutcome, User, UserOrder, Withdrawal,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;

// ==================== Accrual service ====================

/// Reward rule storage
#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// Insert a rule, `Conflict` if the match key is taken
    async fn create(&self, rule: &RewardRule) -> Result<RewardRule, AppError>;

    /// All rules in registration order
    async fn list(&self) -> Result<Vec<RewardRule>, AppError>;
}

/// Accrual order storage
#[async_trait]
pub trait AccrualOrderRepository: Send + Sync {
    /// Insert an order with its goods, `Conflict` if the number exists
    async fn create(&self, order: &AccrualOrder) -> Result<(), AppError>;

    /// Full order including goods
    async fn find(&self, number: &str) -> Result<Option<AccrualOrder>, AppError>;

    /// Public status view
    async fn find_view(&self, number: &str) -> Result<Option<AccrualOrderView>, AppError>;

    /// Claim an order for processing
    ///
    /// Moves a `Registered` or `Processing` order into `Processing`. Returns
    /// `false` when the order is unknown or already final.
    async fn claim(&self, number: &str) -> Result<bool, AppError>;

    /// Persist the final status and accrual
    ///
    /// Only a non-terminal order is written; returns `false` otherwise.
    async fn complete(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> Result<bool, AppError>;

    /// Numbers of orders still `Registered` or `Processing`
    async fn find_unfinished(&self) -> Result<Vec<String>, AppError>;
}

// ==================== Mart service ====================

/// User account storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user with a zero balance, `AlreadyExists` if the login is taken
    async fn create(&self, login: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;
}

/// Result of a bulk sync write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncApplied {
    /// Rows whose status or accrual changed
    pub updated: usize,
    /// Rows that moved into `Processed` and credited their owner
    pub credited: usize,
}

/// User order storage
#[async_trait]
pub trait UserOrderRepository: Send + Sync {
    /// Record an uploaded number for `login`
    ///
    /// Returns `Conflict` when the number belongs to another user.
    async fn upload(&self, login: &str, number: &str) -> Result<UploadOutcome, AppError>;

    /// Orders of one user by upload time, withdrawals excluded
    async fn list_by_owner(&self, login: &str) -> Result<Vec<UserOrder>, AppError>;

    /// Numbers of non-terminal orders across all users
    async fn find_pending_numbers(&self) -> Result<Vec<String>, AppError>;

    /// Mark a pending order `Processing`
    async fn mark_processing(&self, number: &str) -> Result<(), AppError>;

    /// Apply all updates in one transaction, crediting owners of orders
    /// that become `Processed`. Rows already terminal are left alone.
    async fn apply_sync_updates(&self, updates: &[OrderSyncUpdate])
        -> Result<SyncApplied, AppError>;
}

/// Balance and withdrawal storage
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn balance(&self, login: &str) -> Result<Balance, AppError>;

    /// Increase `current` by `amount`
    async fn credit(&self, login: &str, amount: Decimal) -> Result<Balance, AppError>;

    /// Debit `sum` and record the withdrawal atomically
    ///
    /// `InsufficientFunds` if `sum` exceeds `current`, `Conflict` if the order
    /// number is already used.
    async fn withdraw(&self, login: &str, order: &str, sum: Decimal)
        -> Result<Balance, AppError>;

    /// Withdrawals ordered by `processed_at` ascending
    async fn list_withdrawals(&self, login: &str) -> Result<Vec<Withdrawal>, AppError>;
}

// ==================== Cross-service client ====================

/// Answer of the Accrual status lookup
#[derive(Debug, Clone, PartialEq)]
pub enum AccrualLookup {
    Found(AccrualOrderView),
    /// The Accrual service does not know the order (yet)
    NotRegistered,
    /// Over budget, try again after the given delay
    RateLimited { retry_after: Duration },
}

/// Client for the Accrual status lookup
#[async_trait]
pub trait AccrualClient: Send + Sync {
    async fn lookup(&self, number: &str) -> Result<AccrualLookup, AppError>;
}
