//! Balance ledger service
//!
//! Every mutation is a single atomic call into the `LedgerRepository`,
//! which serializes concurrent updates of one user at the storage layer.

use loyalty_core::{
    luhn,
    models::{Balance, Withdrawal},
    traits::LedgerRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Balance, credit and withdrawal operations of Mart users
pub struct LedgerService<L: LedgerRepository> {
    repo: Arc<L>,
}

impl<L: LedgerRepository> LedgerService<L> {
    pub fn new(repo: Arc<L>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn balance(&self, login: &str) -> AppResult<Balance> {
        self.repo.balance(login).await
    }

    /// Add `amount` to the spendable balance
    #[instrument(skip(self))]
    pub async fn credit(&self, login: &str, amount: Decimal) -> AppResult<Balance> {
        if amount.is_sign_negative() {
            return Err(AppError::InvalidInput(format!(
                "Credit amount must not be negative: {}",
                amount
            )));
        }
        self.repo.credit(login, amount).await
    }

    /// Spend `sum` points on `order`
    ///
    /// # Errors
    ///
    /// - `InvalidOrderNumber` if `order` fails the Luhn check
    /// - `InvalidInput` if `sum` is not positive
    /// - `InsufficientFunds` if `sum` exceeds the current balance
    /// - `Conflict` if the order number is already used
    #[instrument(skip(self))]
    pub async fn withdraw(&self, login: &str, order: &str, sum: Decimal) -> AppResult<Balance> {
        if !luhn::is_valid(order) {
            return Err(AppError::InvalidOrderNumber(order.to_string()));
        }
        if sum <= Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "Withdrawal sum must be positive: {}",
                sum
            )));
        }

        let balance = self.repo.withdraw(login, order, sum).await.map_err(|e| {
            if matches!(e, AppError::InsufficientFunds { .. }) {
                warn!(%sum, "Withdrawal rejected: insufficient funds");
            }
            e
        })?;

        info!(%sum, current = %balance.current, "Withdrawal recorded");
        Ok(balance)
    }

    /// Withdrawals of `login`, oldest first
    #[instrument(skip(self))]
    pub async fn list_withdrawals(&self, login: &str) -> AppResult<Vec<Withdrawal>> {
        self.repo.list_withdrawals(login).await
    }
}
