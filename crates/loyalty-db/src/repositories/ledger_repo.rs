//! Balance ledger repository implementation
//!
//! Withdrawals lock the user's row with `SELECT ... FOR UPDATE`, so concurrent
//! debits for the same user are serialised.

use super::is_unique_violation;
use loyalty_core::{
    models::{Balance, OrderStatus, Withdrawal},
    traits::LedgerRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use tracing::{error, info, instrument, warn};

/// PostgreSQL implementation of LedgerRepository
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    /// Create a new ledger repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Add `amount` to the spendable balance of `login`
///
/// Runs on any executor so the order sync can credit inside its own
/// transaction.
pub(crate) async fn credit_balance<'e, E>(
    executor: E,
    login: &str,
    amount: Decimal,
) -> AppResult<Balance>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<sqlx::Postgres, BalanceRow>(
        r#"
        UPDATE users
        SET current = current + $2
        WHERE login = $1
        RETURNING current, withdrawn
        "#,
    )
    .bind(login)
    .bind(amount)
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        error!("Database error crediting {}: {}", login, e);
        AppError::Database(format!("Failed to credit balance: {}", e))
    })?
    .ok_or_else(|| AppError::UserNotFound(login.to_string()))?;

    Ok(row.into())
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    #[instrument(skip(self))]
    async fn balance(&self, login: &str) -> AppResult<Balance> {
        let row = sqlx::query_as::<sqlx::Postgres, BalanceRow>(
            r#"
            SELECT current, withdrawn
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading balance of {}: {}", login, e);
            AppError::Database(format!("Failed to load balance: {}", e))
        })?
        .ok_or_else(|| AppError::UserNotFound(login.to_string()))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn credit(&self, login: &str, amount: Decimal) -> AppResult<Balance> {
        credit_balance(&self.pool, login, amount).await
    }

    #[instrument(skip(self))]
    async fn withdraw(&self, login: &str, order: &str, sum: Decimal) -> AppResult<Balance> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        // Lock user row
        let balance: Balance = sqlx::query_as::<sqlx::Postgres, BalanceRow>(
            r#"
            SELECT current, withdrawn
            FROM users
            WHERE login = $1
            FOR UPDATE
            "#,
        )
        .bind(login)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to lock user {}: {}", login, e);
            AppError::Database(format!("Failed to lock user: {}", e))
        })?
        .ok_or_else(|| AppError::UserNotFound(login.to_string()))?
        .into();

        if !balance.can_withdraw(sum) {
            warn!(
                "Insufficient points for {}: required {}, available {}",
                login, sum, balance.current
            );
            return Err(AppError::InsufficientFunds {
                required: sum.to_string(),
                available: balance.current.to_string(),
            });
        }

        let updated: Balance = sqlx::query_as::<sqlx::Postgres, BalanceRow>(
            r#"
            UPDATE users
            SET current = current - $2,
                withdrawn = withdrawn + $2
            WHERE login = $1
            RETURNING current, withdrawn
            "#,
        )
        .bind(login)
        .bind(sum)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to debit {}: {}", login, e);
            AppError::Database(format!("Failed to update balance: {}", e))
        })?
        .into();

        sqlx::query(
            r#"
            INSERT INTO user_orders (
                number, user_login, status, sum, is_withdrawn, processed_at
            )
            VALUES ($1, $2, $3, $4, TRUE, NOW())
            "#,
        )
        .bind(order)
        .bind(login)
        .bind(OrderStatus::Processed.as_str())
        .bind(sum)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Order {} is already used", order))
            } else {
                error!("Failed to record withdrawal: {}", e);
                AppError::Database(format!("Failed to record withdrawal: {}", e))
            }
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(login = %login, order = %order, %sum, "Withdrawal recorded");

        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn list_withdrawals(&self, login: &str) -> AppResult<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<sqlx::Postgres, WithdrawalRow>(
            r#"
            SELECT number, COALESCE(sum, 0) AS sum, COALESCE(processed_at, uploaded_at) AS processed_at
            FROM user_orders
            WHERE user_login = $1 AND is_withdrawn
            ORDER BY processed_at, uploaded_at
            "#,
        )
        .bind(login)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing withdrawals of {}: {}", login, e);
            AppError::Database(format!("Failed to list withdrawals: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper structs for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    current: Decimal,
    withdrawn: Decimal,
}

impl From<BalanceRow> for Balance {
    fn from(row: BalanceRow) -> Self {
        Self {
            current: row.current,
            withdrawn: row.withdrawn,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WithdrawalRow {
    number: String,
    sum: Decimal,
    processed_at: DateTime<Utc>,
}

impl From<WithdrawalRow> for Withdrawal {
    fn from(row: WithdrawalRow) -> Self {
        Self {
            order: row.number,
            sum: row.sum,
            processed_at: row.processed_at,
        }
    }
}
