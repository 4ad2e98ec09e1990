//! User order repository implementation
//!
//! Holds uploaded order numbers and applies the results of the order sync
//! poller, crediting owners in the same transaction.

use super::ledger_repo::credit_balance;
use loyalty_core::{
    models::{OrderStatus, OrderSyncUpdate, UploadOutcome, UserOrder},
    traits::{SyncApplied, UserOrderRepository},
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

/// SQLSTATE of a foreign key violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL implementation of UserOrderRepository
pub struct PgUserOrderRepository {
    pool: PgPool,
}

impl PgUserOrderRepository {
    /// Create a new user order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserOrderRepository for PgUserOrderRepository {
    #[instrument(skip(self))]
    async fn upload(&self, login: &str, number: &str) -> AppResult<UploadOutcome> {
        debug!("Uploading order {} for {}", number, login);

        let inserted: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO user_orders (number, user_login, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (number) DO NOTHING
            RETURNING number
            "#,
        )
        .bind(number)
        .bind(login)
        .bind(OrderStatus::New.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            let fk_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == FOREIGN_KEY_VIOLATION)
                .unwrap_or(false);
            if fk_violation {
                AppError::UserNotFound(login.to_string())
            } else {
                error!("Database error uploading order {}: {}", number, e);
                AppError::Database(format!("Failed to upload order: {}", e))
            }
        })?;

        if inserted.is_some() {
            return Ok(UploadOutcome::Accepted);
        }

        let (owner, is_withdrawn): (String, bool) = sqlx::query_as(
            r#"
            SELECT user_login, is_withdrawn
            FROM user_orders
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading owner of {}: {}", number, e);
            AppError::Database(format!("Failed to load order owner: {}", e))
        })?;

        if owner == login && !is_withdrawn {
            Ok(UploadOutcome::AlreadyUploaded)
        } else {
            Err(AppError::Conflict(format!(
                "Order {} was uploaded by another user",
                number
            )))
        }
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, login: &str) -> AppResult<Vec<UserOrder>> {
        let rows = sqlx::query_as::<sqlx::Postgres, UserOrderRow>(
            r#"
            SELECT number, user_login, status, accrual, uploaded_at, processed_at
            FROM user_orders
            WHERE user_login = $1 AND NOT is_withdrawn
            ORDER BY uploaded_at
            "#,
        )
        .bind(login)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing orders of {}: {}", login, e);
            AppError::Database(format!("Failed to list orders: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_pending_numbers(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT number
            FROM user_orders
            WHERE NOT is_withdrawn
              AND status NOT IN ('PROCESSED', 'INVALID')
            ORDER BY uploaded_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing pending orders: {}", e);
            AppError::Database(format!("Failed to list pending orders: {}", e))
        })?;

        Ok(rows.into_iter().map(|(number,)| number).collect())
    }

    #[instrument(skip(self))]
    async fn mark_processing(&self, number: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE user_orders
            SET status = 'PROCESSING'
            WHERE number = $1 AND status = 'NEW'
            "#,
        )
        .bind(number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error marking {} as processing: {}", number, e);
            AppError::Database(format!("Failed to update order: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self, updates), fields(count = updates.len()))]
    async fn apply_sync_updates(&self, updates: &[OrderSyncUpdate]) -> AppResult<SyncApplied> {
        if updates.is_empty() {
            return Ok(SyncApplied::default());
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let mut applied = SyncApplied::default();

        for update in updates {
            // Terminal rows are left alone, so an order is credited at most once
            let owner: Option<(String,)> = sqlx::query_as(
                r#"
                UPDATE user_orders
                SET status = $2,
                    accrual = $3,
                    processed_at = CASE WHEN $4 THEN NOW() ELSE processed_at END
                WHERE number = $1
                  AND NOT is_withdrawn
                  AND status NOT IN ('PROCESSED', 'INVALID')
                RETURNING user_login
                "#,
            )
            .bind(&update.number)
            .bind(update.status.as_str())
            .bind(update.accrual)
            .bind(update.status.is_terminal())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to update order {}: {}", update.number, e);
                AppError::Database(format!("Failed to update order: {}", e))
            })?;

            let Some((owner,)) = owner else {
                debug!("Order {} already terminal, skipping", update.number);
                continue;
            };
            applied.updated += 1;

            if update.status != OrderStatus::Processed {
                continue;
            }

            let amount = update.credit_amount();
            credit_balance(&mut *tx, &owner, amount).await?;
            applied.credited += 1;

            info!(order = %update.number, login = %owner, %amount, "Order accrual credited");
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(applied)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct UserOrderRow {
    number: String,
    user_login: String,
    status: String,
    accrual: Option<Decimal>,
    uploaded_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<UserOrderRow> for UserOrder {
    fn from(row: UserOrderRow) -> Self {
        Self {
            number: row.number,
            owner: row.user_login,
            status: OrderStatus::from_str(&row.status).unwrap_or(OrderStatus::New),
            accrual: row.accrual,
            uploaded_at: row.uploaded_at,
            processed_at: row.processed_at,
        }
    }
}
