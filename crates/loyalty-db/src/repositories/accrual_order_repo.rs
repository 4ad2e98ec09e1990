//! Accrual order repository implementation
//!
//! Orders and their goods live in two tables and are always written together.

use super::is_unique_violation;
use loyalty_core::{
    models::{AccrualOrder, AccrualOrderView, Good, OrderStatus},
    traits::AccrualOrderRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

/// PostgreSQL implementation of AccrualOrderRepository
pub struct PgAccrualOrderRepository {
    pool: PgPool,
}

impl PgAccrualOrderRepository {
    /// Create a new accrual order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database status string to enum
    fn parse_status(s: &str) -> OrderStatus {
        OrderStatus::from_str(s).unwrap_or_else(|| {
            warn!("Unknown order status '{}', treating as REGISTERED", s);
            OrderStatus::Registered
        })
    }
}

#[async_trait]
impl AccrualOrderRepository for PgAccrualOrderRepository {
    #[instrument(skip(self, order), fields(order = %order.number, goods = order.goods.len()))]
    async fn create(&self, order: &AccrualOrder) -> AppResult<()> {
        debug!("Registering accrual order");

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let (order_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO orders (number, status)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&order.number)
        .bind(OrderStatus::Registered.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Order {} is already registered", order.number))
            } else {
                error!("Database error creating order: {}", e);
                AppError::Database(format!("Failed to create order: {}", e))
            }
        })?;

        for (position, good) in order.goods.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_goods (order_id, position, description, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(position as i32)
            .bind(&good.description)
            .bind(good.price)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert good: {}", e);
                AppError::Database(format!("Failed to insert good: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find(&self, number: &str) -> AppResult<Option<AccrualOrder>> {
        let Some(row) = sqlx::query_as::<sqlx::Postgres, OrderRow>(
            r#"
            SELECT id, number, status, accrual
            FROM orders
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding order {}: {}", number, e);
            AppError::Database(format!("Failed to find order: {}", e))
        })?
        else {
            return Ok(None);
        };

        let goods = sqlx::query_as::<sqlx::Postgres, GoodRow>(
            r#"
            SELECT description, price
            FROM order_goods
            WHERE order_id = $1
            ORDER BY position
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading goods of {}: {}", number, e);
            AppError::Database(format!("Failed to load goods: {}", e))
        })?;

        Ok(Some(AccrualOrder {
            number: row.number,
            status: Self::parse_status(&row.status),
            goods: goods
                .into_iter()
                .map(|g| Good::new(g.description, g.price))
                .collect(),
            accrual: row.accrual,
        }))
    }

    #[instrument(skip(self))]
    async fn find_view(&self, number: &str) -> AppResult<Option<AccrualOrderView>> {
        let row = sqlx::query_as::<sqlx::Postgres, OrderRow>(
            r#"
            SELECT id, number, status, accrual
            FROM orders
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding order {}: {}", number, e);
            AppError::Database(format!("Failed to find order: {}", e))
        })?;

        Ok(row.map(|row| AccrualOrderView {
            status: Self::parse_status(&row.status),
            number: row.number,
            accrual: row.accrual,
        }))
    }

    #[instrument(skip(self))]
    async fn claim(&self, number: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'PROCESSING',
                updated_at = NOW()
            WHERE number = $1
              AND status IN ('REGISTERED', 'PROCESSING')
            "#,
        )
        .bind(number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error claiming order {}: {}", number, e);
            AppError::Database(format!("Failed to claim order: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn complete(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2,
                accrual = $3,
                updated_at = NOW()
            WHERE number = $1
              AND status IN ('REGISTERED', 'PROCESSING')
            "#,
        )
        .bind(number)
        .bind(status.as_str())
        .bind(accrual)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error completing order {}: {}", number, e);
            AppError::Database(format!("Failed to complete order: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_unfinished(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT number
            FROM orders
            WHERE status IN ('REGISTERED', 'PROCESSING')
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing unfinished orders: {}", e);
            AppError::Database(format!("Failed to list unfinished orders: {}", e))
        })?;

        Ok(rows.into_iter().map(|(number,)| number).collect())
    }
}

/// Helper structs for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    number: String,
    status: String,
    accrual: Option<Decimal>,
}

#[derive(Debug, sqlx::FromRow)]
struct GoodRow {
    description: String,
    price: Decimal,
}
