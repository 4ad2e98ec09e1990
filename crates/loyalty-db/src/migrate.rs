//! Embedded schema migrations
//!
//! Each service owns its own database and migration set.

use loyalty_core::{AppError, AppResult};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::{error, info};

static ACCRUAL_MIGRATOR: Migrator = sqlx::migrate!("./migrations/accrual");
static MART_MIGRATOR: Migrator = sqlx::migrate!("./migrations/mart");

/// Apply the Accrual service schema
pub async fn run_accrual_migrations(pool: &PgPool) -> AppResult<()> {
    run(&ACCRUAL_MIGRATOR, pool, "accrual").await
}

/// Apply the Mart service schema
pub async fn run_mart_migrations(pool: &PgPool) -> AppResult<()> {
    run(&MART_MIGRATOR, pool, "mart").await
}

async fn run(migrator: &Migrator, pool: &PgPool, schema: &str) -> AppResult<()> {
    info!("Applying {} migrations", schema);

    migrator.run(pool).await.map_err(|e| {
        error!("Failed to apply {} migrations: {}", schema, e);
        AppError::Database(format!("Migration failed: {}", e))
    })?;

    info!("{} schema is up to date", schema);
    Ok(())
}
