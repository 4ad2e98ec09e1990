//! Accrual service
//!
//! Registers reward rules and orders, computes accruals in a worker pool
//! and serves the rate-limited status lookup.

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use loyalty_api::{configure_accrual, json_config};
use loyalty_backend::init_tracing;
use loyalty_core::AccrualConfig;
use loyalty_db::{
    create_pool, run_accrual_migrations, PgAccrualOrderRepository, PgRewardRepository,
};
use loyalty_services::{
    AccrualOrderRegistry, AccrualProcessor, AccrualWorkerPool, LookupRateLimiter,
    RewardRegistry, TaskQueue,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AccrualConfig::load().context("Failed to load accrual configuration")?;

    info!(
        "Starting accrual service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(&config.database).await?;
    run_accrual_migrations(&pool).await?;

    let reward_repo = Arc::new(PgRewardRepository::new(pool.clone()));
    let order_repo = Arc::new(PgAccrualOrderRepository::new(pool.clone()));

    let (queue, receiver) = TaskQueue::bounded(config.accrual.queue_capacity);
    let limiter = Arc::new(LookupRateLimiter::new(
        config.accrual.rate_limit_per_second,
        config.accrual.rate_limit_burst,
    ));

    let rewards = web::Data::new(RewardRegistry::new(reward_repo.clone()));
    let orders = web::Data::new(AccrualOrderRegistry::new(
        order_repo.clone(),
        queue,
        limiter,
    ));

    let shutdown = CancellationToken::new();
    let processor = Arc::new(AccrualProcessor::new(reward_repo, order_repo));
    let workers = AccrualWorkerPool::start(
        processor,
        receiver,
        config.accrual.workers,
        shutdown.clone(),
    );

    // Resume orders left unfinished by a previous run before accepting new ones
    match orders.reconcile().await {
        Ok(0) => {}
        Ok(count) => info!("Re-queued {} unfinished orders", count),
        Err(e) => error!("Reconciliation failed: {}", e),
    }

    let bind_addr = config.server.bind_addr();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, config.server.workers
    );

    let pool_data = web::Data::new(pool);
    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(rewards.clone())
            .app_data(orders.clone())
            .app_data(json_config())
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_accrual)
    })
    .workers(config.server.workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    info!("HTTP server stopped");
    workers.shutdown().await;

    Ok(())
}
