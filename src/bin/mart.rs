//! Mart service
//!
//! User accounts, order uploads, balances and withdrawals, plus the poller
//! that brings accrual results over from the Accrual service.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpServer};
use anyhow::Context;
use loyalty_api::{configure_mart, json_config};
use loyalty_auth::{JwtService, PasswordService};
use loyalty_backend::init_tracing;
use loyalty_core::MartConfig;
use loyalty_db::{
    create_pool, run_mart_migrations, PgLedgerRepository, PgUserOrderRepository,
    PgUserRepository,
};
use loyalty_services::{
    HttpAccrualClient, LedgerService, MartOrderService, OrderSyncPoller, UserService,
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

    let config = MartConfig::load().context("Failed to load mart configuration")?;

    info!("Starting mart service v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database).await?;
    run_mart_migrations(&pool).await?;

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));
    info!(
        "JWT service configured with {} second token expiration",
        config.auth.jwt_expiration_secs
    );

    let user_orders = Arc::new(PgUserOrderRepository::new(pool.clone()));

    let users = web::Data::new(UserService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        PasswordService::new(),
        jwt_service.clone(),
    ));
    let orders = web::Data::new(MartOrderService::new(user_orders.clone()));
    let ledger = web::Data::new(LedgerService::new(Arc::new(PgLedgerRepository::new(
        pool.clone(),
    ))));

    let client = Arc::new(HttpAccrualClient::new(
        &config.sync.accrual_address,
        config.sync.request_timeout(),
    )?);
    info!(accrual = %client.base_url(), "Order sync configured");

    let shutdown = CancellationToken::new();
    let poller = OrderSyncPoller::new(
        user_orders,
        client,
        config.sync.poll_interval(),
        config.sync.backoff_interval(),
    );
    let poller_handle = tokio::spawn(poller.run(shutdown.clone()));

    let bind_addr = config.server.bind_addr();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, config.server.workers
    );

    let pool_data = web::Data::new(pool);
    let jwt_data = web::Data::new(jwt_service);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .expose_headers(vec![header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .app_data(jwt_data.clone())
            .app_data(users.clone())
            .app_data(orders.clone())
            .app_data(ledger.clone())
            .app_data(json_config())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_mart)
    })
    .workers(config.server.workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    info!("HTTP server stopped");
    shutdown.cancel();
    if let Err(e) = poller_handle.await {
        error!("Order sync poller terminated abnormally: {}", e);
    }

    Ok(())
}
