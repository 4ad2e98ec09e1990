//! HTTP request handlers

pub mod accrual;
pub mod auth;
pub mod balance;
pub mod health;
pub mod orders;

use actix_web::web;
use loyalty_core::AppError;
use tracing::warn;

/// Maximum accepted JSON body
const JSON_LIMIT: usize = 256 * 1024;

/// Routes of the Accrual service
pub fn configure_accrual(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::accrual_health))
            .configure(accrual::configure),
    );
}

/// Routes of the Mart service
pub fn configure_mart(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::mart_health))
            .service(
                web::scope("/user")
                    .configure(auth::configure)
                    .configure(orders::configure)
                    .configure(balance::configure),
            ),
    );
}

/// JSON extractor config answering malformed bodies with the API error format
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            warn!("Rejected JSON body: {}", err);
            AppError::InvalidInput(err.to_string()).into()
        })
}
