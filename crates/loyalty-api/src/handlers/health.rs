//! Health check handlers

use crate::dto::HealthResponse;
use actix_web::{web, HttpResponse};
use loyalty_db::{ping, PgPool};
use tracing::warn;

/// GET /api/health on the Accrual service
pub async fn accrual_health(pool: web::Data<PgPool>) -> HttpResponse {
    health(pool.get_ref(), "accrual").await
}

/// GET /api/health on the Mart service
pub async fn mart_health(pool: web::Data<PgPool>) -> HttpResponse {
    health(pool.get_ref(), "mart").await
}

async fn health(pool: &PgPool, service: &'static str) -> HttpResponse {
    let database_up = match ping(pool).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: {}", e);
            false
        }
    };

    let body = HealthResponse {
        status: if database_up { "healthy" } else { "degraded" },
        service,
        version: env!("CARGO_PKG_VERSION"),
        database: if database_up { "up" } else { "down" },
    };

    if database_up {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
