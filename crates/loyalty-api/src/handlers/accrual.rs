//! Accrual service handlers
//!
//! Reward rule registration, order registration and the status lookup
//! polled by the Mart.

use crate::dto::RegisterOrderRequest;
use crate::state::{PgAccrualOrderRegistry, PgRewardRegistry};
use actix_web::{web, HttpResponse};
use loyalty_core::models::RewardRule;
use loyalty_core::AppError;
use tracing::{debug, instrument};

/// Register a reward rule
///
/// POST /api/goods
#[instrument(skip(rewards, req), fields(rule = %req.match_key))]
pub async fn register_reward(
    rewards: web::Data<PgRewardRegistry>,
    req: web::Json<RewardRule>,
) -> Result<HttpResponse, AppError> {
    rewards.create_rule(req.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

/// List reward rules in matching order
///
/// GET /api/goods
pub async fn list_rewards(rewards: web::Data<PgRewardRegistry>) -> Result<HttpResponse, AppError> {
    let rules = rewards.list_rules().await?;
    Ok(HttpResponse::Ok().json(rules))
}

/// Register an order for accrual
///
/// POST /api/orders
#[instrument(skip(orders, req), fields(order = %req.number))]
pub async fn register_order(
    orders: web::Data<PgAccrualOrderRegistry>,
    req: web::Json<RegisterOrderRequest>,
) -> Result<HttpResponse, AppError> {
    orders.register(req.into_inner().into()).await?;
    Ok(HttpResponse::Accepted().finish())
}

/// Current status of an order
///
/// GET /api/orders/{number}
///
/// Unknown orders answer 204, over-budget callers 429 with `Retry-After`.
#[instrument(skip(orders))]
pub async fn get_order(
    orders: web::Data<PgAccrualOrderRegistry>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let number = path.into_inner();
    match orders.get_order(&number).await {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(AppError::NotFound(_)) => {
            debug!("Order not registered");
            Ok(HttpResponse::NoContent().finish())
        }
        Err(e) => Err(e),
    }
}

/// Configure accrual routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/goods", web::post().to(register_reward))
        .route("/goods", web::get().to(list_rewards))
        .route("/orders", web::post().to(register_order))
        .route("/orders/{number}", web::get().to(get_order));
}
