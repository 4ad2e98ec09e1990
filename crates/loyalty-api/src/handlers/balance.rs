//! Balance and withdrawal handlers

use crate::dto::{WithdrawRequest, WithdrawalResponse};
use crate::state::PgLedgerService;
use actix_web::{web, HttpResponse};
use loyalty_auth::AuthenticatedUser;
use loyalty_core::AppError;
use tracing::{instrument, warn};
use validator::Validate;

/// Current and withdrawn totals of the caller
///
/// GET /api/user/balance
#[instrument(skip(ledger, user), fields(login = %user.login))]
pub async fn get_balance(
    ledger: web::Data<PgLedgerService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let balance = ledger.balance(&user.login).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Spend points on an order
///
/// POST /api/user/balance/withdraw
#[instrument(skip(ledger, user, req), fields(login = %user.login, order = %req.order))]
pub async fn withdraw(
    ledger: web::Data<PgLedgerService>,
    user: AuthenticatedUser,
    req: web::Json<WithdrawRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Withdraw validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let balance = ledger
        .withdraw(&user.login, req.order.trim(), req.sum)
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Withdrawals of the caller, oldest first
///
/// GET /api/user/withdrawals
#[instrument(skip(ledger, user), fields(login = %user.login))]
pub async fn list_withdrawals(
    ledger: web::Data<PgLedgerService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let withdrawals = ledger.list_withdrawals(&user.login).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }

    let response: Vec<WithdrawalResponse> = withdrawals.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Configure balance routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/balance", web::get().to(get_balance))
        .route("/balance/withdraw", web::post().to(withdraw))
        .route("/withdrawals", web::get().to(list_withdrawals));
}
