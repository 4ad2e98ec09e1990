//! Order upload handlers

use crate::dto::UserOrderResponse;
use crate::state::PgMartOrderService;
use actix_web::{web, HttpResponse};
use loyalty_auth::AuthenticatedUser;
use loyalty_core::models::UploadOutcome;
use loyalty_core::AppError;
use tracing::instrument;

/// Upload an order number sent as plain text
///
/// POST /api/user/orders
///
/// 202 for a new upload, 200 if the caller already uploaded it.
#[instrument(skip(orders, user, body), fields(login = %user.login))]
pub async fn upload_order(
    orders: web::Data<PgMartOrderService>,
    user: AuthenticatedUser,
    body: String,
) -> Result<HttpResponse, AppError> {
    match orders.upload(&user.login, &body).await? {
        UploadOutcome::Accepted => Ok(HttpResponse::Accepted().finish()),
        UploadOutcome::AlreadyUploaded => Ok(HttpResponse::Ok().finish()),
    }
}

/// List the caller's orders, oldest first
///
/// GET /api/user/orders
#[instrument(skip(orders, user), fields(login = %user.login))]
pub async fn list_orders(
    orders: web::Data<PgMartOrderService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let list = orders.list(&user.login).await?;
    if list.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }

    let response: Vec<UserOrderResponse> = list.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Configure order routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::post().to(upload_order))
        .route("/orders", web::get().to(list_orders));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use loyalty_auth::JwtService;
    use loyalty_db::{PgPool, PgUserOrderRepository};
    use std::sync::Arc;

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new("test-secret-key-12345", 3600))
    }

    fn order_service() -> PgMartOrderService {
        let pool = PgPool::connect_lazy("postgres://localhost/loyalty_unreachable").unwrap();
        PgMartOrderService::new(Arc::new(PgUserOrderRepository::new(pool)))
    }

    #[actix_web::test]
    async fn test_upload_requires_session() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt()))
                .app_data(web::Data::new(order_service()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_payload("79927398713")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }

    #[actix_web::test]
    async fn test_upload_rejects_bad_numbers() {
        let jwt = jwt();
        let token = jwt.issue_session("alice").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .app_data(web::Data::new(order_service()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_payload("12345678902")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 422);

        let req = test::TestRequest::post()
            .uri("/orders")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_payload("")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
