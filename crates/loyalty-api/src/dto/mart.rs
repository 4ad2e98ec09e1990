//! Mart service DTOs

use chrono::{DateTime, Utc};
use loyalty_core::models::{OrderStatus, UserOrder, Withdrawal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register and login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 100, message = "Login is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register and login response
///
/// The token is also set as the session cookie and the `Authorization`
/// header.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Token lifetime in seconds
    pub expires_in: i64,
}

impl AuthResponse {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Uploaded order as listed to its owner
#[derive(Debug, Clone, Serialize)]
pub struct UserOrderResponse {
    pub number: String,
    pub status: OrderStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,

    pub uploaded_at: DateTime<Utc>,
}

impl From<UserOrder> for UserOrderResponse {
    fn from(order: UserOrder) -> Self {
        Self {
            number: order.number,
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

/// Withdrawal request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WithdrawRequest {
    #[validate(length(min = 1, message = "Order number is required"))]
    pub order: String,

    pub sum: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub order: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self {
            order: w.order,
            sum: w.sum,
            processed_at: w.processed_at,
        }
    }
}

/// Health check body
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}
