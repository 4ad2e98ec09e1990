//! Data Transfer Objects for API requests and responses

pub mod accrual;
pub mod mart;

pub use accrual::{GoodRequest, RegisterOrderRequest};
pub use mart::{
    AuthResponse, CredentialsRequest, HealthResponse, UserOrderResponse, WithdrawRequest,
    WithdrawalResponse,
};
