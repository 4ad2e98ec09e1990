//! Loyalty Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! shared by the Accrual and Mart services. It includes:
//!
//! - Domain models (reward rules, accrual orders, user orders, balances)
//! - The order status machine shared by both services
//! - Luhn validation of order numbers
//! - Repository and client traits consumed by the service layer
//! - Unified error handling with HTTP response mapping
//! - Service configuration

pub mod config;
pub mod error;
pub mod luhn;
pub mod models;
pub mod traits;

pub use config::{AccrualConfig, MartConfig};
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
