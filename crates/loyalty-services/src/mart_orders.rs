//! Mart order intake

use loyalty_core::{
    luhn,
    models::{UploadOutcome, UserOrder},
    traits::UserOrderRepository,
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Accepts order numbers uploaded by users
pub struct MartOrderService<U: UserOrderRepository> {
    repo: Arc<U>,
}

impl<U: UserOrderRepository> MartOrderService<U> {
    pub fn new(repo: Arc<U>) -> Self {
        Self { repo }
    }

    /// Upload an order number for `login`
    ///
    /// Re-uploading one's own number is a no-op reported as
    /// `AlreadyUploaded`; a number owned by someone else is a `Conflict`.
    #[instrument(skip(self, raw_number))]
    pub async fn upload(&self, login: &str, raw_number: &str) -> AppResult<UploadOutcome> {
        let number = raw_number.trim();
        if number.is_empty() {
            return Err(AppError::InvalidInput("Order number is empty".to_string()));
        }
        if !luhn::is_valid(number) {
            debug!(order = %number, "Rejected order number");
            return Err(AppError::InvalidOrderNumber(number.to_string()));
        }

        let outcome = self.repo.upload(login, number).await?;
        match outcome {
            UploadOutcome::Accepted => info!(order = %number, "Order uploaded"),
            UploadOutcome::AlreadyUploaded => debug!(order = %number, "Order already uploaded"),
        }
        Ok(outcome)
    }

    /// Orders of `login`, oldest upload first
    #[instrument(skip(self))]
    pub async fn list(&self, login: &str) -> AppResult<Vec<UserOrder>> {
        self.repo.list_by_owner(login).await
    }
}
