//! Accrual order registry
//!
//! Owns registration of orders on the Accrual side and the rate-limited
//! status lookup polled by the Mart.

use crate::rate_limit::LookupRateLimiter;
use crate::worker_pool::TaskQueue;
use loyalty_core::{
    luhn,
    models::{AccrualOrder, AccrualOrderView},
    traits::AccrualOrderRepository,
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Registers orders, queues them for processing and serves their status
pub struct AccrualOrderRegistry<O: AccrualOrderRepository> {
    repo: Arc<O>,
    queue: TaskQueue,
    limiter: Arc<LookupRateLimiter>,
}

impl<O: AccrualOrderRepository> AccrualOrderRegistry<O> {
    pub fn new(repo: Arc<O>, queue: TaskQueue, limiter: Arc<LookupRateLimiter>) -> Self {
        Self {
            repo,
            queue,
            limiter,
        }
    }

    /// Register an order and queue it for processing
    ///
    /// The task is queued only after the insert succeeded, so a duplicate
    /// number fails with `Conflict` without producing a second task.
    #[instrument(skip(self, order), fields(order = %order.number, goods = order.goods.len()))]
    pub async fn register(&self, order: AccrualOrder) -> AppResult<()> {
        order.validate()?;

        let order = AccrualOrder::new(order.number, order.goods);
        self.repo.create(&order).await?;
        self.queue.enqueue(&order.number).await?;

        info!("Order registered");
        Ok(())
    }

    /// Current status of an order
    ///
    /// Fails with `RateLimited` when over budget and with `NotFound` for an
    /// unknown or malformed number.
    #[instrument(skip(self))]
    pub async fn get_order(&self, number: &str) -> AppResult<AccrualOrderView> {
        self.limiter.check()?;

        if !luhn::is_valid(number) {
            debug!("Lookup of malformed order number");
            return Err(AppError::NotFound(format!("Order {}", number)));
        }

        self.repo
            .find_view(number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {}", number)))
    }

    /// Re-queue every order left `Registered` or `Processing`
    ///
    /// Orders still sitting in the queue are skipped. Returns the number of
    /// newly queued orders.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> AppResult<usize> {
        let unfinished = self.repo.find_unfinished().await?;

        let mut queued = 0;
        for number in &unfinished {
            if self.queue.enqueue(number).await? {
                queued += 1;
            }
        }

        if queued > 0 {
            warn!("Re-queued {} unfinished orders", queued);
        }
        Ok(queued)
    }
}
