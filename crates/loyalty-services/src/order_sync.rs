//! Order sync poller
//!
//! Periodically asks the Accrual service about every non-terminal user
//! order and writes the answers back in one bulk update. A rate-limit
//! answer aborts the tick without writing anything and widens the interval
//! before the next one.

use loyalty_core::{
    models::OrderSyncUpdate,
    traits::{AccrualClient, AccrualLookup, UserOrderRepository},
    AppResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Interval state of the polling loop
#[derive(Debug, Clone)]
pub struct PollSchedule {
    base_interval: Duration,
    backoff_interval: Duration,
    current_interval: Duration,
    next_fire: Instant,
}

impl PollSchedule {
    /// First tick fires one base interval from now
    pub fn new(base_interval: Duration, backoff_interval: Duration) -> Self {
        Self {
            base_interval,
            backoff_interval,
            current_interval: base_interval,
            next_fire: Instant::now() + base_interval,
        }
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    pub fn next_fire(&self) -> Instant {
        self.next_fire
    }

    pub fn is_backing_off(&self) -> bool {
        self.current_interval != self.base_interval
    }

    /// Back to the base interval
    pub fn record_success(&mut self) {
        self.reschedule(self.base_interval);
    }

    /// Widen the interval to the backoff, or to `retry_after` if longer
    pub fn record_rate_limited(&mut self, retry_after: Duration) {
        self.reschedule(self.backoff_interval.max(retry_after));
    }

    fn reschedule(&mut self, interval: Duration) {
        self.current_interval = interval;
        self.next_fire = Instant::now() + interval;
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No pending orders
    Idle,
    Applied { updated: usize, credited: usize },
    /// Aborted, nothing was written
    RateLimited { retry_after: Duration },
}

/// Brings accrual results back into the Mart ledger
pub struct OrderSyncPoller<U: UserOrderRepository, C: AccrualClient> {
    orders: Arc<U>,
    client: Arc<C>,
    schedule: PollSchedule,
}

impl<U: UserOrderRepository, C: AccrualClient> OrderSyncPoller<U, C> {
    pub fn new(
        orders: Arc<U>,
        client: Arc<C>,
        poll_interval: Duration,
        backoff_interval: Duration,
    ) -> Self {
        Self {
            orders,
            client,
            schedule: PollSchedule::new(poll_interval, backoff_interval),
        }
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Run one sync pass
    ///
    /// Lookups are sequential. Updates are only written when every lookup
    /// of the pass went through; any error aborts the pass as a whole.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> AppResult<TickOutcome> {
        let pending = self.orders.find_pending_numbers().await?;
        if pending.is_empty() {
            debug!("No pending orders");
            return Ok(TickOutcome::Idle);
        }

        debug!("Syncing {} pending orders", pending.len());
        let mut updates = Vec::with_capacity(pending.len());

        for number in &pending {
            self.orders.mark_processing(number).await?;

            match self.client.lookup(number).await? {
                AccrualLookup::Found(view) => {
                    updates.push(OrderSyncUpdate::new(number.as_str(), view.status, view.accrual));
                }
                AccrualLookup::NotRegistered => {
                    debug!(order = %number, "Order not registered with accrual service yet");
                }
                AccrualLookup::RateLimited { retry_after } => {
                    warn!(
                        order = %number,
                        retry_after_secs = retry_after.as_secs(),
                        "Accrual service rate limited the sync, discarding {} collected updates",
                        updates.len()
                    );
                    return Ok(TickOutcome::RateLimited { retry_after });
                }
            }
        }

        let applied = self.orders.apply_sync_updates(&updates).await?;
        if applied.updated > 0 {
            info!(
                updated = applied.updated,
                credited = applied.credited,
                "Order statuses synced"
            );
        }

        Ok(TickOutcome::Applied {
            updated: applied.updated,
            credited: applied.credited,
        })
    }

    /// Poll until `shutdown` is cancelled
    ///
    /// Cancellation is only observed between ticks, so a running tick always
    /// completes.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.schedule.current_interval().as_secs(),
            "Order sync poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep_until(self.schedule.next_fire()) => {}
            }

            match self.tick().await {
                Ok(TickOutcome::RateLimited { retry_after }) => {
                    self.schedule.record_rate_limited(retry_after);
                    info!(
                        interval_secs = self.schedule.current_interval().as_secs(),
                        "Backing off order sync"
                    );
                }
                Ok(_) => self.schedule.record_success(),
                Err(e) if e.is_transient() => {
                    warn!("Order sync failed, retrying next tick: {}", e);
                    self.schedule.record_success();
                }
                Err(e) => {
                    error!("Order sync failed: {}", e);
                    self.schedule.record_success();
                }
            }
        }

        info!("Order sync poller stopped");
    }
}
