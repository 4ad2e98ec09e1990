//! Accrual task queue and worker pool
//!
//! Registered orders are queued by number on a bounded channel. N workers
//! share the receiving end behind a mutex, so every task is handed to
//! exactly one worker. A number stays marked as queued until its worker is
//! done with it, and enqueueing a marked number is a no-op. Shutdown is
//! cooperative: a worker only stops while idle, so an order that was
//! dequeued is always carried to its final state.

use crate::matching::RewardMatcher;
use futures::future::join_all;
use loyalty_core::{
    traits::{AccrualOrderRepository, RewardRepository},
    AppError, AppResult,
};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Unit of work for the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualTask {
    pub number: String,
}

/// Numbers queued or being processed
type QueuedSet = Arc<SyncMutex<HashSet<String>>>;

/// Producer side of the task queue
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<AccrualTask>,
    queued: QueuedSet,
}

/// Consumer side of the task queue, handed to the pool
pub struct TaskReceiver {
    receiver: mpsc::Receiver<AccrualTask>,
    queued: QueuedSet,
}

impl TaskQueue {
    /// Queue holding at most `capacity` pending tasks
    pub fn bounded(capacity: usize) -> (TaskQueue, TaskReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queued = QueuedSet::default();
        (
            TaskQueue {
                sender,
                queued: queued.clone(),
            },
            TaskReceiver { receiver, queued },
        )
    }

    /// Queue an order for processing, waiting for room when the queue is full
    ///
    /// Returns `false` without queueing when the order is already queued or
    /// still being processed.
    pub async fn enqueue(&self, number: &str) -> AppResult<bool> {
        let inserted = self.queued.lock().insert(number.to_string());
        if !inserted {
            debug!(order = %number, "Order already queued");
            return Ok(false);
        }

        let sent = self
            .sender
            .send(AccrualTask {
                number: number.to_string(),
            })
            .await;

        if sent.is_err() {
            self.queued.lock().remove(number);
            error!(order = %number, "Accrual task queue is closed");
            return Err(AppError::Internal("Accrual task queue is closed".to_string()));
        }
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn is_queued(&self, number: &str) -> bool {
        self.queued.lock().contains(number)
    }
}

#[cfg(test)]
impl TaskReceiver {
    pub(crate) fn try_recv(&mut self) -> Result<AccrualTask, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Carries a single order from `Registered` to its final state
pub struct AccrualProcessor<R: RewardRepository, O: AccrualOrderRepository> {
    rewards: Arc<R>,
    orders: Arc<O>,
}

impl<R: RewardRepository, O: AccrualOrderRepository> AccrualProcessor<R, O> {
    pub fn new(rewards: Arc<R>, orders: Arc<O>) -> Self {
        Self { rewards, orders }
    }

    /// Process one order
    ///
    /// The order is moved to `Processing`, matched against the current rule
    /// set and completed. On error it stays in its last persisted state for
    /// the next reconciliation; nothing is retried here.
    #[instrument(skip(self))]
    pub async fn process(&self, number: &str) -> AppResult<()> {
        let Some(order) = self.orders.find(number).await? else {
            warn!("Queued order no longer exists");
            return Ok(());
        };

        if order.status.is_terminal() || !self.orders.claim(number).await? {
            debug!(status = %order.status, "Order already final, skipping");
            return Ok(());
        }

        let rules = self.rewards.list().await?;
        let outcome = RewardMatcher::new(rules).evaluate(&order.goods);

        if !self
            .orders
            .complete(number, outcome.status, outcome.accrual)
            .await?
        {
            warn!("Order became final while processing, result dropped");
            return Ok(());
        }

        info!(
            status = %outcome.status,
            accrual = ?outcome.accrual,
            "Order processed"
        );
        Ok(())
    }
}

/// Fixed set of workers consuming the task queue
pub struct AccrualWorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl AccrualWorkerPool {
    /// Spawn `workers` workers (at least one)
    pub fn start<R, O>(
        processor: Arc<AccrualProcessor<R, O>>,
        tasks: TaskReceiver,
        workers: usize,
        shutdown: CancellationToken,
    ) -> Self
    where
        R: RewardRepository + 'static,
        O: AccrualOrderRepository + 'static,
    {
        let TaskReceiver { receiver, queued } = tasks;
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = workers.max(1);

        let handles = (0..workers)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    processor.clone(),
                    receiver.clone(),
                    queued.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!("Accrual worker pool started with {} workers", workers);

        Self { handles, shutdown }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop all workers, letting in-flight tasks finish
    pub async fn shutdown(self) {
        info!("Stopping accrual worker pool");
        self.shutdown.cancel();

        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!("Accrual worker terminated abnormally: {}", e);
            }
        }

        info!("Accrual worker pool stopped");
    }
}

async fn run_worker<R, O>(
    id: usize,
    processor: Arc<AccrualProcessor<R, O>>,
    receiver: Arc<Mutex<mpsc::Receiver<AccrualTask>>>,
    queued: QueuedSet,
    shutdown: CancellationToken,
) where
    R: RewardRepository,
    O: AccrualOrderRepository,
{
    debug!(worker = id, "Accrual worker started");

    loop {
        let task = {
            let mut receiver = receiver.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                task = receiver.recv() => task,
            }
        };

        let Some(task) = task else {
            break;
        };

        if let Err(e) = processor.process(&task.number).await {
            error!(worker = id, order = %task.number, "Failed to process order: {}", e);
        }
        queued.lock().remove(&task.number);
    }

    debug!(worker = id, "Accrual worker stopped");
}
