//! In-memory doubles of the storage and client traits

use async_trait::async_trait;
use chrono::Utc;
use loyalty_core::models::{
    AccrualOrder, AccrualOrderView, Balance, OrderStatus, OrderSyncUpdate, RewardRule,
    UploadOutcome, User, UserOrder, Withdrawal,
};
use loyalty_core::traits::{
    AccrualClient, AccrualLookup, AccrualOrderRepository, LedgerRepository, RewardRepository,
    SyncApplied, UserOrderRepository, UserRepository,
};
use loyalty_core::{AppError, AppResult};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

#[derive(Default)]
struct StoreState {
    rewards: Vec<RewardRule>,
    accrual_orders: Vec<AccrualOrder>,
    users: HashMap<String, User>,
    user_orders: Vec<StoredUserOrder>,
}

struct StoredUserOrder {
    order: UserOrder,
    sum: Option<Decimal>,
    is_withdrawn: bool,
}

/// Single store implementing every repository trait
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    /// Countdown of store calls until one fails with a database error
    fail_at: Mutex<Option<usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the store call `skip` calls from now fail
    pub fn fail_call(&self, skip: usize) {
        *self.fail_at.lock() = Some(skip);
    }

    fn check_failure(&self) -> AppResult<()> {
        let mut fail_at = self.fail_at.lock();
        match *fail_at {
            Some(0) => {
                *fail_at = None;
                Err(AppError::Database("connection reset".to_string()))
            }
            Some(n) => {
                *fail_at = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn accrual_order(&self, number: &str) -> Option<AccrualOrder> {
        self.state
            .lock()
            .accrual_orders
            .iter()
            .find(|o| o.number == number)
            .cloned()
    }

    pub fn user_order(&self, number: &str) -> Option<UserOrder> {
        self.state
            .lock()
            .user_orders
            .iter()
            .find(|o| o.order.number == number)
            .map(|o| o.order.clone())
    }

    pub fn user_order_count(&self) -> usize {
        self.state.lock().user_orders.len()
    }

    pub fn add_user(&self, login: &str, current: Decimal) {
        let mut user = User::new(login, "hash");
        user.current = current;
        self.state.lock().users.insert(login.to_string(), user);
    }

    pub fn user_balance(&self, login: &str) -> Balance {
        self.state
            .lock()
            .users
            .get(login)
            .map(User::balance)
            .unwrap_or_default()
    }
}

#[async_trait]
impl RewardRepository for InMemoryStore {
    async fn create(&self, rule: &RewardRule) -> AppResult<RewardRule> {
        self.check_failure()?;
        let mut state = self.state.lock();
        if state.rewards.iter().any(|r| r.match_key == rule.match_key) {
            return Err(AppError::Conflict(rule.match_key.clone()));
        }
        state.rewards.push(rule.clone());
        Ok(rule.clone())
    }

    async fn list(&self) -> AppResult<Vec<RewardRule>> {
        self.check_failure()?;
        Ok(self.state.lock().rewards.clone())
    }
}

#[async_trait]
impl AccrualOrderRepository for InMemoryStore {
    async fn create(&self, order: &AccrualOrder) -> AppResult<()> {
        self.check_failure()?;
        let mut state = self.state.lock();
        if state.accrual_orders.iter().any(|o| o.number == order.number) {
            return Err(AppError::Conflict(order.number.clone()));
        }
        let mut stored = order.clone();
        stored.status = OrderStatus::Registered;
        state.accrual_orders.push(stored);
        Ok(())
    }

    async fn find(&self, number: &str) -> AppResult<Option<AccrualOrder>> {
        self.check_failure()?;
        Ok(self.accrual_order(number))
    }

    async fn find_view(&self, number: &str) -> AppResult<Option<AccrualOrderView>> {
        self.check_failure()?;
        Ok(self.accrual_order(number).map(|o| o.view()))
    }

    async fn claim(&self, number: &str) -> AppResult<bool> {
        self.check_failure()?;
        let mut state = self.state.lock();
        match state
            .accrual_orders
            .iter_mut()
            .find(|o| o.number == number && !o.status.is_terminal())
        {
            Some(order) => {
                order.status = OrderStatus::Processing;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> AppResult<bool> {
        self.check_failure()?;
        let mut state = self.state.lock();
        match state
            .accrual_orders
            .iter_mut()
            .find(|o| o.number == number && !o.status.is_terminal())
        {
            Some(order) => {
                order.status = status;
                order.accrual = accrual;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_unfinished(&self) -> AppResult<Vec<String>> {
        self.check_failure()?;
        Ok(self
            .state
            .lock()
            .accrual_orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.number.clone())
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, login: &str, password_hash: &str) -> AppResult<User> {
        self.check_failure()?;
        let mut state = self.state.lock();
        if state.users.contains_key(login) {
            return Err(AppError::AlreadyExists(login.to_string()));
        }
        let user = User::new(login, password_hash);
        state.users.insert(login.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        self.check_failure()?;
        Ok(self.state.lock().users.get(login).cloned())
    }
}

#[async_trait]
impl UserOrderRepository for InMemoryStore {
    async fn upload(&self, login: &str, number: &str) -> AppResult<UploadOutcome> {
        self.check_failure()?;
        let mut state = self.state.lock();
        if let Some(existing) = state.user_orders.iter().find(|o| o.order.number == number) {
            return if existing.order.owner == login && !existing.is_withdrawn {
                Ok(UploadOutcome::AlreadyUploaded)
            } else {
                Err(AppError::Conflict(number.to_string()))
            };
        }
        state.user_orders.push(StoredUserOrder {
            order: UserOrder::new(number, login),
            sum: None,
            is_withdrawn: false,
        });
        Ok(UploadOutcome::Accepted)
    }

    async fn list_by_owner(&self, login: &str) -> AppResult<Vec<UserOrder>> {
        self.check_failure()?;
        Ok(self
            .state
            .lock()
            .user_orders
            .iter()
            .filter(|o| o.order.owner == login && !o.is_withdrawn)
            .map(|o| o.order.clone())
            .collect())
    }

    async fn find_pending_numbers(&self) -> AppResult<Vec<String>> {
        self.check_failure()?;
        Ok(self
            .state
            .lock()
            .user_orders
            .iter()
            .filter(|o| !o.is_withdrawn && o.order.is_pending())
            .map(|o| o.order.number.clone())
            .collect())
    }

    async fn mark_processing(&self, number: &str) -> AppResult<()> {
        self.check_failure()?;
        let mut state = self.state.lock();
        if let Some(stored) = state
            .user_orders
            .iter_mut()
            .find(|o| o.order.number == number && o.order.status == OrderStatus::New)
        {
            stored.order.status = OrderStatus::Processing;
        }
        Ok(())
    }

    async fn apply_sync_updates(&self, updates: &[OrderSyncUpdate]) -> AppResult<SyncApplied> {
        self.check_failure()?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut applied = SyncApplied::default();

        for update in updates {
            let Some(stored) = state.user_orders.iter_mut().find(|o| {
                o.order.number == update.number && !o.is_withdrawn && o.order.is_pending()
            }) else {
                continue;
            };
            stored.order.status = update.status;
            stored.order.accrual = update.accrual;
            if update.status.is_terminal() {
                stored.order.processed_at = Some(Utc::now());
            }
            applied.updated += 1;

            if update.status == OrderStatus::Processed {
                let owner = stored.order.owner.clone();
                if let Some(user) = state.users.get_mut(&owner) {
                    user.current += update.credit_amount();
                }
                applied.credited += 1;
            }
        }

        Ok(applied)
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStore {
    async fn balance(&self, login: &str) -> AppResult<Balance> {
        self.check_failure()?;
        self.state
            .lock()
            .users
            .get(login)
            .map(User::balance)
            .ok_or_else(|| AppError::UserNotFound(login.to_string()))
    }

    async fn credit(&self, login: &str, amount: Decimal) -> AppResult<Balance> {
        self.check_failure()?;
        let mut state = self.state.lock();
        let user = state
            .users
            .get_mut(login)
            .ok_or_else(|| AppError::UserNotFound(login.to_string()))?;
        user.current += amount;
        Ok(user.balance())
    }

    async fn withdraw(&self, login: &str, order: &str, sum: Decimal) -> AppResult<Balance> {
        self.check_failure()?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.user_orders.iter().any(|o| o.order.number == order) {
            return Err(AppError::Conflict(order.to_string()));
        }
        let user = state
            .users
            .get_mut(login)
            .ok_or_else(|| AppError::UserNotFound(login.to_string()))?;
        let balance = user.balance();
        if !balance.can_withdraw(sum) {
            return Err(AppError::InsufficientFunds {
                required: sum.to_string(),
                available: balance.current.to_string(),
            });
        }
        user.current -= sum;
        user.withdrawn += sum;
        let after = user.balance();

        let mut record = UserOrder::new(order, login);
        record.status = OrderStatus::Processed;
        record.processed_at = Some(Utc::now());
        state.user_orders.push(StoredUserOrder {
            order: record,
            sum: Some(sum),
            is_withdrawn: true,
        });
        Ok(after)
    }

    async fn list_withdrawals(&self, login: &str) -> AppResult<Vec<Withdrawal>> {
        self.check_failure()?;
        let mut withdrawals: Vec<Withdrawal> = self
            .state
            .lock()
            .user_orders
            .iter()
            .filter(|o| o.is_withdrawn && o.order.owner == login)
            .map(|o| Withdrawal {
                order: o.order.number.clone(),
                sum: o.sum.unwrap_or_default(),
                processed_at: o.order.processed_at.unwrap_or(o.order.uploaded_at),
            })
            .collect();
        withdrawals.sort_by_key(|w| w.processed_at);
        Ok(withdrawals)
    }
}

/// Accrual client answering from a script
///
/// Queued answers are consumed first; afterwards each number gets its
/// configured answer, or `NotRegistered`.
#[derive(Default)]
pub struct ScriptedAccrualClient {
    queued: Mutex<VecDeque<AccrualLookup>>,
    answers: Mutex<HashMap<String, AccrualLookup>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAccrualClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, number: &str, lookup: AccrualLookup) {
        self.answers.lock().insert(number.to_string(), lookup);
    }

    pub fn push(&self, lookup: AccrualLookup) {
        self.queued.lock().push_back(lookup);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn processed(number: &str, accrual: Decimal) -> AccrualLookup {
        AccrualLookup::Found(AccrualOrderView {
            number: number.to_string(),
            status: OrderStatus::Processed,
            accrual: Some(accrual),
        })
    }
}

#[async_trait]
impl AccrualClient for ScriptedAccrualClient {
    async fn lookup(&self, number: &str) -> AppResult<AccrualLookup> {
        self.calls.lock().push(number.to_string());
        if let Some(lookup) = self.queued.lock().pop_front() {
            return Ok(lookup);
        }
        Ok(self
            .answers
            .lock()
            .get(number)
            .cloned()
            .unwrap_or(AccrualLookup::NotRegistered))
    }
}
