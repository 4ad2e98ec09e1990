//! Reward rule registry

use loyalty_core::{models::RewardRule, traits::RewardRepository, AppResult};
use std::sync::Arc;
use tracing::{info, instrument};

/// Registers and lists reward rules
pub struct RewardRegistry<R: RewardRepository> {
    repo: Arc<R>,
}

impl<R: RewardRepository> RewardRegistry<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Validate and store a rule
    ///
    /// Fails with `InvalidInput` for an empty match key or a negative reward,
    /// and with `Conflict` when the match key is already registered.
    #[instrument(skip(self, rule), fields(match_key = %rule.match_key))]
    pub async fn create_rule(&self, rule: RewardRule) -> AppResult<RewardRule> {
        rule.validate()?;
        let created = self.repo.create(&rule).await?;

        info!(
            reward = %created.reward,
            reward_type = %created.reward_type,
            "Reward rule registered"
        );
        Ok(created)
    }

    /// All rules in registration order
    pub async fn list_rules(&self) -> AppResult<Vec<RewardRule>> {
        self.repo.list().await
    }
}
