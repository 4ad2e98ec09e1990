//! Reward rule repository implementation

use super::is_unique_violation;
use loyalty_core::{
    models::{RewardKind, RewardRule},
    traits::RewardRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of RewardRepository
pub struct PgRewardRepository {
    pool: PgPool,
}

impl PgRewardRepository {
    /// Create a new reward repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepository for PgRewardRepository {
    #[instrument(skip(self, rule), fields(match_key = %rule.match_key))]
    async fn create(&self, rule: &RewardRule) -> AppResult<RewardRule> {
        debug!("Creating reward rule");

        let row = sqlx::query_as::<sqlx::Postgres, RewardRow>(
            r#"
            INSERT INTO rewards (match, reward, reward_type)
            VALUES ($1, $2, $3)
            RETURNING match, reward, reward_type
            "#,
        )
        .bind(&rule.match_key)
        .bind(rule.reward)
        .bind(rule.reward_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Reward '{}' already exists", rule.match_key))
            } else {
                error!("Database error creating reward: {}", e);
                AppError::Database(format!("Failed to create reward: {}", e))
            }
        })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn list(&self) -> AppResult<Vec<RewardRule>> {
        let rows = sqlx::query_as::<sqlx::Postgres, RewardRow>(
            r#"
            SELECT match, reward, reward_type
            FROM rewards
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing rewards: {}", e);
            AppError::Database(format!("Failed to fetch rewards: {}", e))
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct RewardRow {
    #[sqlx(rename = "match")]
    match_key: String,
    reward: Decimal,
    reward_type: String,
}

impl TryFrom<RewardRow> for RewardRule {
    type Error = AppError;

    fn try_from(row: RewardRow) -> Result<Self, Self::Error> {
        let kind = RewardKind::from_str(&row.reward_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown reward type '{}'", row.reward_type))
        })?;
        Ok(RewardRule::new(row.match_key, row.reward, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn repo() -> PgRewardRepository {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/accrual".to_string());
        let pool = PgPool::connect(&url).await.unwrap();
        crate::run_accrual_migrations(&pool).await.unwrap();
        PgRewardRepository::new(pool)
    }

    #[test]
    fn test_row_conversion() {
        let row = RewardRow {
            match_key: "Bork".to_string(),
            reward: dec!(10),
            reward_type: "%".to_string(),
        };
        let rule: RewardRule = row.try_into().unwrap();
        assert_eq!(rule.reward_type, RewardKind::Percent);

        let row = RewardRow {
            match_key: "Bork".to_string(),
            reward: dec!(10),
            reward_type: "bonus".to_string(),
        };
        assert!(RewardRule::try_from(row).is_err());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_duplicate_match_key_conflicts() {
        let repo = repo().await;
        let key = format!("Bork-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let rule = RewardRule::new(key, dec!(10), RewardKind::Percent);

        repo.create(&rule).await.unwrap();
        let second = repo.create(&rule).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }
}
