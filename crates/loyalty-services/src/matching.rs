//! Reward matching engine
//!
//! Each good accrues from the first rule, in registration order, whose match
//! key occurs in its description. Goods matching no rule contribute nothing.

use loyalty_core::models::{Good, OrderStatus, RewardRule};
use rust_decimal::Decimal;

/// Final status and accrual of a processed order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub status: OrderStatus,
    pub accrual: Option<Decimal>,
}

/// Computes accruals against a snapshot of the reward rules
#[derive(Debug, Clone, Default)]
pub struct RewardMatcher {
    rules: Vec<RewardRule>,
}

impl RewardMatcher {
    /// Rules must be in registration order
    pub fn new(rules: Vec<RewardRule>) -> Self {
        Self { rules }
    }

    /// First rule covering the description
    pub fn find_rule(&self, description: &str) -> Option<&RewardRule> {
        self.rules.iter().find(|rule| rule.matches(description))
    }

    /// Reward earned by a single good
    pub fn reward_for(&self, good: &Good) -> Decimal {
        self.find_rule(&good.description)
            .map(|rule| rule.reward_type.reward_for(good.price, rule.reward))
            .unwrap_or(Decimal::ZERO)
    }

    /// Total accrual for an order
    ///
    /// An order without goods is `Invalid`; otherwise it is `Processed` with
    /// the sum of the per-good rewards, possibly zero.
    pub fn evaluate(&self, goods: &[Good]) -> MatchOutcome {
        if goods.is_empty() {
            return MatchOutcome {
                status: OrderStatus::Invalid,
                accrual: None,
            };
        }

        let total = goods.iter().map(|good| self.reward_for(good)).sum();

        MatchOutcome {
            status: OrderStatus::Processed,
            accrual: Some(total),
        }
    }
}
