//! Reward rule model
//!
//! A reward rule associates a match key (a substring of a good's description)
//! with a reward that is either a percentage of the price or a fixed amount of points.

use crate::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reward kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    /// Percentage of the good's price
    #[serde(rename = "%", alias = "Percent", alias = "percent")]
    Percent,
    /// Fixed number of points per matching good
    #[serde(rename = "pt", alias = "Points", alias = "points")]
    Points,
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RewardKind {
    /// Database and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Percent => "%",
            RewardKind::Points => "pt",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "%" | "Percent" | "percent" => Some(RewardKind::Percent),
            "pt" | "Points" | "points" => Some(RewardKind::Points),
            _ => None,
        }
    }

    /// Reward earned by one good of `price` under a rule of this kind and `value`
    pub fn reward_for(&self, price: Decimal, value: Decimal) -> Decimal {
        match self {
            RewardKind::Percent => price / Decimal::ONE_HUNDRED * value,
            RewardKind::Points => value,
        }
    }
}

/// Reward rule entity
///
/// Immutable once created. The match key is unique across all rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRule {
    /// Substring searched for in good descriptions
    #[serde(rename = "match")]
    pub match_key: String,

    /// Percentage or point amount, never negative
    #[serde(alias = "value")]
    pub reward: Decimal,

    /// How `reward` is applied
    #[serde(alias = "kind")]
    pub reward_type: RewardKind,
}

impl RewardRule {
    pub fn new(match_key: impl Into<String>, reward: Decimal, reward_type: RewardKind) -> Self {
        Self {
            match_key: match_key.into(),
            reward,
            reward_type,
        }
    }

    /// Check that the rule can be registered
    pub fn validate(&self) -> Result<(), AppError> {
        if self.match_key.is_empty() {
            return Err(AppError::InvalidInput(
                "match key must not be empty".to_string(),
            ));
        }
        if self.reward.is_sign_negative() && !self.reward.is_zero() {
            return Err(AppError::InvalidInput(
                "reward value must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a good with this description is covered by the rule
    #[inline]
    pub fn matches(&self, description: &str) -> bool {
        description.contains(self.match_key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_reward() {
        assert_eq!(RewardKind::Percent.reward_for(dec!(500), dec!(10)), dec!(50));
        assert_eq!(RewardKind::Percent.reward_for(dec!(200), dec!(10)), dec!(20));
    }

    #[test]
    fn test_points_reward_ignores_price() {
        assert_eq!(RewardKind::Points.reward_for(dec!(500), dec!(10)), dec!(10));
        assert_eq!(RewardKind::Points.reward_for(dec!(0), dec!(5)), dec!(5));
    }

    #[test]
    fn test_validate() {
        assert!(RewardRule::new("Bork", dec!(10), RewardKind::Percent)
            .validate()
            .is_ok());
        assert!(RewardRule::new("Bork", dec!(0), RewardKind::Points)
            .validate()
            .is_ok());
        assert!(matches!(
            RewardRule::new("", dec!(10), RewardKind::Percent).validate(),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            RewardRule::new("Bork", dec!(-1), RewardKind::Points).validate(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wire_format() {
        let rule: RewardRule =
            serde_json::from_str(r#"{"match":"Bork","reward":10,"reward_type":"%"}"#).unwrap();
        assert_eq!(rule, RewardRule::new("Bork", dec!(10), RewardKind::Percent));

        let rule: RewardRule =
            serde_json::from_str(r#"{"match":"Bork","value":5,"kind":"Points"}"#).unwrap();
        assert_eq!(rule, RewardRule::new("Bork", dec!(5), RewardKind::Points));

        let invalid = serde_json::from_str::<RewardRule>(
            r#"{"match":"Bork","reward":5,"reward_type":"bonus"}"#,
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn test_matches_substring() {
        let rule = RewardRule::new("Bork", dec!(10), RewardKind::Percent);
        assert!(rule.matches("Bork wine"));
        assert!(rule.matches("Чайник Bork"));
        assert!(!rule.matches("bork wine"));
    }
}
