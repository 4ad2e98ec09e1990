//! Ledger models: users, balances and withdrawals

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mart user with its ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,

    /// Password hash (never expose in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Spendable points, never negative
    pub current: Decimal,

    /// Total points ever withdrawn
    pub withdrawn: Decimal,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(login: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password_hash: password_hash.into(),
            current: Decimal::ZERO,
            withdrawn: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    pub fn balance(&self) -> Balance {
        Balance {
            current: self.current,
            withdrawn: self.withdrawn,
        }
    }
}

/// Current and withdrawn point totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

impl Balance {
    /// Whether `sum` can be debited without going below zero
    #[inline]
    pub fn can_withdraw(&self, sum: Decimal) -> bool {
        sum <= self.current
    }
}

/// Withdrawal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Order number the points were spent on
    pub order: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}
