//! Order status machine
//!
//! Shared by both services. The Accrual side enters at `Registered`;
//! the Mart side enters at `New` and never stores `Registered`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
///
/// ```text
/// NEW ──┐
///       ├─> PROCESSING ──> INVALID | PROCESSED
/// REGISTERED ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Uploaded to the Mart, not yet seen by the Accrual service
    #[default]
    New,
    /// Accepted by the Accrual service and waiting in the task queue
    Registered,
    /// Picked up by a worker (Accrual) or being polled (Mart)
    Processing,
    /// Rejected, no accrual will be computed
    Invalid,
    /// Accrual computed
    Processed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OrderStatus {
    /// Database and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Registered => "REGISTERED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NEW" => Some(OrderStatus::New),
            "REGISTERED" => Some(OrderStatus::Registered),
            "PROCESSING" => Some(OrderStatus::Processing),
            "INVALID" => Some(OrderStatus::Invalid),
            "PROCESSED" => Some(OrderStatus::Processed),
            _ => None,
        }
    }

    /// Terminal states are never polled or processed again
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }

    /// Map a status reported by the Accrual service onto the Mart's subset
    pub fn to_mart(self) -> Self {
        match self {
            OrderStatus::New | OrderStatus::Registered | OrderStatus::Processing => {
                OrderStatus::Processing
            }
            terminal => terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Registered.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn test_mart_mapping() {
        assert_eq!(OrderStatus::Registered.to_mart(), OrderStatus::Processing);
        assert_eq!(OrderStatus::Processing.to_mart(), OrderStatus::Processing);
        assert_eq!(OrderStatus::Processed.to_mart(), OrderStatus::Processed);
        assert_eq!(OrderStatus::Invalid.to_mart(), OrderStatus::Invalid);
    }

    #[test]
    fn test_round_trip_through_str() {
        for status in [
            OrderStatus::New,
            OrderStatus::Registered,
            OrderStatus::Processing,
            OrderStatus::Invalid,
            OrderStatus::Processed,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("processed"), Some(OrderStatus::Processed));
        assert_eq!(OrderStatus::from_str("done"), None);
    }

    #[test]
    fn test_serde_uses_upper_case() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }
}
