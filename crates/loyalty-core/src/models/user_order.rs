//! Mart-side user order model

use super::status::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order number uploaded by a user
///
/// Order numbers are globally unique across all users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOrder {
    pub number: String,

    /// Login of the uploading user
    #[serde(skip_serializing)]
    pub owner: String,

    pub status: OrderStatus,

    /// Points credited for the order, known once processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,

    pub uploaded_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl UserOrder {
    /// Freshly uploaded order in `New` state
    pub fn new(number: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            owner: owner.into(),
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Whether the poller still has to ask about this order
    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Result of an upload attempt that did not conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// New record created
    Accepted,
    /// Same user already uploaded this number, nothing changed
    AlreadyUploaded,
}

/// Status/accrual reported by the Accrual service for one order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSyncUpdate {
    pub number: String,
    /// Already mapped onto the Mart status subset
    pub status: OrderStatus,
    pub accrual: Option<Decimal>,
}

impl OrderSyncUpdate {
    pub fn new(number: impl Into<String>, status: OrderStatus, accrual: Option<Decimal>) -> Self {
        Self {
            number: number.into(),
            status: status.to_mart(),
            accrual,
        }
    }

    /// Amount to credit if this update moves the order into `Processed`
    pub fn credit_amount(&self) -> Decimal {
        match self.status {
            OrderStatus::Processed => self.accrual.unwrap_or_default(),
            _ => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_order_is_pending() {
        let order = UserOrder::new("79927398713", "alice");
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.is_pending());
    }

    #[test]
    fn test_sync_update_maps_status() {
        let update = OrderSyncUpdate::new("79927398713", OrderStatus::Registered, None);
        assert_eq!(update.status, OrderStatus::Processing);
        assert_eq!(update.credit_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_credit_amount_only_for_processed() {
        let processed = OrderSyncUpdate::new("79927398713", OrderStatus::Processed, Some(dec!(20)));
        assert_eq!(processed.credit_amount(), dec!(20));

        let invalid = OrderSyncUpdate::new("79927398713", OrderStatus::Invalid, Some(dec!(20)));
        assert_eq!(invalid.credit_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_owner_not_serialized() {
        let order = UserOrder::new("79927398713", "alice");
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("owner").is_none());
        assert!(json.get("accrual").is_none());
        assert_eq!(json["status"], "NEW");
    }
}
