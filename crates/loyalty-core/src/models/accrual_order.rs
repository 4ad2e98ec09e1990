//! Accrual-side order model
//!
//! Orders submitted to the Accrual service together with their goods.

use super::status::OrderStatus;
use crate::error::AppError;
use crate::luhn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchased good
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    /// Free-form description, searched for reward match keys
    pub description: String,

    /// Price, never negative
    pub price: Decimal,
}

impl Good {
    pub fn new(description: impl Into<String>, price: Decimal) -> Self {
        Self {
            description: description.into(),
            price,
        }
    }
}

/// Accrual order entity
///
/// Created once per unique number in `Registered` state; goods are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualOrder {
    /// Luhn-valid order number
    #[serde(rename = "order", alias = "number")]
    pub number: String,

    #[serde(default = "registered")]
    pub status: OrderStatus,

    #[serde(default)]
    pub goods: Vec<Good>,

    /// Computed accrual, present once processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
}

fn registered() -> OrderStatus {
    OrderStatus::Registered
}

impl AccrualOrder {
    /// New order in `Registered` state
    pub fn new(number: impl Into<String>, goods: Vec<Good>) -> Self {
        Self {
            number: number.into(),
            status: OrderStatus::Registered,
            goods,
            accrual: None,
        }
    }

    /// Check number and goods before registration
    pub fn validate(&self) -> Result<(), AppError> {
        if !luhn::is_valid(&self.number) {
            return Err(AppError::InvalidOrderNumber(self.number.clone()));
        }

        for good in &self.goods {
            if good.description.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "good description must not be empty".to_string(),
                ));
            }
            if good.price.is_sign_negative() && !good.price.is_zero() {
                return Err(AppError::InvalidInput(format!(
                    "price of '{}' must not be negative",
                    good.description
                )));
            }
        }

        Ok(())
    }

    /// Public view returned by the status lookup
    pub fn view(&self) -> AccrualOrderView {
        AccrualOrderView {
            number: self.number.clone(),
            status: self.status,
            accrual: self.accrual,
        }
    }
}

/// Status lookup result: `{number, status, accrual}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualOrderView {
    #[serde(alias = "order")]
    pub number: String,

    pub status: OrderStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_order_is_registered() {
        let order = AccrualOrder::new("79927398713", vec![Good::new("Bork wine", dec!(200))]);
        assert_eq!(order.status, OrderStatus::Registered);
        assert!(order.accrual.is_none());
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_number() {
        let order = AccrualOrder::new("79927398710", vec![]);
        assert!(matches!(
            order.validate(),
            Err(AppError::InvalidOrderNumber(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let order = AccrualOrder::new("79927398713", vec![Good::new("Bork wine", dec!(-1))]);
        assert!(matches!(order.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_registration_payload() {
        let order: AccrualOrder = serde_json::from_str(
            r#"{"order":"79927398713","goods":[{"description":"Bork wine","price":200}]}"#,
        )
        .unwrap();

        assert_eq!(order.number, "79927398713");
        assert_eq!(order.status, OrderStatus::Registered);
        assert_eq!(order.goods, vec![Good::new("Bork wine", dec!(200))]);
    }

    #[test]
    fn test_view_omits_missing_accrual() {
        let order = AccrualOrder::new("79927398713", vec![]);
        let json = serde_json::to_value(order.view()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"number": "79927398713", "status": "REGISTERED"})
        );
    }
}
