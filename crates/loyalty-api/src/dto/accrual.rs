//! Accrual service DTOs
//!
//! Reward rules are accepted as `RewardRule` directly; its serde attributes
//! define the wire format.

use loyalty_core::models::{AccrualOrder, Good};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Order registration request
///
/// Only the number and the goods are taken from the caller; status and
/// accrual always start out empty.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterOrderRequest {
    #[serde(rename = "order", alias = "number")]
    pub number: String,

    #[serde(default)]
    pub goods: Vec<GoodRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoodRequest {
    pub description: String,
    pub price: Decimal,
}

impl From<GoodRequest> for Good {
    fn from(good: GoodRequest) -> Self {
        Good::new(good.description, good.price)
    }
}

impl From<RegisterOrderRequest> for AccrualOrder {
    fn from(req: RegisterOrderRequest) -> Self {
        AccrualOrder::new(
            req.number.trim(),
            req.goods.into_iter().map(Good::from).collect(),
        )
    }
}
