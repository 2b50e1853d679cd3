//! Trade Types and Structures
//!
//! A trade is the immutable result of crossing an incoming order against a
//! resting one.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::order::now_nanos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub instrument: String,
    /// Always the resting order's limit price.
    pub price: Decimal,
    pub quantity: Decimal,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Trade {
    pub fn new(
        buy_order_id: String,
        sell_order_id: String,
        instrument: String,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            buy_order_id,
            sell_order_id,
            instrument,
            price,
            quantity,
            timestamp: now_nanos(),
        }
    }

    /// Canonical notification form. Field order is part of the wire contract.
    pub fn notification(&self) -> String {
        format!(
            "TRADE|{}|{}|{}|{}|{}|{}|{}",
            self.id,
            self.buy_order_id,
            self.sell_order_id,
            self.instrument,
            self.price.normalize(),
            self.quantity.normalize(),
            self.timestamp
        )
    }
}
