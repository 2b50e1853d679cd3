//! Order Types and Structures
//!
//! An order is a limit instruction to trade a quantity of an instrument.
//! Remaining and filled quantities are only changed through [`Order::fill`],
//! which keeps their sum constant for the life of the order.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl FromStr for OrderSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(ValidationError::InvalidSide(other.to_string())),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fill state of an order. Always derived from the quantities, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
}

/// Largest accepted price or quantity (10^15).
pub const MAX_MAGNITUDE: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Most fractional digits accepted in a price or quantity.
pub const MAX_SCALE: u32 = 12;

/// A validated limit order. Fields are fixed at construction; only the fill
/// split changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: String,
    instrument: String,
    side: OrderSide,
    price: Decimal,
    client_order_id: String,
    timestamp: u64,
    remaining_quantity: Decimal,
    filled_quantity: Decimal,
}

impl Order {
    /// Builds a validated order. The client reference defaults to the order id.
    pub fn try_new(
        id: impl Into<String>,
        instrument: impl Into<String>,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let instrument = instrument.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyOrderId);
        }
        if instrument.is_empty() {
            return Err(ValidationError::EmptyInstrument);
        }
        if price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice);
        }
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity);
        }
        if price > MAX_MAGNITUDE {
            return Err(ValidationError::PriceTooLarge(MAX_MAGNITUDE));
        }
        if quantity > MAX_MAGNITUDE {
            return Err(ValidationError::QuantityTooLarge(MAX_MAGNITUDE));
        }
        for value in [price, quantity] {
            if value.normalize().scale() > MAX_SCALE {
                return Err(ValidationError::TooPrecise(value));
            }
        }
        Ok(Self {
            client_order_id: id.clone(),
            id,
            instrument,
            side,
            price,
            timestamp: now_nanos(),
            remaining_quantity: quantity,
            filled_quantity: Decimal::ZERO,
        })
    }

    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = client_order_id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn client_order_id(&self) -> &str {
        &self.client_order_id
    }

    /// Nanoseconds since the Unix epoch at admission. Audit only; queue
    /// position decides time priority.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn remaining_quantity(&self) -> Decimal {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Decimal {
        self.filled_quantity
    }

    /// Quantity at admission; invariant across fills.
    pub fn original_quantity(&self) -> Decimal {
        self.remaining_quantity + self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    pub fn status(&self) -> OrderStatus {
        if self.is_filled() {
            OrderStatus::Filled
        } else if self.filled_quantity > Decimal::ZERO {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        }
    }

    /// Whether a resting order at `price` on the opposite side satisfies this
    /// order's limit.
    pub fn crosses(&self, price: Decimal) -> bool {
        match self.side {
            OrderSide::Buy => price <= self.price,
            OrderSide::Sell => price >= self.price,
        }
    }

    /// Moves up to `quantity` from remaining to filled and returns the amount
    /// actually moved.
    pub(crate) fn fill(&mut self, quantity: Decimal) -> Decimal {
        let traded = quantity.min(self.remaining_quantity).max(Decimal::ZERO);
        self.remaining_quantity -= traded;
        self.filled_quantity += traded;
        traded
    }
}

#[cfg(test)]
impl Order {
    /// Builds an order without range checks, for exercising book guards.
    pub(crate) fn unchecked(id: &str, side: OrderSide, price: Decimal, quantity: Decimal) -> Self {
        Self {
            id: id.to_string(),
            instrument: "BTC".to_string(),
            side,
            price,
            client_order_id: id.to_string(),
            timestamp: now_nanos(),
            remaining_quantity: quantity,
            filled_quantity: Decimal::ZERO,
        }
    }
}

pub(crate) fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
