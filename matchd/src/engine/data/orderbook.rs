use crate::engine::data::PriceLevel;
use crate::engine::entry::{Order, OrderSide};
use crate::error::ValidationError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// Aggregate view of one price level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSnapshot {
    pub price: Decimal,
    pub quantity: Decimal,
    pub orders: usize,
}

/// Read-only copy of both ladders, best price first on each side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookSnapshot {
    pub instrument: String,
    pub bids: Vec<LevelSnapshot>,
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

impl fmt::Display for BookSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BOOK|{}", self.instrument)?;
        for (tag, levels) in [("BIDS", &self.bids), ("ASKS", &self.asks)] {
            write!(f, "|{}", tag)?;
            for level in levels {
                write!(
                    f,
                    "|{}x{}x{}",
                    level.price.normalize(),
                    level.quantity.normalize(),
                    level.orders
                )?;
            }
        }
        Ok(())
    }
}

/// Two price ladders for one instrument. Bids are read from the high end of
/// their map, asks from the low end. A level is removed as soon as it empties.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub symbol: String,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
}

impl OrderBook {
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    /// Rests an order at the back of its own price level.
    pub fn add_order(&mut self, order: Order) -> Result<(), ValidationError> {
        if order.is_filled() {
            return Ok(());
        }
        if !self.can_rest(&order) {
            return Err(ValidationError::LevelOverflow(order.price()));
        }
        self.ladder_mut(order.side())
            .entry(order.price())
            .or_default()
            .push_back(order)
    }

    /// Whether the order's remainder fits in its own level's aggregate.
    pub fn can_rest(&self, order: &Order) -> bool {
        self.level(order.side(), order.price())
            .map_or(true, |level| level.can_absorb(order.remaining_quantity()))
    }

    /// Best level on `side` together with its price.
    pub fn best_level_mut(&mut self, side: OrderSide) -> Option<(Decimal, &mut PriceLevel)> {
        let best = match side {
            OrderSide::Buy => self.bids.iter_mut().next_back(),
            OrderSide::Sell => self.asks.iter_mut().next(),
        };
        best.map(|(price, level)| (*price, level))
    }

    /// Drops the level at `price` if it has no orders left.
    pub fn prune_level(&mut self, side: OrderSide, price: Decimal) {
        let ladder = self.ladder_mut(side);
        if ladder.get(&price).map_or(false, PriceLevel::is_empty) {
            ladder.remove(&price);
        }
    }

    pub fn get_best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    pub fn get_best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn level(&self, side: OrderSide, price: Decimal) -> Option<&PriceLevel> {
        match side {
            OrderSide::Buy => self.bids.get(&price),
            OrderSide::Sell => self.asks.get(&price),
        }
    }

    pub fn order_count(&self) -> usize {
        self.bids
            .values()
            .chain(self.asks.values())
            .map(PriceLevel::order_count)
            .sum()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        fn summarize<'a>(
            levels: impl Iterator<Item = (&'a Decimal, &'a PriceLevel)>,
        ) -> Vec<LevelSnapshot> {
            levels
                .map(|(price, level)| LevelSnapshot {
                    price: *price,
                    quantity: level.total_quantity(),
                    orders: level.order_count(),
                })
                .collect()
        }
        BookSnapshot {
            instrument: self.symbol.clone(),
            bids: summarize(self.bids.iter().rev()),
            asks: summarize(self.asks.iter()),
        }
    }

    fn ladder_mut(&mut self, side: OrderSide) -> &mut BTreeMap<Decimal, PriceLevel> {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }
}
