//! Property tests for the crossing algorithm.
//!
//! Random order flow on a single instrument is fed through the engine; after
//! every admission the book must be uncrossed, and at the end every unit of
//! admitted quantity must be either traded or still resting.

use std::sync::Arc;

use matchd::{MatchEngine, MemorySink, Order, OrderSide, Trade};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
struct Instruction {
    side: OrderSide,
    price: u32,
    quantity: u32,
}

fn instruction() -> impl Strategy<Value = Instruction> {
    (any::<bool>(), 90u32..=110, 1u32..=20).prop_map(|(buy, price, quantity)| Instruction {
        side: if buy { OrderSide::Buy } else { OrderSide::Sell },
        price,
        quantity,
    })
}

fn run(flow: &[Instruction]) -> (MatchEngine, Vec<Trade>) {
    let engine = MatchEngine::new(Arc::new(MemorySink::new()));
    let mut trades = Vec::new();
    for (i, ins) in flow.iter().enumerate() {
        let order = Order::try_new(
            format!("O{}", i),
            "BTC",
            ins.side,
            Decimal::from(ins.price),
            Decimal::from(ins.quantity),
        )
        .unwrap();
        trades.extend(engine.process_order(order).unwrap());

        if let (Some(bid), Some(ask)) = (
            engine.best_bid("BTC").unwrap(),
            engine.best_ask("BTC").unwrap(),
        ) {
            assert!(bid < ask, "crossed book after O{}: {} >= {}", i, bid, ask);
        }
    }
    (engine, trades)
}

fn admitted(flow: &[Instruction], side: OrderSide) -> Decimal {
    flow.iter()
        .filter(|ins| ins.side == side)
        .map(|ins| Decimal::from(ins.quantity))
        .sum()
}

proptest! {
    #[test]
    fn quantity_is_conserved(flow in prop::collection::vec(instruction(), 1..80)) {
        let (engine, trades) = run(&flow);
        let traded: Decimal = trades.iter().map(|t| t.quantity).sum();
        let snapshot = engine.snapshot("BTC").unwrap().unwrap();
        let resting_bids: Decimal = snapshot.bids.iter().map(|l| l.quantity).sum();
        let resting_asks: Decimal = snapshot.asks.iter().map(|l| l.quantity).sum();

        prop_assert_eq!(admitted(&flow, OrderSide::Buy), traded + resting_bids);
        prop_assert_eq!(admitted(&flow, OrderSide::Sell), traded + resting_asks);
    }

    #[test]
    fn trades_respect_both_limits(flow in prop::collection::vec(instruction(), 1..80)) {
        let (_, trades) = run(&flow);
        for trade in &trades {
            let buy: usize = trade.buy_order_id[1..].parse().unwrap();
            let sell: usize = trade.sell_order_id[1..].parse().unwrap();
            prop_assert!(trade.quantity > Decimal::ZERO);
            prop_assert!(trade.quantity <= Decimal::from(flow[buy].quantity));
            prop_assert!(trade.quantity <= Decimal::from(flow[sell].quantity));
            prop_assert!(trade.price <= Decimal::from(flow[buy].price));
            prop_assert!(trade.price >= Decimal::from(flow[sell].price));
            // The resting side, which arrived first, sets the price.
            let resting = if buy < sell { buy } else { sell };
            prop_assert_eq!(trade.price, Decimal::from(flow[resting].price));
        }
    }

    #[test]
    fn levels_are_sorted_and_non_empty(flow in prop::collection::vec(instruction(), 1..80)) {
        let (engine, _) = run(&flow);
        let snapshot = engine.snapshot("BTC").unwrap().unwrap();
        for level in snapshot.bids.iter().chain(snapshot.asks.iter()) {
            prop_assert!(level.orders > 0);
            prop_assert!(level.quantity > Decimal::ZERO);
        }
        prop_assert!(snapshot.bids.windows(2).all(|w| w[0].price > w[1].price));
        prop_assert!(snapshot.asks.windows(2).all(|w| w[0].price < w[1].price));
    }
}
