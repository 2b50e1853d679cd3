//! Data Structures Module
//!
//! Price ladders and the FIFO price levels they are made of.

pub mod orderbook;
pub mod price_level;

pub use orderbook::{BookSnapshot, LevelSnapshot, OrderBook};
pub use price_level::{Fill, PriceLevel};
