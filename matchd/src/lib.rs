//! Price-time priority limit order matching engine.
//!
//! Orders arrive as text commands, are crossed against a per-instrument book
//! and produce trade notifications. See [`engine::MatchEngine`] for the core
//! and [`server::Server`] for the request-reply front end.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod server;

pub use engine::data::{BookSnapshot, LevelSnapshot};
pub use engine::entry::{Order, OrderSide, OrderStatus, Trade};
pub use engine::sink::{LogSink, MemorySink, TradeSink};
pub use engine::MatchEngine;
pub use error::{EngineError, ProtocolError, ValidationError};
