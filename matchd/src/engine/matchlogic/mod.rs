//! Match Logic Module
//!
//! This module implements the core order matching logic for the trading engine.
//! It provides the matching algorithm that pairs buy and sell limit orders by
//! price-time priority.

pub mod matcher;

pub use matcher::Matcher;
