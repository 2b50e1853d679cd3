//! Match Engine Module
//!
//! This module contains the core components of the matching engine:
//! - `data`: price ladders and price levels
//! - `entry`: order and trade records
//! - `matchengine`: engine entry point, command dispatch and notification
//! - `matchlogic`: the price-time crossing algorithm
//! - `sink`: trade notification sinks
//! - `spot`: per-instrument matcher registry

pub mod data;
pub mod entry;
pub mod matchengine;
pub mod matchlogic;
pub mod sink;
pub mod spot;

pub use matchengine::MatchEngine;
