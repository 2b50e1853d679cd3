//! Trade notification sinks
//!
//! The engine hands every trade's canonical notification line to a sink while
//! the instrument's book is still locked, so implementations must not block.

use std::sync::Mutex;

pub trait TradeSink: Send + Sync {
    fn publish(&self, notification: &str);
}

/// Writes notifications to the log. This is the default sink of the server.
#[derive(Debug, Default)]
pub struct LogSink;

impl TradeSink for LogSink {
    fn publish(&self, notification: &str) {
        log::info!("TRADE_NOTIFICATION: {}", notification);
    }
}

/// Keeps every notification in memory, in publication order.
#[derive(Debug, Default)]
pub struct MemorySink {
    notifications: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<String> {
        match self.notifications.lock() {
            Ok(notifications) => notifications.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TradeSink for MemorySink {
    fn publish(&self, notification: &str) {
        match self.notifications.lock() {
            Ok(mut notifications) => notifications.push(notification.to_string()),
            Err(poisoned) => poisoned.into_inner().push(notification.to_string()),
        }
    }
}
