//! Command protocol
//!
//! Stateless translation between request lines and engine calls. Requests are
//! verb-first and either whitespace separated (`NEW_ORDER B1 BTC BUY 100 10`)
//! or pipe separated (`NEW_ORDER|B1|BTC|BUY|100|10`). Every request gets
//! exactly one reply.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::engine::entry::{Order, OrderSide};
use crate::error::{EngineError, ProtocolError, ValidationError};

pub const NEW_ORDER: &str = "NEW_ORDER";
pub const PING: &str = "PING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewOrder(Order),
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    OrderAccepted,
    Pong,
    UnknownCommand,
    Rejected(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::OrderAccepted => f.write_str("ORDER_ACCEPTED"),
            Reply::Pong => f.write_str("PONG"),
            Reply::UnknownCommand => f.write_str("UNKNOWN_COMMAND"),
            Reply::Rejected(reason) => write!(f, "ORDER_REJECTED {}", reason),
        }
    }
}

impl Reply {
    /// Reply for a request that failed to decode. Only internal errors have
    /// no reply; they are handed back to the caller.
    pub fn from_error(err: EngineError) -> Result<Reply, EngineError> {
        match err {
            EngineError::Protocol(_) => Ok(Reply::UnknownCommand),
            EngineError::Validation(e) => Ok(Reply::Rejected(e.to_string())),
            internal @ EngineError::Internal(_) => Err(internal),
        }
    }
}

fn split_fields(raw: &str) -> Vec<&str> {
    let raw = raw.trim();
    if raw.contains('|') {
        raw.split('|').map(str::trim).collect()
    } else {
        raw.split_whitespace().collect()
    }
}

/// Metrics label for a raw request.
pub fn method_label(raw: &str) -> &'static str {
    match split_fields(raw).first().copied() {
        Some(NEW_ORDER) => "new_order",
        Some(PING) => "ping",
        _ => "unknown",
    }
}

pub fn parse_command(raw: &str) -> Result<Command, EngineError> {
    let fields = split_fields(raw);
    let (verb, operands) = match fields.split_first() {
        Some((verb, operands)) if !verb.is_empty() => (*verb, operands),
        _ => return Err(ProtocolError::Empty.into()),
    };
    match verb {
        NEW_ORDER => Ok(Command::NewOrder(parse_new_order(operands)?)),
        PING => Ok(Command::Ping),
        other => Err(ProtocolError::UnknownVerb(other.to_string()).into()),
    }
}

fn parse_new_order(operands: &[&str]) -> Result<Order, ValidationError> {
    let mut fields = operands.iter().copied();
    let mut next = |name: &'static str| fields.next().ok_or(ValidationError::MissingField(name));

    let id = next("order_id")?;
    let instrument = next("instrument")?;
    let side = OrderSide::from_str(next("side")?)?;
    let price = next("price")?;
    let quantity = next("quantity")?;
    if let Some(extra) = operands.get(5) {
        return Err(ValidationError::UnexpectedField(extra.to_string()));
    }

    let price =
        Decimal::from_str(price).map_err(|_| ValidationError::InvalidPrice(price.to_string()))?;
    let quantity = Decimal::from_str(quantity)
        .map_err(|_| ValidationError::InvalidQuantity(quantity.to_string()))?;
    Order::try_new(id, instrument, side, price, quantity)
}
