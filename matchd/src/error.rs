//! Error types for the matching engine
//!
//! Errors are split by how they are surfaced at the command boundary:
//! protocol and validation errors become reply strings, internal errors
//! terminate the process.

use thiserror::Error;

/// The request could not be recognised as a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0}")]
    UnknownVerb(String),
}

/// A recognised command carried fields that cannot form a valid order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("unexpected trailing field {0}")]
    UnexpectedField(String),
    #[error("invalid side {0}")]
    InvalidSide(String),
    #[error("invalid price {0}")]
    InvalidPrice(String),
    #[error("invalid quantity {0}")]
    InvalidQuantity(String),
    #[error("price must be positive")]
    NonPositivePrice,
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("price exceeds {0}")]
    PriceTooLarge(rust_decimal::Decimal),
    #[error("quantity exceeds {0}")]
    QuantityTooLarge(rust_decimal::Decimal),
    #[error("too many decimal places in {0}")]
    TooPrecise(rust_decimal::Decimal),
    #[error("resting quantity at {0} would overflow")]
    LevelOverflow(rust_decimal::Decimal),
    #[error("order id must not be empty")]
    EmptyOrderId,
    #[error("instrument must not be empty")]
    EmptyInstrument,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Shared state can no longer be trusted, e.g. a lock was poisoned by a
    /// panicking holder.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Internal(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for EngineError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        EngineError::Internal(e.to_string())
    }
}
