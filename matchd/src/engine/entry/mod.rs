pub mod order;
pub mod trade;

pub use order::{Order, OrderSide, OrderStatus};
pub use trade::Trade;
