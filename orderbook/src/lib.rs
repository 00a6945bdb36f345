//! In-memory limit order matching engine with price-time priority.
//!
//! Core features:
//! - Arena-backed price levels: orders and levels link by slab key
//! - Staged accept/cancel/execute/commit protocol with explicit state checks
//! - Self-trade prevention by skipping same-attribution passive orders
//! - Integer ticks and lots throughout, exact decimal conversion at the edge
//!
//! Single-threaded by construction: an [`Exchange`] must be driven by one
//! caller at a time. Feed it through a queue for concurrent producers.

pub mod book;
pub mod clock;
pub mod error;
pub mod exchange;
pub mod execution;
pub mod instruction;
pub mod order;
pub mod policy;
pub mod price_levels;
pub mod publisher;
pub mod types;
pub mod units;

pub use book::{BookState, LimitOrderBook, Match, Matcher};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::BookError;
pub use exchange::Exchange;
pub use execution::{
    AcceptExecution, CancelExecution, Execution, ExecutionCallback, ExecutionLog, OrderState, ReplaceExecution,
    StatusExecution, TradeExecution,
};
pub use instruction::{CancelOrder, CancelReplaceOrder, Instruction, OrderStatus, PlaceOrder};
pub use order::Order;
pub use price_levels::LevelSummary;
pub use publisher::ExecutionPublisher;
pub use types::{Identifier, Instrument, RejectReason, Side, TimeInForce};
