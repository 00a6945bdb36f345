//! API types for REST and WebSocket interfaces.
//!
//! Prices and quantities travel as decimal strings and are converted to
//! ticks and lots exactly once, here.

use orderbook::units::{decimal_to_lots, decimal_to_ticks, lots_to_decimal, ticks_to_decimal};
use orderbook::{Execution, LevelSummary, OrderState, RejectReason, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request to place a new limit order.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub id: String,
    pub attribution_id: i32,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(default = "good_till_cancel")]
    pub time_in_force: TimeInForce,
}

fn good_till_cancel() -> TimeInForce {
    TimeInForce::GoodTillCancel
}

/// Request to atomically replace a resting order.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceOrderRequest {
    pub id: String,
    pub attribution_id: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
}

/// Query string for cancel and status requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstructionQuery {
    pub id: String,
    pub attribution_id: i32,
}

/// Query parameters for market depth requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepthQuery {
    pub levels: Option<usize>,
}

pub fn price_ticks(price: Decimal) -> Result<i64, AppError> {
    decimal_to_ticks(price).ok_or_else(|| AppError::BadRequest(format!("price {price} out of range")))
}

pub fn quantity_lots(quantity: Decimal) -> Result<i64, AppError> {
    decimal_to_lots(quantity).ok_or_else(|| AppError::BadRequest(format!("quantity {quantity} out of range")))
}

/// An order snapshot with decimal price and quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: u64,
    pub side: Side,
    pub time_in_force: TimeInForce,
    pub price: Decimal,
    pub quantity: Decimal,
    pub working_quantity: Decimal,
    pub filled_quantity: Decimal,
    pub cancelled_quantity: Decimal,
}

impl From<&OrderState> for OrderView {
    fn from(state: &OrderState) -> Self {
        Self {
            order_id: state.order_id,
            side: state.side,
            time_in_force: state.time_in_force,
            price: ticks_to_decimal(state.price),
            quantity: lots_to_decimal(state.quantity),
            working_quantity: lots_to_decimal(state.working_quantity),
            filled_quantity: lots_to_decimal(state.filled_quantity),
            cancelled_quantity: lots_to_decimal(state.cancelled_quantity()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionKind {
    Accept,
    Trade,
    Replace,
    Cancel,
    Status,
}

/// Flat wire form of an execution record.
///
/// `reference_id` is the cancel id for replace and cancel records and the
/// status id for status records. `order` is the replacement for replace
/// records, with the replaced order in `cancel_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionView {
    #[serde(rename = "type")]
    pub kind: ExecutionKind,
    pub id: String,
    pub attribution_id: i32,
    pub symbol: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_order: Option<OrderView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_quantity: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<RejectReason>,
}

impl ExecutionView {
    fn new(kind: ExecutionKind, execution: &Execution) -> Self {
        Self {
            kind,
            id: execution.id().to_string(),
            attribution_id: 0,
            symbol: execution.symbol().to_string(),
            timestamp: 0,
            execution_id: execution.execution_id(),
            reference_id: None,
            order: execution.order().map(OrderView::from),
            cancel_order: None,
            trade_price: None,
            trade_quantity: None,
            reject_reason: execution.reject_reason(),
        }
    }
}

impl From<&Execution> for ExecutionView {
    fn from(execution: &Execution) -> Self {
        match execution {
            Execution::Accept(accept) => Self {
                attribution_id: accept.attribution_id,
                timestamp: accept.timestamp,
                ..Self::new(ExecutionKind::Accept, execution)
            },
            Execution::Trade(trade) => Self {
                attribution_id: trade.attribution_id,
                timestamp: trade.timestamp,
                trade_price: Some(ticks_to_decimal(trade.trade_price)),
                trade_quantity: Some(lots_to_decimal(trade.trade_quantity)),
                ..Self::new(ExecutionKind::Trade, execution)
            },
            Execution::Replace(replace) => Self {
                attribution_id: replace.attribution_id,
                timestamp: replace.timestamp,
                reference_id: Some(replace.cancel_id.clone()),
                order: replace.replace_order.as_ref().map(OrderView::from),
                cancel_order: replace.cancel_order.as_ref().map(OrderView::from),
                ..Self::new(ExecutionKind::Replace, execution)
            },
            Execution::Cancel(cancel) => Self {
                attribution_id: cancel.attribution_id,
                timestamp: cancel.timestamp,
                reference_id: Some(cancel.cancel_id.clone()),
                ..Self::new(ExecutionKind::Cancel, execution)
            },
            Execution::Status(status) => Self {
                attribution_id: status.attribution_id,
                timestamp: status.timestamp,
                reference_id: Some(status.status_id.clone()),
                ..Self::new(ExecutionKind::Status, execution)
            },
        }
    }
}

/// Executions produced by one instruction, in delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResponse {
    pub executions: Vec<ExecutionView>,
}

impl From<&[Execution]> for FrameResponse {
    fn from(frame: &[Execution]) -> Self {
        Self {
            executions: frame.iter().map(ExecutionView::from).collect(),
        }
    }
}

/// Aggregated orders at a specific price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
    pub orders: usize,
}

impl From<&LevelSummary> for PriceLevel {
    fn from(level: &LevelSummary) -> Self {
        Self {
            price: ticks_to_decimal(level.price),
            quantity: lots_to_decimal(level.quantity),
            orders: level.orders,
        }
    }
}

/// Current order book state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookResponse {
    pub symbol: String,
    pub open: bool,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub orders: usize,
}

/// Market depth showing multiple price levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthResponse {
    pub symbol: String,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

/// WebSocket message types.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    #[serde(rename = "frame")]
    Frame(FrameResponse),
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "ping")]
    Ping { timestamp: u64 },
    #[serde(rename = "pong")]
    Pong { timestamp: u64 },
}
