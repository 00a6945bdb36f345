use crate::order::Order;
use crate::types::{RejectReason, Side, TimeInForce};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of an order's quantities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub order_id: u64,
    pub side: Side,
    pub time_in_force: TimeInForce,
    pub price: i64,
    pub quantity: i64,
    pub working_quantity: i64,
    pub filled_quantity: i64,
}

impl OrderState {
    pub fn cancelled_quantity(&self) -> i64 {
        self.quantity
            .saturating_sub(self.working_quantity)
            .saturating_sub(self.filled_quantity)
    }
}

impl From<&Order> for OrderState {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id(),
            side: order.side(),
            time_in_force: order.time_in_force(),
            price: order.price(),
            quantity: order.quantity(),
            working_quantity: order.working_quantity(),
            filled_quantity: order.filled_quantity(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptExecution {
    pub id: String,
    pub attribution_id: i32,
    pub symbol: String,
    pub timestamp: u64,
    pub execution_id: Option<u64>,
    pub order: Option<OrderState>,
    pub reject_reason: Option<RejectReason>,
}

/// One leg of a trade. Both legs of a fill share the execution id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeExecution {
    pub id: String,
    pub attribution_id: i32,
    pub symbol: String,
    pub timestamp: u64,
    pub execution_id: u64,
    pub order: OrderState,
    pub trade_price: i64,
    pub trade_quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceExecution {
    pub id: String,
    pub attribution_id: i32,
    pub symbol: String,
    pub timestamp: u64,
    pub execution_id: Option<u64>,
    pub cancel_id: String,
    pub cancel_order: Option<OrderState>,
    pub replace_order: Option<OrderState>,
    pub reject_reason: Option<RejectReason>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelExecution {
    pub id: String,
    pub attribution_id: i32,
    pub symbol: String,
    pub timestamp: u64,
    pub execution_id: Option<u64>,
    pub cancel_id: String,
    pub order: Option<OrderState>,
    pub reject_reason: Option<RejectReason>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusExecution {
    pub id: String,
    pub attribution_id: i32,
    pub symbol: String,
    pub timestamp: u64,
    pub status_id: String,
    pub order: Option<OrderState>,
    pub reject_reason: Option<RejectReason>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Execution {
    Accept(AcceptExecution),
    Trade(TradeExecution),
    Replace(ReplaceExecution),
    Cancel(CancelExecution),
    Status(StatusExecution),
}

impl Execution {
    pub fn id(&self) -> &str {
        match self {
            Execution::Accept(e) => &e.id,
            Execution::Trade(e) => &e.id,
            Execution::Replace(e) => &e.id,
            Execution::Cancel(e) => &e.id,
            Execution::Status(e) => &e.id,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Execution::Accept(e) => &e.symbol,
            Execution::Trade(e) => &e.symbol,
            Execution::Replace(e) => &e.symbol,
            Execution::Cancel(e) => &e.symbol,
            Execution::Status(e) => &e.symbol,
        }
    }

    pub fn execution_id(&self) -> Option<u64> {
        match self {
            Execution::Accept(e) => e.execution_id,
            Execution::Trade(e) => Some(e.execution_id),
            Execution::Replace(e) => e.execution_id,
            Execution::Cancel(e) => e.execution_id,
            Execution::Status(_) => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Execution::Accept(e) => e.reject_reason,
            Execution::Trade(_) => None,
            Execution::Replace(e) => e.reject_reason,
            Execution::Cancel(e) => e.reject_reason,
            Execution::Status(e) => e.reject_reason,
        }
    }

    /// The snapshot the record reports on; the new order for a replace.
    pub fn order(&self) -> Option<&OrderState> {
        match self {
            Execution::Accept(e) => e.order.as_ref(),
            Execution::Trade(e) => Some(&e.order),
            Execution::Replace(e) => e.replace_order.as_ref(),
            Execution::Cancel(e) => e.order.as_ref(),
            Execution::Status(e) => e.order.as_ref(),
        }
    }
}

/// Receives the executions of one instruction, framed by `start` and `commit`.
pub trait ExecutionCallback {
    fn start(&mut self) {}

    fn notify(&mut self, execution: Execution);

    fn commit(&mut self) {}
}

/// Collects executions grouped by the frame they were delivered in.
#[derive(Debug, Default)]
pub struct ExecutionLog {
    frames: Vec<Vec<Execution>>,
    open: Option<Vec<Execution>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Vec<Execution>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Execution]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// Every committed execution in delivery order.
    pub fn executions(&self) -> impl Iterator<Item = &Execution> {
        self.frames.iter().flatten()
    }

    pub fn take_frames(&mut self) -> Vec<Vec<Execution>> {
        std::mem::take(&mut self.frames)
    }

    /// True while a frame has been started but not committed.
    pub fn in_frame(&self) -> bool {
        self.open.is_some()
    }
}

impl ExecutionCallback for ExecutionLog {
    fn start(&mut self) {
        if let Some(unfinished) = self.open.replace(Vec::new()) {
            self.frames.push(unfinished);
        }
    }

    fn notify(&mut self, execution: Execution) {
        self.open.get_or_insert_with(Vec::new).push(execution);
    }

    fn commit(&mut self) {
        self.frames.push(self.open.take().unwrap_or_default());
    }
}
