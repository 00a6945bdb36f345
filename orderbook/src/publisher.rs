use crate::clock::Clock;
use crate::execution::{
    AcceptExecution, CancelExecution, Execution, ExecutionCallback, OrderState, ReplaceExecution,
    StatusExecution, TradeExecution,
};
use crate::order::Order;
use crate::types::{Identifier, RejectReason};

/// Turns book transitions into execution records for one instruction.
///
/// `start` opens the callback's frame and `commit` consumes the publisher to
/// close it, so a frame cannot be left open or closed twice.
pub struct ExecutionPublisher<'a> {
    callback: &'a mut dyn ExecutionCallback,
    clock: &'a dyn Clock,
    symbol: &'a str,
}

impl<'a> ExecutionPublisher<'a> {
    pub fn start(callback: &'a mut dyn ExecutionCallback, clock: &'a dyn Clock, symbol: &'a str) -> Self {
        callback.start();
        Self {
            callback,
            clock,
            symbol,
        }
    }

    pub fn commit(self) {
        self.callback.commit();
    }

    pub fn accept(&mut self, execution_id: u64, order: &Order) {
        let execution = AcceptExecution {
            id: order.identifier().id().to_string(),
            attribution_id: order.identifier().attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            execution_id: Some(execution_id),
            order: Some(OrderState::from(order)),
            reject_reason: None,
        };
        self.callback.notify(Execution::Accept(execution));
    }

    pub fn accept_rejection(&mut self, execution_id: Option<u64>, identifier: &Identifier, reason: RejectReason) {
        let execution = AcceptExecution {
            id: identifier.id().to_string(),
            attribution_id: identifier.attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            execution_id,
            order: None,
            reject_reason: Some(reason),
        };
        self.callback.notify(Execution::Accept(execution));
    }

    /// Emits the aggressive leg, then the passive leg, both at `price`.
    pub fn trade(&mut self, execution_id: u64, aggressive: &Order, passive: &Order, price: i64, quantity: i64) {
        for order in [aggressive, passive] {
            let execution = TradeExecution {
                id: order.identifier().id().to_string(),
                attribution_id: order.identifier().attribution_id(),
                symbol: self.symbol.to_string(),
                timestamp: self.clock.now_millis(),
                execution_id,
                order: OrderState::from(order),
                trade_price: price,
                trade_quantity: quantity,
            };
            self.callback.notify(Execution::Trade(execution));
        }
    }

    pub fn replace(&mut self, execution_id: u64, cancel_order: &Order, replace_order: &Order) {
        let execution = ReplaceExecution {
            id: replace_order.identifier().id().to_string(),
            attribution_id: replace_order.identifier().attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            execution_id: Some(execution_id),
            cancel_id: cancel_order.identifier().id().to_string(),
            cancel_order: Some(OrderState::from(cancel_order)),
            replace_order: Some(OrderState::from(replace_order)),
            reject_reason: None,
        };
        self.callback.notify(Execution::Replace(execution));
    }

    pub fn replace_rejection(
        &mut self,
        execution_id: Option<u64>,
        identifier: &Identifier,
        cancel_identifier: &Identifier,
        reason: RejectReason,
    ) {
        let execution = ReplaceExecution {
            id: identifier.id().to_string(),
            attribution_id: identifier.attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            execution_id,
            cancel_id: cancel_identifier.id().to_string(),
            cancel_order: None,
            replace_order: None,
            reject_reason: Some(reason),
        };
        self.callback.notify(Execution::Replace(execution));
    }

    /// `identifier` names the instruction that caused the cancel, which is
    /// the order itself for immediate-or-cancel residuals.
    pub fn cancel(&mut self, execution_id: u64, identifier: &Identifier, order: &Order) {
        let execution = CancelExecution {
            id: identifier.id().to_string(),
            attribution_id: order.identifier().attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            execution_id: Some(execution_id),
            cancel_id: order.identifier().id().to_string(),
            order: Some(OrderState::from(order)),
            reject_reason: None,
        };
        self.callback.notify(Execution::Cancel(execution));
    }

    pub fn cancel_rejection(&mut self, identifier: &Identifier, cancel_identifier: &Identifier, reason: RejectReason) {
        let execution = CancelExecution {
            id: identifier.id().to_string(),
            attribution_id: identifier.attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            execution_id: None,
            cancel_id: cancel_identifier.id().to_string(),
            order: None,
            reject_reason: Some(reason),
        };
        self.callback.notify(Execution::Cancel(execution));
    }

    pub fn status(&mut self, identifier: &Identifier, order: &Order) {
        let execution = StatusExecution {
            id: identifier.id().to_string(),
            attribution_id: order.identifier().attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            status_id: order.identifier().id().to_string(),
            order: Some(OrderState::from(order)),
            reject_reason: None,
        };
        self.callback.notify(Execution::Status(execution));
    }

    pub fn status_rejection(&mut self, identifier: &Identifier, status_identifier: &Identifier, reason: RejectReason) {
        let execution = StatusExecution {
            id: identifier.id().to_string(),
            attribution_id: identifier.attribution_id(),
            symbol: self.symbol.to_string(),
            timestamp: self.clock.now_millis(),
            status_id: status_identifier.id().to_string(),
            order: None,
            reject_reason: Some(reason),
        };
        self.callback.notify(Execution::Status(execution));
    }
}
