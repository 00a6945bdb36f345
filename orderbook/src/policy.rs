//! Stateless strategies that drive a [`LimitOrderBook`] through one
//! instruction: accept, then fill, then rest or cancel the remainder.

use crate::book::{LimitOrderBook, Match, Matcher};
use crate::error::BookError;
use crate::order::Order;
use crate::publisher::ExecutionPublisher;
use crate::types::{Identifier, RejectReason, Side, TimeInForce};
use tracing::trace;

/// Stages a new order and publishes its acceptance or rejection.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderAcceptPolicy;

impl OrderAcceptPolicy {
    /// Returns true when the order is live and should be matched.
    ///
    /// Fill-or-kill orders are rejected here unless the contra side can fill
    /// them completely right now.
    #[allow(clippy::too_many_arguments)]
    pub fn accept(
        &self,
        book: &mut LimitOrderBook,
        publisher: &mut ExecutionPublisher<'_>,
        identifier: &Identifier,
        side: Side,
        price: i64,
        quantity: i64,
        time_in_force: TimeInForce,
    ) -> Result<bool, BookError> {
        let order = book.accept(identifier.clone(), side, price, quantity, 0, time_in_force)?;
        let working = order.working_quantity();

        if time_in_force == TimeInForce::FillOrKill && !order.is_rejected() {
            let available = book.matchable_quantity(side, price, identifier.attribution_id());
            if available < working {
                if let Some(order) = book.pending_mut() {
                    order.reject(RejectReason::InsufficientLiquidity);
                }
            }
        }

        let rejection = book.pending().and_then(Order::reject_reason);
        let execution_id = book.commit()?;
        match rejection {
            Some(reason) => {
                publisher.accept_rejection(Some(execution_id), identifier, reason);
                Ok(false)
            }
            None => {
                if let Some(order) = book.pending() {
                    publisher.accept(execution_id, order);
                }
                Ok(true)
            }
        }
    }
}

/// Stages a replacement against a resting order.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplaceOrderAcceptPolicy;

impl ReplaceOrderAcceptPolicy {
    /// `None` when `cancel_identifier` is not resting. Otherwise true when the
    /// replacement is live and should be matched.
    ///
    /// The replacement inherits side, time-in-force and filled quantity from
    /// the old order. A rejected replacement leaves the old order resting.
    pub fn accept(
        &self,
        book: &mut LimitOrderBook,
        publisher: &mut ExecutionPublisher<'_>,
        identifier: &Identifier,
        cancel_identifier: &Identifier,
        price: i64,
        quantity: i64,
    ) -> Result<Option<bool>, BookError> {
        let Some(target) = book.cancel(cancel_identifier)? else {
            return Ok(None);
        };
        let (side, time_in_force, filled) = (target.side(), target.time_in_force(), target.filled_quantity());

        let rejection = book
            .accept(identifier.clone(), side, price, quantity, filled, time_in_force)?
            .reject_reason();
        if let Some(reason) = rejection {
            let execution_id = book.commit()?;
            publisher.replace_rejection(Some(execution_id), identifier, cancel_identifier, reason);
            return Ok(Some(false));
        }

        let cancelled = match book.cancel_target_mut() {
            Some(target) => target.cancel().clone(),
            None => {
                return Err(BookError::InvalidState {
                    state: book.state(),
                    operation: "replace",
                })
            }
        };
        let execution_id = book.commit()?;
        if let Some(replacement) = book.pending() {
            publisher.replace(execution_id, &cancelled, replacement);
        }
        Ok(Some(true))
    }
}

pub trait FillPolicy {
    fn fill(&self, book: &mut LimitOrderBook, publisher: &mut ExecutionPublisher<'_>) -> Result<(), BookError>;
}

/// Trades the staged order against resting liquidity until it completes or
/// runs out of prices within its limit. Never trades an originator against
/// itself: such passive orders are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartialFillPolicy;

impl FillPolicy for PartialFillPolicy {
    fn fill(&self, book: &mut LimitOrderBook, publisher: &mut ExecutionPublisher<'_>) -> Result<(), BookError> {
        let Some(side) = book.pending().map(Order::side) else {
            return Err(BookError::InvalidState {
                state: book.state(),
                operation: "fill",
            });
        };
        book.execute(side, &mut Sweep { publisher })
    }
}

struct Sweep<'p, 'a> {
    publisher: &'p mut ExecutionPublisher<'a>,
}

impl Matcher for Sweep<'_, '_> {
    fn next(&mut self, m: &mut Match<'_>) -> bool {
        let aggressive = m.aggressive();
        let price = m.passive().price();
        if !aggressive.side().within_limit(aggressive.price(), price) {
            return false;
        }
        if aggressive.identifier().attribution_id() == m.passive().identifier().attribution_id() {
            return true;
        }

        let quantity = aggressive.working_quantity().min(m.passive().working_quantity());
        let execution_id = m.fill(quantity);
        trace!(execution_id, price, quantity, "trade");
        self.publisher.trade(execution_id, m.aggressive(), m.passive(), price, quantity);
        !m.aggressive().is_completed()
    }
}

pub trait CancelPolicy {
    /// Decides what happens to the pending order's remainder and closes the
    /// book's transaction. `identifier` names the originating instruction.
    fn cancel(
        &self,
        book: &mut LimitOrderBook,
        publisher: &mut ExecutionPublisher<'_>,
        identifier: &Identifier,
    ) -> Result<(), BookError>;
}

/// Rests whatever is left.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodTillCancelPolicy;

impl CancelPolicy for GoodTillCancelPolicy {
    fn cancel(&self, book: &mut LimitOrderBook, _: &mut ExecutionPublisher<'_>, _: &Identifier) -> Result<(), BookError> {
        match book.pending().map(Order::is_completed) {
            Some(false) => book.commit().map(drop),
            Some(true) => book.release(),
            None => Ok(()),
        }
    }
}

/// Cancels whatever is left and reports it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateCancelPolicy;

impl CancelPolicy for ImmediateCancelPolicy {
    fn cancel(
        &self,
        book: &mut LimitOrderBook,
        publisher: &mut ExecutionPublisher<'_>,
        identifier: &Identifier,
    ) -> Result<(), BookError> {
        let Some(order) = book.pending_mut() else {
            return Ok(());
        };
        if order.is_completed() {
            return book.release();
        }
        let cancelled = order.cancel().clone();
        let execution_id = book.commit()?;
        publisher.cancel(execution_id, identifier, &cancelled);
        Ok(())
    }
}

pub fn fill_policy(_: TimeInForce) -> &'static dyn FillPolicy {
    &PartialFillPolicy
}

pub fn cancel_policy(time_in_force: TimeInForce) -> &'static dyn CancelPolicy {
    if time_in_force.is_resting() {
        &GoodTillCancelPolicy
    } else {
        &ImmediateCancelPolicy
    }
}
