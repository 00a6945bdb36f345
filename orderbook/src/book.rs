use crate::error::BookError;
use crate::order::Order;
use crate::price_levels::{LevelSummary, OrderKey, OrderNode, PriceLevels};
use crate::types::{Identifier, Instrument, RejectReason, Side, TimeInForce};
use serde::{Deserialize, Serialize};
use slab::Slab;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Where the book is in its stage/commit protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookState {
    Waiting,
    Accepting,
    Adding,
    Canceling,
    /// A cancel target is held and a replacement has been staged against it.
    Replacing,
    Executing,
}

#[derive(Debug, Default)]
pub(crate) struct Sequence(u64);

impl Sequence {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// One aggressive/passive pairing handed to a [`Matcher`] during [`LimitOrderBook::execute`].
pub struct Match<'a> {
    aggressive: &'a mut Order,
    passive: &'a mut Order,
    executions: &'a mut Sequence,
}

impl Match<'_> {
    pub fn aggressive(&self) -> &Order {
        self.aggressive
    }

    pub fn passive(&self) -> &Order {
        self.passive
    }

    /// Fills both orders by `quantity` and draws the execution id stamping the trade.
    pub fn fill(&mut self, quantity: i64) -> u64 {
        self.aggressive.fill(quantity);
        self.passive.fill(quantity);
        self.executions.next()
    }
}

/// Visits resting contra orders in price-time priority.
pub trait Matcher {
    /// Returns false to stop the traversal.
    fn next(&mut self, m: &mut Match<'_>) -> bool;
}

/// Price-time priority book for one instrument.
///
/// Every mutation goes through a staged protocol: `accept` or `cancel` opens a
/// transaction, `execute` matches the staged order, and `commit` (or
/// `release`) closes it. Calls out of sequence fail with [`BookError`].
#[derive(Debug)]
pub struct LimitOrderBook {
    instrument: Instrument,
    open: bool,
    state: BookState,
    orders: Slab<OrderNode>,
    index: HashMap<Identifier, OrderKey>,
    bids: PriceLevels,
    asks: PriceLevels,
    order_ids: Sequence,
    executions: Sequence,
    staged: Option<Order>,
    cancel_target: Option<OrderKey>,
}

impl LimitOrderBook {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            open: true,
            state: BookState::Waiting,
            orders: Slab::new(),
            index: HashMap::new(),
            bids: PriceLevels::new(Side::Buy),
            asks: PriceLevels::new(Side::Sell),
            order_ids: Sequence::default(),
            executions: Sequence::default(),
            staged: None,
            cancel_target: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn state(&self) -> BookState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        debug!(symbol = %self.instrument.symbol, open, "order book status changed");
        self.open = open;
    }

    /// Stages a new order. Nothing is indexed until a later `commit`.
    ///
    /// Legal from `Waiting`, or from `Canceling` to stage a replacement.
    /// Invalid price, quantity or a duplicate identifier mark the staged order
    /// rejected rather than failing.
    pub fn accept(
        &mut self,
        identifier: Identifier,
        side: Side,
        price: i64,
        quantity: i64,
        filled_quantity: i64,
        time_in_force: TimeInForce,
    ) -> Result<&mut Order, BookError> {
        let next = match self.state {
            BookState::Waiting => BookState::Accepting,
            BookState::Canceling => BookState::Replacing,
            state => {
                return Err(BookError::InvalidState {
                    state,
                    operation: "accept",
                })
            }
        };

        let mut order = Order::new(
            identifier,
            self.order_ids.next(),
            side,
            price,
            quantity,
            filled_quantity,
            time_in_force,
        );
        if let Some(reason) = self.validate(&order) {
            debug!(identifier = %order.identifier(), ?reason, "staged order rejected");
            order.reject(reason);
        }

        self.state = next;
        Ok(self.staged.insert(order))
    }

    /// Looks up a resting order and holds it as the cancel target. The order is
    /// not modified; the caller cancels it and then commits.
    pub fn cancel(&mut self, identifier: &Identifier) -> Result<Option<&mut Order>, BookError> {
        self.expect(BookState::Waiting, "cancel")?;
        match self.index.get(identifier).copied() {
            Some(key) => {
                self.cancel_target = Some(key);
                self.state = BookState::Canceling;
                Ok(Some(&mut self.orders[key].order))
            }
            None => Ok(None),
        }
    }

    /// Drives `matcher` over the contra side of the staged order, best level
    /// first and oldest order first within a level. A passive order is
    /// unlinked as soon as it completes.
    pub fn execute<M: Matcher + ?Sized>(&mut self, side: Side, matcher: &mut M) -> Result<(), BookError> {
        self.expect(BookState::Adding, "execute")?;
        let Self {
            state,
            orders,
            index,
            bids,
            asks,
            executions,
            staged,
            ..
        } = self;

        let Some(aggressive) = staged.as_mut() else {
            return Err(BookError::InvalidState {
                state: *state,
                operation: "execute",
            });
        };
        if aggressive.side() != side {
            return Err(BookError::SideMismatch {
                expected: aggressive.side(),
                actual: side,
            });
        }

        let contra = match side {
            Side::Buy => asks,
            Side::Sell => bids,
        };
        let previous = std::mem::replace(state, BookState::Executing);

        let mut level = contra.best();
        'levels: while let Some(current) = level {
            level = contra.next_level(current);
            let mut cursor = contra.head(current);
            while let Some(key) = cursor {
                cursor = orders[key].next;
                let more = matcher.next(&mut Match {
                    aggressive: &mut *aggressive,
                    passive: &mut orders[key].order,
                    executions: &mut *executions,
                });
                if orders[key].order.is_completed() {
                    let order = unlink(orders, index, contra, key);
                    trace!(identifier = %order.identifier(), order_id = order.order_id(), "passive order completed");
                }
                if !more {
                    break 'levels;
                }
            }
        }

        *state = previous;
        Ok(())
    }

    /// Finalizes the open transaction and returns a fresh execution id.
    ///
    /// `Accepting` moves to `Adding` (or `Waiting` when the staged order was
    /// rejected). `Adding` rests the staged order unless it completed.
    /// `Canceling` removes the target if it completed. `Replacing` does both
    /// halves at once: the old order leaves and the replacement moves to
    /// `Adding`.
    pub fn commit(&mut self) -> Result<u64, BookError> {
        self.state = match self.state {
            BookState::Accepting => self.admit_staged(),
            BookState::Replacing => {
                self.retire_cancel_target();
                self.admit_staged()
            }
            BookState::Canceling => {
                self.retire_cancel_target();
                BookState::Waiting
            }
            BookState::Adding => {
                if let Some(order) = self.staged.take() {
                    if !order.is_completed() {
                        self.rest(order);
                    }
                }
                BookState::Waiting
            }
            state => {
                return Err(BookError::InvalidState {
                    state,
                    operation: "commit",
                })
            }
        };
        Ok(self.executions.next())
    }

    /// Closes an `Adding` transaction whose order completed during matching,
    /// without drawing an execution id.
    pub fn release(&mut self) -> Result<(), BookError> {
        let completed = self.staged.as_ref().map_or(false, Order::is_completed);
        if self.state != BookState::Adding || !completed {
            return Err(BookError::InvalidState {
                state: self.state,
                operation: "release",
            });
        }
        self.staged = None;
        self.state = BookState::Waiting;
        Ok(())
    }

    /// The order the open transaction is about: the staged order, or the
    /// cancel target while canceling.
    pub fn pending(&self) -> Option<&Order> {
        match self.state {
            BookState::Accepting | BookState::Adding | BookState::Replacing => self.staged.as_ref(),
            BookState::Canceling => self.cancel_target.map(|key| &self.orders[key].order),
            BookState::Waiting | BookState::Executing => None,
        }
    }

    pub fn pending_mut(&mut self) -> Option<&mut Order> {
        match self.state {
            BookState::Accepting | BookState::Adding | BookState::Replacing => self.staged.as_mut(),
            BookState::Canceling => match self.cancel_target {
                Some(key) => Some(&mut self.orders[key].order),
                None => None,
            },
            BookState::Waiting | BookState::Executing => None,
        }
    }

    /// The resting order being cancelled or replaced.
    pub fn cancel_target_mut(&mut self) -> Option<&mut Order> {
        match (self.state, self.cancel_target) {
            (BookState::Canceling | BookState::Replacing, Some(key)) => Some(&mut self.orders[key].order),
            _ => None,
        }
    }

    pub fn status(&self, identifier: &Identifier) -> Option<&Order> {
        self.index.get(identifier).map(|&key| &self.orders[key].order)
    }

    /// Working quantity an order on `side` limited at `limit` could trade
    /// against right now, ignoring orders sharing `attribution_id`.
    /// Saturates at `i64::MAX`.
    pub fn matchable_quantity(&self, side: Side, limit: i64, attribution_id: i32) -> i64 {
        let contra = self.levels(side.contra());
        let mut total = 0i64;
        let mut level = contra.best();
        while let Some(current) = level {
            if !side.within_limit(limit, contra.price(current)) {
                break;
            }
            total = contra
                .iter_level(&self.orders, current)
                .filter(|order| order.identifier().attribution_id() != attribution_id)
                .fold(total, |sum, order| sum.saturating_add(order.working_quantity()));
            if total == i64::MAX {
                break;
            }
            level = contra.next_level(current);
        }
        total
    }

    pub fn best_bid(&self) -> Option<i64> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<i64> {
        self.asks.best_price()
    }

    /// Up to `levels` price levels of one side, best first.
    pub fn depth(&self, side: Side, levels: usize) -> Vec<LevelSummary> {
        self.levels(side).summaries(&self.orders).take(levels).collect()
    }

    /// Resting orders at one price, in time priority.
    pub fn orders_at(&self, side: Side, price: i64) -> impl Iterator<Item = &Order> + '_ {
        let levels = self.levels(side);
        levels
            .level_at(price)
            .into_iter()
            .flat_map(move |level| levels.iter_level(&self.orders, level))
    }

    /// All resting orders, in no particular order.
    pub fn resting(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter().map(|(_, node)| &node.order)
    }

    /// Number of resting orders.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn levels(&self, side: Side) -> &PriceLevels {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn expect(&self, state: BookState, operation: &'static str) -> Result<(), BookError> {
        if self.state == state {
            Ok(())
        } else {
            Err(BookError::InvalidState {
                state: self.state,
                operation,
            })
        }
    }

    fn validate(&self, order: &Order) -> Option<RejectReason> {
        if !self.instrument.is_valid_price(order.price()) {
            return Some(RejectReason::InvalidPrice);
        }
        if !self.instrument.is_valid_quantity(order.quantity())
            || order.filled_quantity() < 0
            || order.working_quantity() <= 0
        {
            return Some(RejectReason::InvalidQuantity);
        }
        match self.index.get(order.identifier()) {
            Some(&key) if Some(key) != self.cancel_target => Some(RejectReason::DuplicateOrder),
            _ => None,
        }
    }

    fn admit_staged(&mut self) -> BookState {
        match &self.staged {
            Some(order) if !order.is_rejected() => BookState::Adding,
            _ => {
                self.staged = None;
                BookState::Waiting
            }
        }
    }

    fn retire_cancel_target(&mut self) {
        let Some(key) = self.cancel_target.take() else {
            return;
        };
        if !self.orders[key].order.is_completed() {
            return;
        }
        let Self {
            orders,
            index,
            bids,
            asks,
            ..
        } = self;
        let levels = match orders[key].order.side() {
            Side::Buy => bids,
            Side::Sell => asks,
        };
        let order = unlink(orders, index, levels, key);
        trace!(identifier = %order.identifier(), order_id = order.order_id(), "cancelled order removed");
    }

    fn rest(&mut self, order: Order) {
        let Self {
            orders,
            index,
            bids,
            asks,
            ..
        } = self;
        let levels = match order.side() {
            Side::Buy => bids,
            Side::Sell => asks,
        };
        let identifier = order.identifier().clone();
        let key = orders.insert(OrderNode::new(order));
        levels.push(orders, key);
        index.insert(identifier, key);
    }
}

impl Default for LimitOrderBook {
    fn default() -> Self {
        Self::new(Instrument::default())
    }
}

fn unlink(
    orders: &mut Slab<OrderNode>,
    index: &mut HashMap<Identifier, OrderKey>,
    levels: &mut PriceLevels,
    key: OrderKey,
) -> Order {
    levels.remove(orders, key);
    let node = orders.remove(key);
    index.remove(node.order.identifier());
    node.order
}
