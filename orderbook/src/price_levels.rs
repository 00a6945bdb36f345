use crate::order::Order;
use crate::types::Side;
use serde::{Deserialize, Serialize};
use slab::Slab;
use std::collections::HashMap;
use tracing::trace;

// Orders and levels live in slabs and link to each other by key, so
// unlinking is local and never leaves a dangling reference.
pub(crate) type OrderKey = usize;
pub(crate) type LevelKey = usize;

/// A resting order and its links within its price level's FIFO.
#[derive(Debug)]
pub(crate) struct OrderNode {
    pub(crate) order: Order,
    pub(crate) level: LevelKey,
    pub(crate) prev: Option<OrderKey>,
    pub(crate) next: Option<OrderKey>,
}

impl OrderNode {
    pub(crate) fn new(order: Order) -> Self {
        Self {
            order,
            level: 0,
            prev: None,
            next: None,
        }
    }
}

/// One price's FIFO queue: head is the earliest arrival.
/// `prev` points to the better-priced neighbour, `next` to the worse one.
#[derive(Debug)]
struct Limit {
    price: i64,
    head: Option<OrderKey>,
    tail: Option<OrderKey>,
    prev: Option<LevelKey>,
    next: Option<LevelKey>,
    orders: usize,
}

/// Aggregate view of one price level, best first when listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub price: i64,
    pub quantity: i64,
    pub orders: usize,
}

/// All price levels of one side, chained in strict price priority.
#[derive(Debug)]
pub(crate) struct PriceLevels {
    side: Side,
    levels: Slab<Limit>,
    by_price: HashMap<i64, LevelKey>,
    best: Option<LevelKey>,
}

impl PriceLevels {
    pub(crate) fn new(side: Side) -> Self {
        Self {
            side,
            levels: Slab::new(),
            by_price: HashMap::new(),
            best: None,
        }
    }

    pub(crate) fn best(&self) -> Option<LevelKey> {
        self.best
    }

    pub(crate) fn best_price(&self) -> Option<i64> {
        self.best.map(|key| self.levels[key].price)
    }

    pub(crate) fn head(&self, level: LevelKey) -> Option<OrderKey> {
        self.levels[level].head
    }

    /// The next worse-priced level.
    pub(crate) fn next_level(&self, level: LevelKey) -> Option<LevelKey> {
        self.levels[level].next
    }

    pub(crate) fn level_at(&self, price: i64) -> Option<LevelKey> {
        self.by_price.get(&price).copied()
    }

    pub(crate) fn price(&self, level: LevelKey) -> i64 {
        self.levels[level].price
    }

    /// Appends the node at `key` to the tail of its price's level, creating
    /// and threading a new level if the price is not yet present.
    pub(crate) fn push(&mut self, orders: &mut Slab<OrderNode>, key: OrderKey) {
        let price = orders[key].order.price();
        let level = match self.by_price.get(&price) {
            Some(&level) => level,
            None => self.insert_level(price),
        };

        let limit = &mut self.levels[level];
        let node = &mut orders[key];
        node.level = level;
        node.prev = limit.tail;
        node.next = None;
        match limit.tail {
            Some(tail) => orders[tail].next = Some(key),
            None => limit.head = Some(key),
        }
        limit.tail = Some(key);
        limit.orders += 1;
    }

    /// Unlinks the node at `key`, re-linking both of its neighbours, and
    /// drops the level once it is empty. The node itself stays in `orders`.
    pub(crate) fn remove(&mut self, orders: &mut Slab<OrderNode>, key: OrderKey) {
        let (level, prev, next) = {
            let node = &mut orders[key];
            let links = (node.level, node.prev, node.next);
            node.prev = None;
            node.next = None;
            links
        };

        match prev {
            Some(prev) => orders[prev].next = next,
            None => self.levels[level].head = next,
        }
        match next {
            Some(next) => orders[next].prev = prev,
            None => self.levels[level].tail = prev,
        }

        let limit = &mut self.levels[level];
        limit.orders -= 1;
        if limit.head.is_none() {
            self.remove_level(level);
        }
    }

    /// Levels best first, summed over working quantity.
    pub(crate) fn summaries<'a>(
        &'a self,
        orders: &'a Slab<OrderNode>,
    ) -> impl Iterator<Item = LevelSummary> + 'a {
        std::iter::successors(self.best, move |&level| self.levels[level].next).map(
            move |level| {
                let limit = &self.levels[level];
                LevelSummary {
                    price: limit.price,
                    quantity: self
                        .iter_level(orders, level)
                        .fold(0i64, |sum, o| sum.saturating_add(o.working_quantity())),
                    orders: limit.orders,
                }
            },
        )
    }

    /// Orders of one level in time priority.
    pub(crate) fn iter_level<'a>(
        &'a self,
        orders: &'a Slab<OrderNode>,
        level: LevelKey,
    ) -> impl Iterator<Item = &'a Order> + 'a {
        std::iter::successors(self.levels[level].head, move |&key| orders[key].next)
            .map(move |key| &orders[key].order)
    }

    // Linear scan from the best level; the new level goes in front of the
    // first level it outranks, or at the end of the chain.
    fn insert_level(&mut self, price: i64) -> LevelKey {
        let mut previous = None;
        let mut candidate = self.best;
        while let Some(current) = candidate {
            if self.side.is_better(price, self.levels[current].price) {
                break;
            }
            previous = Some(current);
            candidate = self.levels[current].next;
        }

        let key = self.levels.insert(Limit {
            price,
            head: None,
            tail: None,
            prev: previous,
            next: candidate,
            orders: 0,
        });
        self.by_price.insert(price, key);

        match previous {
            Some(previous) => self.levels[previous].next = Some(key),
            None => self.best = Some(key),
        }
        if let Some(candidate) = candidate {
            self.levels[candidate].prev = Some(key);
        }

        trace!(side = ?self.side, price, "price level created");
        key
    }

    fn remove_level(&mut self, key: LevelKey) {
        let limit = self.levels.remove(key);
        self.by_price.remove(&limit.price);

        match limit.prev {
            Some(prev) => self.levels[prev].next = limit.next,
            None => self.best = limit.next,
        }
        if let Some(next) = limit.next {
            self.levels[next].prev = limit.prev;
        }

        trace!(side = ?self.side, price = limit.price, "price level removed");
    }
}
