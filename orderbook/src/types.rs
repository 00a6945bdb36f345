// Prices and quantities are integer ticks/lots everywhere inside the book;
// see `units` for the conversions at the boundary.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an order of this side trades against.
    pub fn contra(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Returns true when `price` ranks strictly ahead of `other` in this side's queue.
    /// Buy: higher wins. Sell: lower wins.
    pub fn is_better(self, price: i64, other: i64) -> bool {
        match self {
            Side::Buy => price > other,
            Side::Sell => price < other,
        }
    }

    /// Whether an aggressive order on this side with `limit` may trade at `price`.
    pub fn within_limit(self, limit: i64, price: i64) -> bool {
        match self {
            Side::Buy => limit >= price,
            Side::Sell => limit <= price,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    GoodTillCancel,
    GoodForDay,
    ImmediateOrCancel,
    /// Full fill on arrival or the whole order is rejected.
    FillOrKill,
}

impl TimeInForce {
    /// Resting time-in-force values leave their unfilled remainder in the book.
    pub fn is_resting(self) -> bool {
        matches!(self, TimeInForce::GoodTillCancel | TimeInForce::GoodForDay)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    UnknownOrder,
    UnknownInstrument,
    OrderBookClosed,
    InvalidPrice,
    InvalidQuantity,
    DuplicateOrder,
    InsufficientLiquidity,
}

/// Composite order key: an opaque id namespaced by the originator's attribution tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    id: String,
    attribution_id: i32,
}

impl Identifier {
    pub fn new(id: impl Into<String>, attribution_id: i32) -> Self {
        Self {
            id: id.into(),
            attribution_id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attribution_id(&self) -> i32 {
        self.attribution_id
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.attribution_id)
    }
}

/// Tradable instrument. Increments are expressed in ticks and lots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub tick_size: i64,
    pub lot_size: i64,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, tick_size: i64, lot_size: i64) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size: tick_size.max(1),
            lot_size: lot_size.max(1),
        }
    }

    pub fn is_valid_price(&self, price: i64) -> bool {
        price > 0 && price % self.tick_size == 0
    }

    pub fn is_valid_quantity(&self, quantity: i64) -> bool {
        quantity > 0 && quantity % self.lot_size == 0
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new("XBT.USD", 1, 1)
    }
}
