use crate::types::{Identifier, RejectReason, Side, TimeInForce};

/// Quantities of one instruction as it moves through the book.
///
/// `quantity == working + filled + cancelled` holds after every mutation;
/// cancelled is never stored, only derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    identifier: Identifier,
    order_id: u64,
    side: Side,
    time_in_force: TimeInForce,
    price: i64,
    quantity: i64,
    working_quantity: i64,
    filled_quantity: i64,
    reject_reason: Option<RejectReason>,
}

impl Order {
    pub(crate) fn new(
        identifier: Identifier,
        order_id: u64,
        side: Side,
        price: i64,
        quantity: i64,
        filled_quantity: i64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            identifier,
            order_id,
            side,
            time_in_force,
            price,
            quantity,
            working_quantity: quantity.saturating_sub(filled_quantity),
            filled_quantity,
            reject_reason: None,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Book-assigned, monotonic per book.
    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn working_quantity(&self) -> i64 {
        self.working_quantity
    }

    pub fn filled_quantity(&self) -> i64 {
        self.filled_quantity
    }

    pub fn cancelled_quantity(&self) -> i64 {
        self.quantity
            .saturating_sub(self.working_quantity)
            .saturating_sub(self.filled_quantity)
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        self.reject_reason
    }

    pub fn is_rejected(&self) -> bool {
        self.reject_reason.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.is_rejected() || self.working_quantity == 0
    }

    /// Moves `quantity` from working to filled.
    pub fn fill(&mut self, quantity: i64) -> &mut Self {
        debug_assert!(
            (0..=self.working_quantity).contains(&quantity),
            "fill of {quantity} exceeds working {}",
            self.working_quantity
        );
        self.filled_quantity += quantity;
        self.working_quantity -= quantity;
        self
    }

    /// Zeroes the working quantity; the remainder becomes cancelled.
    pub fn cancel(&mut self) -> &mut Self {
        self.working_quantity = 0;
        self
    }

    pub(crate) fn reject(&mut self, reason: RejectReason) -> &mut Self {
        self.reject_reason = Some(reason);
        self
    }
}
