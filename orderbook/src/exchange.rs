use crate::book::LimitOrderBook;
use crate::clock::{Clock, SystemClock};
use crate::error::BookError;
use crate::execution::ExecutionCallback;
use crate::instruction::{CancelOrder, CancelReplaceOrder, Instruction, OrderStatus, PlaceOrder};
use crate::order::Order;
use crate::policy::{
    cancel_policy, fill_policy, CancelPolicy, ImmediateCancelPolicy, OrderAcceptPolicy, ReplaceOrderAcceptPolicy,
};
use crate::publisher::ExecutionPublisher;
use crate::types::{Instrument, RejectReason};
use tracing::{debug, info};

/// Entry point for instructions against one instrument's book.
///
/// Every operation delivers its executions inside exactly one
/// `start`/`commit` frame on the callback, rejections included. An `Err`
/// means the book's protocol was violated and the exchange should not be
/// used further.
pub struct Exchange {
    book: LimitOrderBook,
    clock: Box<dyn Clock>,
}

impl Exchange {
    pub fn new(instrument: Instrument) -> Self {
        Self::with_clock(instrument, Box::new(SystemClock))
    }

    pub fn with_clock(instrument: Instrument, clock: Box<dyn Clock>) -> Self {
        Self {
            book: LimitOrderBook::new(instrument),
            clock,
        }
    }

    pub fn order_book(&self) -> &LimitOrderBook {
        &self.book
    }

    pub fn open(&mut self) {
        info!(symbol = %self.book.symbol(), "opening order book");
        self.book.set_open(true);
    }

    pub fn close(&mut self) {
        info!(symbol = %self.book.symbol(), "closing order book");
        self.book.set_open(false);
    }

    pub fn submit(&mut self, instruction: &Instruction, callback: &mut dyn ExecutionCallback) -> Result<(), BookError> {
        match instruction {
            Instruction::Place(place) => self.place_order(place, callback),
            Instruction::CancelReplace(replace) => self.cancel_replace_order(replace, callback),
            Instruction::Cancel(cancel) => self.cancel_order(cancel, callback),
            Instruction::Status(status) => self.order_status(status, callback),
        }
    }

    pub fn place_order(&mut self, instruction: &PlaceOrder, callback: &mut dyn ExecutionCallback) -> Result<(), BookError> {
        let mut publisher = ExecutionPublisher::start(callback, self.clock.as_ref(), &instruction.symbol);
        let result = place(&mut self.book, &mut publisher, instruction);
        publisher.commit();
        result
    }

    pub fn cancel_replace_order(
        &mut self,
        instruction: &CancelReplaceOrder,
        callback: &mut dyn ExecutionCallback,
    ) -> Result<(), BookError> {
        let mut publisher = ExecutionPublisher::start(callback, self.clock.as_ref(), &instruction.symbol);
        let result = cancel_replace(&mut self.book, &mut publisher, instruction);
        publisher.commit();
        result
    }

    pub fn cancel_order(&mut self, instruction: &CancelOrder, callback: &mut dyn ExecutionCallback) -> Result<(), BookError> {
        let mut publisher = ExecutionPublisher::start(callback, self.clock.as_ref(), &instruction.symbol);
        let result = cancel(&mut self.book, &mut publisher, instruction);
        publisher.commit();
        result
    }

    pub fn order_status(&mut self, instruction: &OrderStatus, callback: &mut dyn ExecutionCallback) -> Result<(), BookError> {
        let mut publisher = ExecutionPublisher::start(callback, self.clock.as_ref(), &instruction.symbol);
        status(&self.book, &mut publisher, instruction);
        publisher.commit();
        Ok(())
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new(Instrument::default())
    }
}

fn lookup<'b>(book: &'b mut LimitOrderBook, symbol: &str) -> Result<&'b mut LimitOrderBook, RejectReason> {
    if book.symbol() != symbol {
        Err(RejectReason::UnknownInstrument)
    } else if !book.is_open() {
        Err(RejectReason::OrderBookClosed)
    } else {
        Ok(book)
    }
}

fn place(book: &mut LimitOrderBook, publisher: &mut ExecutionPublisher<'_>, instruction: &PlaceOrder) -> Result<(), BookError> {
    let identifier = instruction.identifier();
    let book = match lookup(book, &instruction.symbol) {
        Ok(book) => book,
        Err(reason) => {
            debug!(%identifier, symbol = %instruction.symbol, ?reason, "place rejected");
            publisher.accept_rejection(None, &identifier, reason);
            return Ok(());
        }
    };

    let time_in_force = instruction.time_in_force;
    let live = OrderAcceptPolicy.accept(
        book,
        publisher,
        &identifier,
        instruction.side,
        instruction.price,
        instruction.quantity,
        time_in_force,
    )?;
    if live {
        fill_policy(time_in_force).fill(book, publisher)?;
        cancel_policy(time_in_force).cancel(book, publisher, &identifier)?;
    }
    Ok(())
}

fn cancel_replace(
    book: &mut LimitOrderBook,
    publisher: &mut ExecutionPublisher<'_>,
    instruction: &CancelReplaceOrder,
) -> Result<(), BookError> {
    let identifier = instruction.identifier();
    let cancel_identifier = instruction.cancel_identifier();
    let book = match lookup(book, &instruction.symbol) {
        Ok(book) => book,
        Err(reason) => {
            debug!(%identifier, symbol = %instruction.symbol, ?reason, "replace rejected");
            publisher.replace_rejection(None, &identifier, &cancel_identifier, reason);
            return Ok(());
        }
    };

    let outcome = ReplaceOrderAcceptPolicy.accept(
        book,
        publisher,
        &identifier,
        &cancel_identifier,
        instruction.price,
        instruction.quantity,
    )?;
    match outcome {
        None => {
            debug!(%identifier, %cancel_identifier, "replace of unknown order");
            publisher.replace_rejection(None, &identifier, &cancel_identifier, RejectReason::UnknownOrder);
        }
        Some(true) => {
            if let Some(time_in_force) = book.pending().map(Order::time_in_force) {
                fill_policy(time_in_force).fill(book, publisher)?;
                cancel_policy(time_in_force).cancel(book, publisher, &identifier)?;
            }
        }
        Some(false) => {}
    }
    Ok(())
}

fn cancel(book: &mut LimitOrderBook, publisher: &mut ExecutionPublisher<'_>, instruction: &CancelOrder) -> Result<(), BookError> {
    let identifier = instruction.identifier();
    let cancel_identifier = instruction.cancel_identifier();
    let reason = match lookup(book, &instruction.symbol) {
        Ok(book) => {
            if book.cancel(&cancel_identifier)?.is_some() {
                return ImmediateCancelPolicy.cancel(book, publisher, &identifier);
            }
            RejectReason::UnknownOrder
        }
        Err(reason) => reason,
    };
    debug!(%identifier, %cancel_identifier, ?reason, "cancel rejected");
    publisher.cancel_rejection(&identifier, &cancel_identifier, reason);
    Ok(())
}

fn status(book: &LimitOrderBook, publisher: &mut ExecutionPublisher<'_>, instruction: &OrderStatus) {
    let identifier = instruction.identifier();
    let status_identifier = instruction.status_identifier();
    let reason = if book.symbol() != instruction.symbol {
        RejectReason::UnknownInstrument
    } else if !book.is_open() {
        RejectReason::OrderBookClosed
    } else {
        match book.status(&status_identifier) {
            Some(order) => return publisher.status(&identifier, order),
            None => RejectReason::UnknownOrder,
        }
    };
    publisher.status_rejection(&identifier, &status_identifier, reason);
}
