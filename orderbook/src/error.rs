use crate::book::BookState;
use crate::types::Side;
use thiserror::Error;

/// Misuse of the book's staging protocol. These are contract violations by
/// the caller, never business outcomes; rejections travel as `RejectReason`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("cannot {operation} while order book is {state:?}")]
    InvalidState {
        state: BookState,
        operation: &'static str,
    },
    #[error("matcher driven for {actual:?} but staged order is {expected:?}")]
    SideMismatch { expected: Side, actual: Side },
}
