//! Error taxonomy for the pile engine
//!
//! None of these are fatal. Every operation that returns one of them leaves
//! the order and the data window in their last valid state.

use thiserror::Error;

use crate::domain::order::{Direction, SlotId};

/// Errors surfaced by the pile engine and its controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PileError {
    /// The pile was configured with zero slots
    #[error("a pile needs at least one slot")]
    EmptyPile,

    /// Bound card count differs from the pile capacity
    #[error("expected {expected} bound cards but found {bound}")]
    SlotCountMismatch { expected: usize, bound: usize },

    /// Window arithmetic resolved outside the data source
    #[error("record index {index} is outside a source of {len} records")]
    IndexOutOfRange { index: i64, len: usize },

    /// Clamping was requested against a source with no records
    #[error("data source is empty")]
    EmptySource,

    /// Paging moved below the first page
    #[error("cannot page below the first page")]
    PageUnderflow,

    /// Paging moved past the last addressable page
    #[error("page {page} is past the last addressable page")]
    PageOverflow { page: usize },

    /// A completion notification that does not close the pending rotation
    #[error("unmatched tilt notification: {0}")]
    UnmatchedNotification(#[from] UnmatchedReason),

    /// A rotation request refused while another was in flight
    #[error("{direction} rotation request dropped: {reason}")]
    RequestDropped {
        direction: Direction,
        reason: DropReason,
    },
}

/// Why a tilt notification was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnmatchedReason {
    #[error("no rotation pending (got {got})")]
    NotPending { got: Direction },

    #[error("expected {expected} but card reported {got}")]
    DirectionMismatch { expected: Direction, got: Direction },

    #[error("expected completion from {expected} but {got} reported")]
    ForeignSlot { expected: SlotId, got: SlotId },
}

/// Why an overlapping rotation request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("a rotation is already in flight")]
    RotationInFlight,

    #[error("queue is full ({limit} waiting)")]
    QueueFull { limit: usize },
}
