//! Domain logic and core data structures
//!
//! Pure pile logic: slot order, z-ranks, the data window and their errors.
//! Nothing here knows about cards, rendering or input.

pub mod core;
pub mod error;
pub mod order;
pub mod window;

pub use error::{DropReason, PileError, UnmatchedReason};
pub use order::{Direction, PileOrder, SlotId, ZRank, ZRanks};
pub use window::{DataSource, DataWindow, IndexPolicy};
