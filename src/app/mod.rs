//! Pile orchestration layer
//!
//! This module coordinates the domain engine with the cards. It owns the
//! rotation state machine and routes commands and notifications.

pub mod controller;
pub mod state;

pub use controller::{
    CommandOutcome, OverlapPolicy, PileController, RequestOutcome, RotationCommitted,
};
pub use state::{PendingRotation, PileState};
