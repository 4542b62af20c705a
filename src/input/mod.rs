//! User input mapping
//!
//! Translates clicks and keys into pile commands. Dispatching them is the
//! controller's job.

pub mod zones;

pub use zones::{ActivationZones, PileCommand};
