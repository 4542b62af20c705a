//! Configuration module for card-pile
//!
//! Pile settings are layered: built-in defaults, an optional `pile.toml`,
//! then `PILE__*` environment overrides.

pub mod pile;

pub use pile::{ConfigError, PileConfig};
