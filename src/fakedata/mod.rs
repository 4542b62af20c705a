//! Fake record generation
//!
//! Produces the backing record sequence for demos and tests from a small
//! field model.

pub mod generator;
pub mod model;

pub use generator::{RecordSet, make_fake_records};
pub use model::{FakeDataError, FieldKind, Model};
