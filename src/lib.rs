//! Rotating card pile over a paged record sequence
//!
//! A pile shows N cards. Tilting the top or bottom card rotates which slot is
//! in front, and paging moves the whole pile to the next block of records.

pub mod app;
pub mod config;
pub mod domain;
pub mod fakedata;
pub mod input;
pub mod ui;
