//! Session Module
//!
//! RAM-only view of a charging session rebuilt from log records.

mod active;

pub use active::{ActiveSession, INITIAL_CAPACITY};
