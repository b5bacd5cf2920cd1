//! Command implementations for qconc.

pub mod concurrency;

pub use concurrency::{ConcurrencyCommand, ConcurrencyRun};
