//! Common utility functions shared across the domain and engine crates.
//!
//! # Design Principles
//!
//! - **Pure functions only** - no side effects, no I/O
//! - **Minimal dependencies** - only chrono for datetime utilities

pub mod datetime;
pub mod string;

// Re-export commonly used functions at crate root for convenience
pub use datetime::{parse_datetime, parse_datetime_or};
pub use string::{none_if_empty, some_if_not_empty, StringExt};
