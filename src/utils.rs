//! Utility functions for the cacao service
//!
//! - `clock` for injectable wall-clock time

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
