//! Readers over sampled signal traces
//!
//! This module contains the three ways the matching engines read traces:
//! a lookahead cursor over event timestamps, a point-in-time lookup over
//! attribute values, and a reset boundary tracker. [`TraceSet`] bundles the
//! traces of one read channel.

pub mod cursor;
pub mod lookup;
pub mod reset;
pub mod set;

// Re-export reader types
pub use cursor::EventCursor;
pub use lookup::{is_asserted, AttributeLookup};
pub use reset::{active_ticks, ResetTracker};
pub use set::TraceSet;
