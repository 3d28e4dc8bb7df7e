//! Tick-log analytics.
//!
//! Everything in this crate is cycle-scoped value data: a cycle reads the tail
//! of the tick log, rebuilds the per-ticker window from scratch, and derives
//! deltas, summary statistics and the mean-shift ratio from it. Nothing is
//! carried over between cycles.

pub mod delta;
pub mod error;
pub mod impact;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod tail;
pub mod types;
pub mod window;
