use std::time::{Duration, Instant};

use tracing::Span;

use super::TraceId;

/// Root span for one poll cycle. Everything logged inside inherits the
/// trace id and the cycle number.
pub fn cycle_span(cycle: u64, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "cycle",
        cycle = cycle,
        trace_id = %trace_id.as_str()
    )
}

/// Runs `f` and emits a `performance` warning when it takes longer than `max`.
pub fn warn_if_slow<F, T>(label: &'static str, max: Duration, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = max.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
