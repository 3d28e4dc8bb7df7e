//! One cycle's computation, from raw lines to stats rows, with no I/O.

use std::collections::BTreeMap;

use crate::delta::tick_deltas;
use crate::impact::{ImpactRecord, estimate_impact};
use crate::report::{ReportRow, build_rows};
use crate::types::DeltaSeries;
use crate::window::WindowBuilder;

#[derive(Clone, Debug, PartialEq)]
pub struct CycleOutput {
    pub deltas: DeltaSeries,
    pub impact: BTreeMap<String, ImpactRecord>,
    pub rows: Vec<ReportRow>,

    /// Tickers present in the window, including those with a single tick.
    pub tickers: usize,

    /// Three-field lines rejected for a non-integer timestamp or value.
    pub malformed_numeric: usize,
}

impl CycleOutput {
    /// Rows written with `N/A` in place of a shift ratio.
    pub fn rows_without_ratio(&self) -> usize {
        self.rows.iter().filter(|r| r.shift_ratio.is_none()).count()
    }
}

/// Window → deltas → impact → rows.
pub fn compute_rows<I, S>(lines: I, window: WindowBuilder, cutoff_ms: i64) -> CycleOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let built = window.build(lines);
    let deltas = tick_deltas(&built.window);
    let impact = estimate_impact(&deltas, cutoff_ms);
    let rows = build_rows(&deltas, &impact);

    CycleOutput {
        tickers: built.window.len(),
        malformed_numeric: built.malformed_numeric,
        deltas,
        impact,
        rows,
    }
}
