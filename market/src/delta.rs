use crate::types::{DeltaSeries, Series, TickWindow};

/// Converts every ticker's window into consecutive differences.
///
/// Tickers with a single tick are kept with an empty series so callers can
/// tell "seen but nothing to compare" from "not seen at all".
pub fn tick_deltas(window: &TickWindow) -> DeltaSeries {
    window
        .iter()
        .map(|(ticker, ticks)| (ticker.clone(), consecutive_deltas(ticks)))
        .collect()
}

/// Walks `ticks` in ascending timestamp order. Differences saturate at the
/// `i64` bounds.
pub fn consecutive_deltas(ticks: &Series) -> Series {
    ticks
        .iter()
        .zip(ticks.iter().skip(1))
        .map(|((_, prev), (ts, cur))| (*ts, cur.saturating_sub(*prev)))
        .collect()
}
