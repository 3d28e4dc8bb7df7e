//! Impact Estimator
//!
//! The mean-shift heuristic compares the mean of every delta currently in a
//! ticker's window with the mean of the older deltas only, i.e. those stamped
//! at or before a cutoff.
//!
//! ## Definition
//!
//! ```text
//! mean_all    = mean(deltas)
//! mean_old    = mean(deltas where ts <= cutoff)
//! shift_ratio = 1 + (mean_all - mean_old) / |mean_old|
//! ```
//!
//! ## Interpretation
//! - `shift_ratio > 1` → recent deltas pulled the mean up
//! - `shift_ratio = 1` → nothing newer than the cutoff moved the mean
//! - `shift_ratio < 1` → recent deltas pulled the mean down
//!
//! The mean is deliberately used for its sensitivity to rare, large
//! deviations; this is a rough skew proxy, not a skewness estimator.
//!
//! ## Undefined cases
//! A ticker gets no ratio when it has no deltas, when no delta is old enough
//! to form the baseline, or when the baseline mean is exactly zero. Such
//! tickers are absent from the result; they never appear as NaN or zero.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::stats::mean;
use crate::types::{DeltaSeries, Series};

/// How the baseline cutoff is chosen each cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutoffPolicy {
    /// Cutoff = now − the given lookback (normally one poll interval).
    Trailing(Duration),

    /// Fixed cutoff in ms since epoch. Meant for replaying recorded logs.
    Fixed(i64),
}

impl CutoffPolicy {
    pub fn cutoff_ms(&self, now_ms: i64) -> i64 {
        match self {
            CutoffPolicy::Trailing(lookback) => {
                let lookback_ms = i64::try_from(lookback.as_millis()).unwrap_or(i64::MAX);
                now_ms.saturating_sub(lookback_ms)
            }
            CutoffPolicy::Fixed(ts_ms) => *ts_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactRecord {
    pub mean_all: f64,
    pub mean_old: f64,
    pub shift_ratio: f64,
}

/// Why a ticker has no shift ratio this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImpactGap {
    NoDeltas,
    NoBaseline,
    ZeroBaseline,
}

/// Shift ratio for one ticker's deltas.
pub fn impact_for(deltas: &Series, cutoff_ms: i64) -> Result<ImpactRecord, ImpactGap> {
    let all: Vec<i64> = deltas.values().copied().collect();
    let old: Vec<i64> = deltas.range(..=cutoff_ms).map(|(_, d)| *d).collect();

    let mean_all = mean(&all).ok_or(ImpactGap::NoDeltas)?;
    let mean_old = mean(&old).ok_or(ImpactGap::NoBaseline)?;

    if mean_old == 0.0 {
        return Err(ImpactGap::ZeroBaseline);
    }

    Ok(ImpactRecord {
        mean_all,
        mean_old,
        shift_ratio: 1.0 + (mean_all - mean_old) / mean_old.abs(),
    })
}

/// Shift ratios for every ticker that has one.
pub fn estimate_impact(deltas: &DeltaSeries, cutoff_ms: i64) -> BTreeMap<String, ImpactRecord> {
    deltas
        .iter()
        .filter_map(|(ticker, series)| {
            impact_for(series, cutoff_ms)
                .ok()
                .map(|record| (ticker.clone(), record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TickerMap;

    fn series(points: &[(i64, i64)]) -> Series {
        points.iter().copied().collect()
    }

    #[test]
    fn worked_example_doubles() {
        let s = series(&[(1, 10), (2, 20), (3, 30), (10, 100)]);
        let r = impact_for(&s, 3).unwrap();

        assert_eq!(r.mean_all, 40.0);
        assert_eq!(r.mean_old, 20.0);
        assert_eq!(r.shift_ratio, 2.0);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let s = series(&[(5, 4), (6, 8)]);
        let r = impact_for(&s, 5).unwrap();
        assert_eq!(r.mean_old, 4.0);
        assert_eq!(r.shift_ratio, 1.5);
    }

    #[test]
    fn everything_old_gives_ratio_one() {
        let s = series(&[(1, 3), (2, 5)]);
        assert_eq!(impact_for(&s, 100).unwrap().shift_ratio, 1.0);
    }

    #[test]
    fn negative_baseline_uses_absolute_divisor() {
        // mean_all = (-4 + 2) / 2 = -1, mean_old = -4
        let s = series(&[(1, -4), (2, 2)]);
        let r = impact_for(&s, 1).unwrap();
        assert_eq!(r.shift_ratio, 1.0 + 3.0 / 4.0);
    }

    #[test]
    fn gaps_are_reported_not_computed() {
        assert_eq!(impact_for(&series(&[]), 0), Err(ImpactGap::NoDeltas));
        assert_eq!(
            impact_for(&series(&[(10, 1)]), 5),
            Err(ImpactGap::NoBaseline)
        );
        assert_eq!(
            impact_for(&series(&[(1, 3), (2, -3), (9, 7)]), 2),
            Err(ImpactGap::ZeroBaseline)
        );
    }

    #[test]
    fn tickers_without_baseline_are_left_out() {
        let deltas: TickerMap = [
            ("AAA".to_string(), series(&[(1, 10), (2, 20), (3, 30), (10, 100)])),
            ("NEW".to_string(), series(&[(50, 1), (60, 2)])),
            ("ONE".to_string(), series(&[])),
        ]
        .into_iter()
        .collect();

        let impact = estimate_impact(&deltas, 3);

        assert_eq!(impact.len(), 1);
        assert_eq!(impact["AAA"].shift_ratio, 2.0);
        assert!(!impact.contains_key("NEW"));
        assert!(!impact.contains_key("ONE"));
    }

    #[test]
    fn trailing_cutoff_looks_back_one_interval() {
        let policy = CutoffPolicy::Trailing(Duration::from_secs(20));
        assert_eq!(policy.cutoff_ms(100_000), 80_000);
        assert_eq!(CutoffPolicy::Fixed(42).cutoff_ms(100_000), 42);
    }

    #[test]
    fn trailing_cutoff_saturates() {
        let policy = CutoffPolicy::Trailing(Duration::from_secs(u64::MAX));
        assert_eq!(policy.cutoff_ms(0), -i64::MAX);
    }
}
