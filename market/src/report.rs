use std::collections::BTreeMap;

use crate::impact::ImpactRecord;
use crate::stats::DeltaSummary;
use crate::types::DeltaSeries;

/// Written in place of the shift ratio when it is undefined.
pub const NOT_AVAILABLE: &str = "N/A";

/// Column names of the stats file, in order.
pub const STATS_HEADER: [&str; 7] = [
    "ticker",
    "timestamp",
    "mean",
    "median",
    "max",
    "min",
    "mean_delta",
];

/// One stats row: a ticker's deltas for one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub ticker: String,

    /// Latest delta timestamp of the ticker in this cycle.
    pub ts_ms: i64,

    pub summary: DeltaSummary,

    /// `None` when the mean-shift heuristic is undefined for the ticker.
    pub shift_ratio: Option<f64>,
}

impl ReportRow {
    /// Fields in [`STATS_HEADER`] order, formatted for the stats file.
    pub fn fields(&self) -> [String; 7] {
        [
            self.ticker.clone(),
            self.ts_ms.to_string(),
            fmt_4dp(self.summary.mean),
            fmt_4dp(self.summary.median),
            self.summary.max.to_string(),
            self.summary.min.to_string(),
            self.shift_ratio_field(),
        ]
    }

    pub fn shift_ratio_field(&self) -> String {
        self.shift_ratio
            .map(fmt_4dp)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

pub fn fmt_4dp(v: f64) -> String {
    format!("{v:.4}")
}

/// One row per ticker with at least one delta, in ticker order.
pub fn build_rows(deltas: &DeltaSeries, impact: &BTreeMap<String, ImpactRecord>) -> Vec<ReportRow> {
    deltas
        .iter()
        .filter_map(|(ticker, series)| {
            let (&ts_ms, _) = series.last_key_value()?;
            let values: Vec<i64> = series.values().copied().collect();
            let summary = DeltaSummary::from_values(&values)?;

            Some(ReportRow {
                ticker: ticker.clone(),
                ts_ms,
                summary,
                shift_ratio: impact.get(ticker).map(|r| r.shift_ratio),
            })
        })
        .collect()
}
