use crate::error::ParseError;
use crate::types::{Series, TickRecord, TickWindow};

/// Ticks kept per ticker unless configured otherwise.
pub const DEFAULT_WINDOW_SIZE: usize = 8;

/// Result of folding raw lines into a window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuiltWindow {
    pub window: TickWindow,

    /// Lines that had three fields but a timestamp or value that is not an
    /// integer. Lines with any other field count are not counted.
    pub malformed_numeric: usize,
}

/// Groups raw log lines by ticker and keeps the most recent ticks of each.
#[derive(Clone, Copy, Debug)]
pub struct WindowBuilder {
    window_size: usize,
}

impl Default for WindowBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl WindowBuilder {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Lines are applied in order, so a repeated timestamp for the same
    /// ticker keeps the value of the later line.
    pub fn build<I, S>(&self, lines: I) -> BuiltWindow
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = BuiltWindow::default();

        for line in lines {
            match TickRecord::parse(line.as_ref()) {
                Ok(tick) => {
                    out.window
                        .series_mut(&tick.ticker)
                        .insert(tick.ts_ms, tick.value);
                }
                Err(ParseError::FieldCount(_)) => {}
                Err(ParseError::Timestamp(_) | ParseError::Value(_)) => {
                    out.malformed_numeric += 1;
                }
            }
        }

        for series in out.window.values_mut() {
            retain_recent(series, self.window_size);
        }

        out
    }
}

/// Keeps the `n` largest timestamps. Timestamps are unique map keys, so the
/// cut point is always well defined.
fn retain_recent(series: &mut Series, n: usize) {
    if series.len() <= n {
        return;
    }
    if n == 0 {
        series.clear();
        return;
    }

    if let Some(&cut) = series.keys().nth_back(n - 1) {
        *series = series.split_off(&cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_lines_by_ticker() {
        let built = WindowBuilder::default().build([
            "AAA,1000,10",
            "BBB,1000,7",
            "AAA,2000,15",
        ]);

        let aaa: Vec<_> = built.window.get("AAA").unwrap().iter().collect();
        let bbb: Vec<_> = built.window.get("BBB").unwrap().iter().collect();
        assert_eq!(aaa, vec![(&1000, &10), (&2000, &15)]);
        assert_eq!(bbb, vec![(&1000, &7)]);
    }

    #[test]
    fn wrong_field_counts_are_skipped_silently() {
        let built = WindowBuilder::default().build(["", "AAA,1000", "AAA,1000,1,2", "header"]);

        assert!(built.window.is_empty());
        assert_eq!(built.malformed_numeric, 0);
    }

    #[test]
    fn non_numeric_fields_are_skipped_and_counted() {
        let built = WindowBuilder::default().build([
            "ticker,timestamp,value",
            "AAA,1000,10",
        ]);

        assert_eq!(built.window.len(), 1);
        assert_eq!(built.malformed_numeric, 1);
    }

    #[test]
    fn keeps_only_the_most_recent_timestamps() {
        let lines: Vec<String> = (1..=20).map(|i| format!("AAA,{},{}", i * 1000, i)).collect();
        let built = WindowBuilder::new(8).build(&lines);

        let kept: Vec<i64> = built.window.get("AAA").unwrap().keys().copied().collect();
        assert_eq!(kept, (13..=20).map(|i| i * 1000).collect::<Vec<_>>());
    }

    #[test]
    fn truncation_uses_timestamp_order_not_line_order() {
        let built = WindowBuilder::new(2).build(["AAA,3000,3", "AAA,1000,1", "AAA,2000,2"]);

        let kept: Vec<i64> = built.window.get("AAA").unwrap().keys().copied().collect();
        assert_eq!(kept, vec![2000, 3000]);
    }

    #[test]
    fn later_duplicate_timestamp_wins() {
        let built = WindowBuilder::default().build(["AAA,1000,1", "AAA,1000,9"]);
        assert_eq!(built.window.get("AAA").unwrap().get(&1000), Some(&9));
    }

    #[test]
    fn zero_window_keeps_tickers_but_no_ticks() {
        let built = WindowBuilder::new(0).build(["AAA,1000,1"]);
        assert!(built.window.get("AAA").unwrap().is_empty());
    }
}
