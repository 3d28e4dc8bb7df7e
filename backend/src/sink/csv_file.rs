use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use market::report::{ReportRow, STATS_HEADER, fmt_4dp};
use serde::Serialize;

use super::ReportSink;
use crate::error::SinkError;

/// Stats file on disk, opened in append mode once per cycle.
#[derive(Clone, Debug)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialized form of a [`ReportRow`]; field order follows `STATS_HEADER`.
#[derive(Serialize)]
struct CsvRow<'a> {
    ticker: &'a str,
    timestamp: i64,
    mean: String,
    median: String,
    max: i64,
    min: i64,
    mean_delta: String,
}

impl<'a> From<&'a ReportRow> for CsvRow<'a> {
    fn from(row: &'a ReportRow) -> Self {
        Self {
            ticker: &row.ticker,
            timestamp: row.ts_ms,
            mean: fmt_4dp(row.summary.mean),
            median: fmt_4dp(row.summary.median),
            max: row.summary.max,
            min: row.summary.min,
            mean_delta: row.shift_ratio_field(),
        }
    }
}

impl ReportSink for CsvFileSink {
    /// The header is written only when the file is empty. Each row is
    /// flushed on its own so an interrupted process leaves whole records.
    fn append(&mut self, rows: &[ReportRow]) -> Result<usize, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::Open {
                path: self.path.clone(),
                source,
            })?;

        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_empty {
            writer.write_record(STATS_HEADER)?;
            writer.flush()?;
        }

        for row in rows {
            writer.serialize(CsvRow::from(row))?;
            writer.flush()?;
        }

        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market::stats::DeltaSummary;

    fn row(ticker: &str, ts_ms: i64, deltas: &[i64], ratio: Option<f64>) -> ReportRow {
        ReportRow {
            ticker: ticker.into(),
            ts_ms,
            summary: DeltaSummary::from_values(deltas).unwrap(),
            shift_ratio: ratio,
        }
    }

    #[test]
    fn header_once_then_rows_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let mut sink = CsvFileSink::new(&path);

        sink.append(&[row("AAA", 3000, &[5, -3], None)]).unwrap();
        sink.append(&[row("AAA", 4000, &[5, -3, 4], Some(2.0))]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "ticker,timestamp,mean,median,max,min,mean_delta\n\
             AAA,3000,1.0000,1.0000,5,-3,N/A\n\
             AAA,4000,2.0000,4.0000,5,-3,2.0000\n"
        );
    }

    #[test]
    fn existing_content_is_never_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "previous,run\n").unwrap();

        CsvFileSink::new(&path)
            .append(&[row("BBB", 1, &[1], Some(1.0))])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "previous,run\nBBB,1,1.0000,1.0000,1,1,1.0000\n");
    }

    #[test]
    fn empty_cycle_still_initialises_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");

        assert_eq!(CsvFileSink::new(&path).append(&[]).unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ticker,timestamp,mean,median,max,min,mean_delta\n"
        );
    }

    #[test]
    fn unwritable_location_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("stats.csv");

        let err = CsvFileSink::new(path).append(&[]).unwrap_err();
        assert!(matches!(err, SinkError::Open { .. }));
    }
}
