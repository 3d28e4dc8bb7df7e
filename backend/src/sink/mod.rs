//! Destinations for stats rows.

mod csv_file;

pub use csv_file::CsvFileSink;

use market::report::ReportRow;

use crate::error::SinkError;

/// Append-only destination for one cycle's rows.
///
/// Rows already handed to a sink are never rewritten.
pub trait ReportSink {
    /// Appends `rows` and returns how many were written.
    fn append(&mut self, rows: &[ReportRow]) -> Result<usize, SinkError>;
}
