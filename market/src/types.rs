use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::ParseError;

/// Timestamp (ms since epoch) → integer, ordered by timestamp.
pub type Series = BTreeMap<i64, i64>;

/// One parsed line of the tick log: `<ticker>,<ts_ms>,<value>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickRecord {
    pub ticker: String,
    pub ts_ms: i64,
    pub value: i64,
}

impl TickRecord {
    /// Parses one log line.
    ///
    /// Exactly three comma-separated fields are required. Whitespace around
    /// the numeric fields is tolerated; the ticker is taken verbatim.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.split(',').collect();

        let [ticker, ts, value] = fields.as_slice() else {
            return Err(ParseError::FieldCount(fields.len()));
        };

        let ts_ms = ts
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::Timestamp((*ts).to_string()))?;
        let value = value
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::Value((*value).to_string()))?;

        Ok(Self {
            ticker: (*ticker).to_string(),
            ts_ms,
            value,
        })
    }
}

/// Per-ticker series keyed by ticker, iterated in ticker order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickerMap {
    series: BTreeMap<String, Series>,
}

impl TickerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ticker: &str) -> Option<&Series> {
        self.series.get(ticker)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Series> {
        self.series.iter()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of tickers, including tickers whose series is empty.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub(crate) fn series_mut(&mut self, ticker: &str) -> &mut Series {
        self.series.entry(ticker.to_string()).or_default()
    }

    pub(crate) fn values_mut(&mut self) -> btree_map::ValuesMut<'_, String, Series> {
        self.series.values_mut()
    }
}

impl<'a> IntoIterator for &'a TickerMap {
    type Item = (&'a String, &'a Series);
    type IntoIter = btree_map::Iter<'a, String, Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

impl FromIterator<(String, Series)> for TickerMap {
    fn from_iter<I: IntoIterator<Item = (String, Series)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

/// Most recent ticks per ticker, bounded to the configured window size.
pub type TickWindow = TickerMap;

/// Consecutive differences per ticker. The entry at `t` is
/// `value(t) - value(previous t)`; the earliest tick of a window has none.
pub type DeltaSeries = TickerMap;
