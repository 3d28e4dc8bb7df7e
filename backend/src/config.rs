use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use market::impact::CutoffPolicy;
use market::tail::DEFAULT_TAIL_LINES;

use crate::error::ConfigError;
use crate::poller::{FailurePolicy, PollerConfig};

pub const ENV_WINDOW_SIZE: &str = "TICKDELTA_WINDOW_SIZE";
pub const ENV_POLL_INTERVAL_SECS: &str = "TICKDELTA_POLL_INTERVAL_SECS";
pub const ENV_SOURCE_PATH: &str = "TICKDELTA_SOURCE_PATH";
pub const ENV_OUTPUT_PATH: &str = "TICKDELTA_OUTPUT_PATH";
pub const ENV_TAIL_LINES: &str = "TICKDELTA_TAIL_LINES";
pub const ENV_DEBUG_CUTOFF_MS: &str = "TICKDELTA_DEBUG_CUTOFF_MS";
pub const ENV_FAIL_FAST: &str = "TICKDELTA_FAIL_FAST";

pub const DEFAULT_OUTPUT_PATH: &str = "stats.csv";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    // =========================
    // Source / sink
    // =========================
    /// Append-only tick log (`<ticker>,<ts_ms>,<value>` per line).
    ///
    /// Only ever read, never written. Another process is expected to keep
    /// appending to it while we poll.
    pub source_path: PathBuf,

    /// CSV file receiving one stats row per ticker per cycle.
    pub output_path: PathBuf,

    // =========================
    // Window configuration
    // =========================
    /// Ticks retained per ticker (W). Older ticks in the tail are ignored.
    pub window_size: usize,

    /// Lines recovered from the end of the source each cycle (K).
    ///
    /// Bounds the work per cycle. Must be large enough to cover
    /// `window_size` ticks for every active ticker, otherwise windows come
    /// out shorter than W.
    pub tail_lines: usize,

    // =========================
    // Schedule
    // =========================
    /// Time between the starts of two consecutive cycles.
    ///
    /// Also the lookback of the trailing cutoff used by the mean-shift
    /// heuristic.
    pub poll_interval: Duration,

    /// Fixed cutoff (ms since epoch) for the mean-shift baseline.
    ///
    /// Debug only: when set, the trailing `now - poll_interval` cutoff is
    /// not used at all. Useful when replaying an old log.
    pub debug_cutoff_ms: Option<i64>,

    /// Stop the poller on the first failed cycle instead of logging the
    /// error and retrying on the next tick.
    pub fail_fast: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    ///
    /// Window size, poll interval and source path are required and have no
    /// defaults. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let window_size = positive(
            ENV_WINDOW_SIZE,
            get(ENV_WINDOW_SIZE).ok_or(ConfigError::Missing(ENV_WINDOW_SIZE))?,
        )?;

        let poll_secs: u64 = positive(
            ENV_POLL_INTERVAL_SECS,
            get(ENV_POLL_INTERVAL_SECS).ok_or(ConfigError::Missing(ENV_POLL_INTERVAL_SECS))?,
        )?;

        let source_path =
            PathBuf::from(get(ENV_SOURCE_PATH).ok_or(ConfigError::Missing(ENV_SOURCE_PATH))?);

        let output_path = PathBuf::from(
            get(ENV_OUTPUT_PATH).unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
        );

        let tail_lines = match get(ENV_TAIL_LINES) {
            Some(v) => positive(ENV_TAIL_LINES, v)?,
            None => DEFAULT_TAIL_LINES,
        };

        let debug_cutoff_ms = get(ENV_DEBUG_CUTOFF_MS)
            .map(|v| parse::<i64>(ENV_DEBUG_CUTOFF_MS, v, "expected integer milliseconds"))
            .transpose()?;

        let fail_fast = match get(ENV_FAIL_FAST) {
            Some(v) => flag(ENV_FAIL_FAST, v)?,
            None => false,
        };

        Ok(Self {
            source_path,
            output_path,
            window_size,
            tail_lines,
            poll_interval: Duration::from_secs(poll_secs),
            debug_cutoff_ms,
            fail_fast,
        })
    }

    pub fn cutoff_policy(&self) -> CutoffPolicy {
        match self.debug_cutoff_ms {
            Some(ts_ms) => CutoffPolicy::Fixed(ts_ms),
            None => CutoffPolicy::Trailing(self.poll_interval),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            source_path: self.source_path.clone(),
            window_size: self.window_size,
            tail_lines: self.tail_lines,
            poll_every: self.poll_interval,
            cutoff: self.cutoff_policy(),
            failure_policy: if self.fail_fast {
                FailurePolicy::Stop
            } else {
                FailurePolicy::Continue
            },
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: String, reason: &'static str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { key, value, reason })
}

fn positive<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialOrd,
{
    let reason = "expected a positive integer";
    let n: T = parse(key, value.clone(), reason)?;
    if n <= T::default() {
        return Err(ConfigError::Invalid { key, value, reason });
    }
    Ok(n)
}

fn flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false",
        }),
    }
}
