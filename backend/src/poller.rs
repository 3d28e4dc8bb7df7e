//! Tick Log Poller
//!
//! Periodically reads the tail of the tick log, rebuilds the per-ticker
//! windows from scratch, derives deltas, summary statistics and the
//! mean-shift ratio, and appends one stats row per ticker to the sink.
//!
//! Data flow per cycle:
//! Tick log → TailReader → WindowBuilder → deltas → impact → rows → ReportSink
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──run()──▶ Running ──stop signal──▶ Stopped
//!                    │
//!                    └── cycle error + FailurePolicy::Stop ──▶ Stopped (Err)
//! ```
//!
//! The stop channel is observed while waiting for the next tick and at two
//! checkpoints inside a cycle: before the source is read and before rows
//! are handed to the sink. A stop seen at a checkpoint abandons the cycle
//! without writing anything.

use std::path::PathBuf;
use std::time::Duration;

use common::logger::{TraceId, cycle_span, warn_if_slow};
use market::impact::CutoffPolicy;
use market::pipeline::compute_rows;
use market::tail::TailReader;
use market::window::WindowBuilder;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::error::CycleError;
use crate::sink::ReportSink;

/// What to do when a cycle fails (source unreadable, sink unwritable).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the error and try again on the next tick.
    #[default]
    Continue,

    /// Stop the poller and return the error.
    Stop,
}

/// Immutable settings handed to the poller at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct PollerConfig {
    pub source_path: PathBuf,
    pub window_size: usize,
    pub tail_lines: usize,
    pub poll_every: Duration,
    pub cutoff: CutoffPolicy,
    pub failure_policy: FailurePolicy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    Stopped,
}

/// Counters for one completed cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub lines_read: usize,
    pub tickers: usize,
    pub rows_written: usize,
    pub rows_without_ratio: usize,
    pub malformed_numeric: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleStatus {
    Completed(CycleReport),

    /// A stop was requested at a checkpoint; nothing was written.
    Cancelled,
}

pub struct Poller<S> {
    cfg: PollerConfig,
    reader: TailReader,
    window: WindowBuilder,
    sink: S,
    state: PollerState,
    cycles: u64,
    clock: fn() -> i64,
}

impl<S: ReportSink> Poller<S> {
    pub fn new(cfg: PollerConfig, sink: S) -> Self {
        Self {
            reader: TailReader::new(cfg.tail_lines),
            window: WindowBuilder::new(cfg.window_size),
            cfg,
            sink,
            state: PollerState::Idle,
            cycles: 0,
            clock: crate::time::now_ms,
        }
    }

    /// Replaces the wall clock used for the trailing cutoff.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Cycles attempted so far, including failed and cancelled ones.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs cycles every `poll_every` until `stop` turns `true` or its
    /// sender is dropped.
    ///
    /// The first cycle starts immediately. A cycle that overruns the
    /// interval causes the missed ticks to be skipped, not replayed.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<(), CycleError> {
        self.state = PollerState::Running;

        info!(
            source = %self.cfg.source_path.display(),
            every_ms = self.cfg.poll_every.as_millis() as u64,
            window_size = self.cfg.window_size,
            tail_lines = self.cfg.tail_lines,
            cutoff = ?self.cfg.cutoff,
            failure_policy = ?self.cfg.failure_policy,
            "tick log poller started"
        );

        let mut ticker = interval(self.cfg.poll_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if stop_requested(&stop) {
                break;
            }

            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.cycles += 1;
            let span = cycle_span(self.cycles, &TraceId::default());
            let budget = self.cfg.poll_every;

            let result = span.in_scope(|| warn_if_slow("poll_cycle", budget, || self.run_cycle(&stop)));

            match result {
                Ok(CycleStatus::Completed(report)) => {
                    let _g = span.enter();
                    info!(
                        lines_read = report.lines_read,
                        tickers = report.tickers,
                        rows_written = report.rows_written,
                        rows_without_ratio = report.rows_without_ratio,
                        "cycle completed"
                    );
                }
                Ok(CycleStatus::Cancelled) => {
                    let _g = span.enter();
                    info!("cycle abandoned: stop requested");
                    break;
                }
                Err(e) => {
                    let _g = span.enter();
                    error!(error = %e, "cycle failed");

                    if self.cfg.failure_policy == FailurePolicy::Stop {
                        self.state = PollerState::Stopped;
                        return Err(e);
                    }
                }
            }
        }

        self.state = PollerState::Stopped;
        info!(cycles = self.cycles, "tick log poller stopped");

        Ok(())
    }

    /// One pass of tail read → window → deltas → impact → sink.
    pub fn run_cycle(&mut self, stop: &watch::Receiver<bool>) -> Result<CycleStatus, CycleError> {
        let cutoff_ms = self.cfg.cutoff.cutoff_ms((self.clock)());

        if stop_requested(stop) {
            return Ok(CycleStatus::Cancelled);
        }

        let lines = self.reader.read_path(&self.cfg.source_path)?;
        let out = compute_rows(&lines, self.window, cutoff_ms);

        if out.malformed_numeric > 0 {
            debug!(
                lines = out.malformed_numeric,
                "skipped lines with non-integer fields"
            );
        }

        for row in &out.rows {
            debug!(
                ticker = %row.ticker,
                ts_ms = row.ts_ms,
                deltas = row.summary.count,
                mean = row.summary.mean,
                median = row.summary.median,
                p5 = row.summary.p5,
                p95 = row.summary.p95,
                shift_ratio = ?row.shift_ratio,
                cutoff_ms,
                "ticker stats"
            );
        }

        if out.rows.is_empty() && !lines.is_empty() {
            warn!(
                lines_read = lines.len(),
                "no ticker has two ticks in the tail; nothing to report"
            );
        }

        if stop_requested(stop) {
            return Ok(CycleStatus::Cancelled);
        }

        let rows_written = self.sink.append(&out.rows)?;

        Ok(CycleStatus::Completed(CycleReport {
            lines_read: lines.len(),
            tickers: out.tickers,
            rows_written,
            rows_without_ratio: out.rows_without_ratio(),
            malformed_numeric: out.malformed_numeric,
        }))
    }
}

fn stop_requested(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow()
}
