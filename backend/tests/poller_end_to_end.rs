//! Drives the poller against real files with virtual time.
//!
//! Verifies:
//!   • the first cycle runs immediately, later ones on the interval
//!   • lines appended between cycles show up in the next cycle
//!   • the stats file gets one header and one row per ticker per cycle
//!   • a stop request ends the loop without another write

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use market::impact::CutoffPolicy;
use tickdelta::{
    poller::{FailurePolicy, Poller, PollerConfig, PollerState},
    sink::CsvFileSink,
};
use tokio::sync::watch;

fn append(path: &Path, text: &str) {
    let mut f = OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(text.as_bytes()).unwrap();
    f.flush().unwrap();
}

fn config(source: &Path) -> PollerConfig {
    PollerConfig {
        source_path: source.to_path_buf(),
        window_size: 8,
        tail_lines: 80,
        poll_every: Duration::from_secs(20),
        cutoff: CutoffPolicy::Fixed(2_500),
        failure_policy: FailurePolicy::Continue,
    }
}

#[tokio::test(start_paused = true)]
async fn appends_rows_each_cycle_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("ticks.csv");
    let stats = dir.path().join("stats.csv");
    std::fs::write(&source, "AAA,1000,10\nAAA,2000,15\nAAA,3000,12\n").unwrap();

    let mut poller = Poller::new(config(&source), CsvFileSink::new(&stats));
    let (tx, rx) = watch::channel(false);

    let driver = async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        append(&source, "AAA,4000,20\nBBB,4000,1\n");

        tokio::time::sleep(Duration::from_secs(20)).await;
        tx.send(true).unwrap();
    };

    let (result, ()) = tokio::join!(poller.run(rx), driver);

    assert!(result.is_ok());
    assert_eq!(poller.cycles(), 2);
    assert_eq!(poller.state(), PollerState::Stopped);

    let content = std::fs::read_to_string(&stats).unwrap();
    assert_eq!(
        content,
        "ticker,timestamp,mean,median,max,min,mean_delta\n\
         AAA,3000,1.0000,1.0000,5,-3,0.2000\n\
         AAA,4000,3.3333,5.0000,8,-3,0.6667\n"
    );
}

#[tokio::test(start_paused = true)]
async fn unchanged_source_repeats_identical_rows() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("ticks.csv");
    let stats = dir.path().join("stats.csv");
    std::fs::write(&source, "AAA,1000,10\nAAA,2000,15\nAAA,3000,12\n").unwrap();

    let mut poller = Poller::new(config(&source), CsvFileSink::new(&stats));
    let (tx, rx) = watch::channel(false);

    let driver = async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        tx.send(true).unwrap();
    };
    let (result, ()) = tokio::join!(poller.run(rx), driver);
    assert!(result.is_ok());

    let content = std::fs::read_to_string(&stats).unwrap();
    let rows: Vec<&str> = content.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], rows[1]);
}

#[tokio::test(start_paused = true)]
async fn stop_already_requested_runs_no_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("ticks.csv");
    let stats = dir.path().join("stats.csv");
    std::fs::write(&source, "AAA,1000,10\nAAA,2000,15\n").unwrap();

    let mut poller = Poller::new(config(&source), CsvFileSink::new(&stats));
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    poller.run(rx).await.unwrap();

    assert_eq!(poller.cycles(), 0);
    assert!(!stats.exists());
}

#[tokio::test(start_paused = true)]
async fn source_appearing_later_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("ticks.csv");
    let stats = dir.path().join("stats.csv");

    let mut poller = Poller::new(config(&source), CsvFileSink::new(&stats));
    let (tx, rx) = watch::channel(false);

    let driver = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        std::fs::write(&source, "AAA,1000,10\nAAA,2000,15\n").unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        tx.send(true).unwrap();
    };
    let (result, ()) = tokio::join!(poller.run(rx), driver);

    assert!(result.is_ok());
    assert_eq!(poller.cycles(), 2);

    let content = std::fs::read_to_string(&stats).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.ends_with("AAA,2000,5.0000,5.0000,5,5,1.0000\n"));
}
