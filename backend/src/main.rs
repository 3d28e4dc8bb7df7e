use anyhow::Context;
use common::logger::{LogFormat, init_logger};
use tickdelta::{config::AppConfig, poller::Poller, sink::CsvFileSink};
use tokio::sync::watch;

/// Flips the stop channel on Ctrl-C.
///
/// The sender is kept alive even if the signal handler cannot be installed,
/// so the poller keeps running instead of treating that as a stop.
fn spawn_interrupt_listener(stop_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Loop interrupted by user.");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for interrupt signal");
                std::future::pending::<()>().await;
                drop(stop_tx);
            }
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let app_env = std::env::var("APP_ENV").ok();
    init_logger("tickdelta", LogFormat::from_app_env(app_env.as_deref()));

    tracing::info!("Starting tickdelta...");

    let cfg = AppConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        source = %cfg.source_path.display(),
        output = %cfg.output_path.display(),
        "configuration loaded"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    spawn_interrupt_listener(stop_tx);

    let sink = CsvFileSink::new(cfg.output_path.clone());
    let mut poller = Poller::new(cfg.poller_config(), sink);

    poller
        .run(stop_rx)
        .await
        .context("tick log poller stopped on a failed cycle")?;

    tracing::info!("Shutdown complete");

    Ok(())
}
