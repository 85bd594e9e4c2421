//! Background task for enforcing file retention.

use narrator_retention::{total_removed, Sweeper};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Sweeps the data directory every `interval` until `shutdown` resolves.
///
/// The first pass runs immediately. A pass already in progress when shutdown
/// arrives is allowed to finish. Returns the number of completed passes.
pub async fn run_retention_loop<F>(sweeper: Sweeper, interval: Duration, shutdown: F) -> usize
where
    F: Future<Output = ()>,
{
    tracing::info!(
        interval_seconds = interval.as_secs(),
        "starting file retention task"
    );

    let sweeper = Arc::new(sweeper);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut passes = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!(passes, "file retention task stopping");
                return passes;
            }
            _ = ticker.tick() => {}
        }

        // Directory walks block; keep them off the runtime threads.
        let sweeper = Arc::clone(&sweeper);
        let result = tokio::task::spawn_blocking(move || sweeper.sweep_all()).await;

        match result {
            Ok(reports) => {
                let removed = total_removed(&reports);
                if removed > 0 {
                    tracing::info!(removed, "removed expired files");
                } else {
                    tracing::debug!("no expired files to remove");
                }
                for (role, report) in &reports {
                    if !report.is_clean() {
                        tracing::error!(
                            ?role,
                            failed = report.failures.len(),
                            "some expired files could not be removed"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "retention sweep panicked or was cancelled");
            }
        }
        passes += 1;
    }
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
