use graceful_exit::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    // SHUTDOWN_TIMEOUT_MS / SHUTDOWN_SIGNALS
    let config = ShutdownConfig::from_env()?;
    let coordinator = ShutdownCoordinator::builder()
        .config(config)
        .message_handler(tracing_handler())
        .build_shared();

    let processed = Arc::new(AtomicU64::new(0));

    let worker = {
        let coordinator = Arc::clone(&coordinator);
        let processed = Arc::clone(&processed);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(500));
            loop {
                tokio::select! {
                    _ = coordinator.shutdown_started() => break,
                    _ = ticker.tick() => {
                        let job = processed.fetch_add(1, Ordering::SeqCst) + 1;
                        tracing::debug!(job, "Processed job");
                    }
                }
            }
            tracing::info!("Worker loop stopped");
        })
    };

    coordinator.on_exit(|| {
        tracing::info!("Closing job queue connection");
    });

    let journal = Arc::clone(&processed);
    coordinator.on_exit(move || {
        // Simulated flush
        std::thread::sleep(Duration::from_millis(200));
        tracing::info!(
            processed = journal.load(Ordering::SeqCst),
            "Flushed job journal"
        );
    });

    tracing::info!("Worker running, press Ctrl+C to stop");
    let report = coordinator.wait_exit_default().await?;
    worker.await?;

    tracing::info!(report = %serde_json::to_string(&report)?, "Exit report");
    Ok(())
}
