//! Real SIGTERM delivery. Lives in its own test binary: the signal goes
//! to the whole process.
#![cfg(unix)]

use graceful_exit::{ExitOutcome, ExitSignal, ShutdownCoordinator};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sigterm_runs_hooks() {
    let coordinator = ShutdownCoordinator::builder()
        .signals(vec![ExitSignal::Terminate])
        .message_handler(Arc::new(|msg: &str| eprintln!("[test] {msg}")))
        .build();

    let cleaned = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cleaned);
    coordinator.on_exit(move || flag.store(true, Ordering::SeqCst));

    // Listener must exist before the signal is sent
    coordinator.listen_for_os_signals().await.unwrap();

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator.wait_exit(Duration::from_secs(2)),
    )
    .await
    .expect("signal never arrived")
    .unwrap();

    assert_eq!(report.signal, ExitSignal::Terminate);
    assert_eq!(report.outcome, ExitOutcome::Clean);
    assert!(cleaned.load(Ordering::SeqCst));
}
