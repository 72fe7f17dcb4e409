//! Process-wide coordinator
//!
//! Free functions over a single lazily created [`ShutdownCoordinator`],
//! for code that can't thread a handle through. Prefer passing a
//! [`SharedCoordinator`] explicitly where possible.

use super::coordinator::{ExitReport, SharedCoordinator, ShutdownCoordinator};
use super::sink::MessageHandler;
use crate::config::ShutdownConfig;
use crate::error::Result;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

static GLOBAL_COORDINATOR: OnceLock<SharedCoordinator> = OnceLock::new();

/// Install the process-wide coordinator
///
/// Only the first call wins; later calls get their handle back as `Err`.
/// Must happen before anything calls [`global`].
pub fn install_global(
    coordinator: SharedCoordinator,
) -> std::result::Result<(), SharedCoordinator> {
    GLOBAL_COORDINATOR.set(coordinator)
}

/// Retrieve the process-wide coordinator, creating it on first use
///
/// A lazily created coordinator reads its settings from the environment
/// and falls back to defaults if they are invalid.
pub fn global() -> &'static SharedCoordinator {
    GLOBAL_COORDINATOR.get_or_init(|| {
        let config = ShutdownConfig::from_env().unwrap_or_else(|e| {
            tracing::warn!("Invalid shutdown configuration, using defaults: {}", e);
            ShutdownConfig::default()
        });
        Arc::new(ShutdownCoordinator::with_config(config))
    })
}

/// Register a hook on the process-wide coordinator
///
/// # Panics
///
/// Panics if shutdown has already begun.
pub fn on_exit<F>(hook: F)
where
    F: FnOnce() + Send + 'static,
{
    global().on_exit(hook);
}

pub fn trigger_exit_signal() -> bool {
    global().trigger_exit_signal()
}

pub fn execute_shutdown_hooks() -> bool {
    global().execute_shutdown_hooks()
}

pub fn set_exit_message_handler(handler: MessageHandler) -> Result<()> {
    global().set_exit_message_handler(handler)
}

pub async fn wait_exit(timeout: Duration) -> Result<ExitReport> {
    global().wait_exit(timeout).await
}
