//! Coordinator Builder
//!
//! Fluent construction of a [`ShutdownCoordinator`].

use super::coordinator::{SharedCoordinator, ShutdownCoordinator};
use super::signal::ExitSignal;
use super::sink::{MessageHandler, console_handler};
use crate::config::ShutdownConfig;
use std::sync::Arc;
use std::time::Duration;

/// Builder for ShutdownCoordinator
///
/// # Example
///
/// ```rust
/// use graceful_exit::{ExitSignal, ShutdownCoordinator, tracing_handler};
/// use std::time::Duration;
///
/// let coordinator = ShutdownCoordinator::builder()
///     .timeout(Duration::from_secs(5))
///     .signals(vec![ExitSignal::Terminate])
///     .message_handler(tracing_handler())
///     .build();
///
/// assert_eq!(coordinator.config().timeout(), Duration::from_secs(5));
/// ```
pub struct CoordinatorBuilder {
    config: ShutdownConfig,
    handler: Option<MessageHandler>,
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: ShutdownConfig::default(),
            handler: None,
        }
    }

    /// Replace all settings
    pub fn config(mut self, config: ShutdownConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the timeout used by `wait_exit_default`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the OS signals to listen for; empty means explicit trigger only
    pub fn signals(mut self, signals: Vec<ExitSignal>) -> Self {
        self.config.signals = signals;
        self
    }

    /// Set the exit message handler (stdout if not set)
    pub fn message_handler(mut self, handler: MessageHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> ShutdownCoordinator {
        let handler = self.handler.unwrap_or_else(console_handler);
        ShutdownCoordinator::from_parts(self.config, handler)
    }

    pub fn build_shared(self) -> SharedCoordinator {
        Arc::new(self.build())
    }
}
