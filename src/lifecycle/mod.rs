//! Shutdown Lifecycle Module
//!
//! This module coordinates graceful shutdown: subsystems register cleanup
//! hooks while the service runs, and a single exit request (OS signal or
//! explicit trigger) runs every hook exactly once.
//!
//! # Shutdown Phases
//!
//! ```text
//! 1. Idle: on_exit(hook) appends to the registry
//!    ↓
//! 2. Exit request (SIGINT / SIGTERM / trigger_exit_signal)
//!    ↓
//! 3. Draining: registry closed, hooks dispatched last-registered first,
//!    one thread each, panics contained per hook
//!    ↓
//! 4. Completed: last hook returned
//!
//! wait_exit(timeout) returns at 4, or at the deadline if that comes first.
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use graceful_exit::lifecycle::ShutdownCoordinator;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> graceful_exit::Result<()> {
//! let coordinator = Arc::new(ShutdownCoordinator::new());
//!
//! // Registered first, torn down last
//! coordinator.on_exit(|| tracing::info!("Closing database connections"));
//! coordinator.on_exit(|| tracing::info!("Flushing request log"));
//!
//! let report = coordinator.wait_exit(Duration::from_secs(10)).await?;
//! tracing::info!(outcome = %report.outcome, "Shutdown finished");
//! # Ok(())
//! # }
//! ```

mod builder;
mod coordinator;
pub mod global;
mod registry;
mod signal;
mod sink;

pub use builder::CoordinatorBuilder;
pub use coordinator::{
    ExitOutcome, ExitReport, SharedCoordinator, ShutdownCoordinator, ShutdownPhase,
};
pub use registry::Hook;
pub use signal::ExitSignal;
pub use sink::{MessageHandler, console_handler, messages, tracing_handler};
