//! # Graceful Exit
//!
//! Once-only, timeout-bounded shutdown hooks for Rust services.
//!
//! Subsystems register cleanup callbacks while the service runs. When the
//! process receives SIGINT/SIGTERM, or code asks for shutdown explicitly,
//! every callback runs exactly once, on its own thread, last-registered
//! first. A panicking callback is reported and contained. The caller
//! waits for all of them up to a deadline and is told whether the exit
//! was clean or timed out.
//!
//! ## Features
//!
//! - **Exactly once**: any number of triggers, from any number of threads,
//!   run the hooks a single time
//! - **Reverse order dispatch**: dependents are torn down before what they
//!   depend on
//! - **Failure isolation**: one panicking hook never stops its siblings
//! - **Bounded wait**: a hung hook costs at most the timeout
//! - **Pluggable status sink**: stdout by default, `tracing` or anything else
//!   on request
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graceful_exit::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> graceful_exit::Result<()> {
//!     let coordinator = ShutdownCoordinator::builder()
//!         .message_handler(tracing_handler())
//!         .build_shared();
//!
//!     coordinator.on_exit(|| println!("closing connection pool"));
//!     coordinator.on_exit(|| println!("flushing metrics"));
//!
//!     // Last statement of main: wait for Ctrl+C / SIGTERM, then clean up
//!     let report = coordinator.wait_exit(Duration::from_secs(10)).await?;
//!     println!("exit {} after {:?}", report.outcome, report.elapsed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;

// Re-export core types
pub use config::{ConfigService, ShutdownConfig};
pub use error::{Result, ShutdownError};
pub use lifecycle::{
    CoordinatorBuilder, ExitOutcome, ExitReport, ExitSignal, Hook, MessageHandler,
    SharedCoordinator, ShutdownCoordinator, ShutdownPhase, console_handler, tracing_handler,
};

/// Prelude module for convenient imports
///
/// ```
/// use graceful_exit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, ShutdownConfig};
    pub use crate::error::{Result, ShutdownError};
    pub use crate::lifecycle::{
        CoordinatorBuilder, ExitOutcome, ExitReport, ExitSignal, MessageHandler,
        SharedCoordinator, ShutdownCoordinator, ShutdownPhase, console_handler, tracing_handler,
    };
    pub use std::sync::Arc;
}
