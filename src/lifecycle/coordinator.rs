//! Shutdown Coordinator
//!
//! Waits for an exit request, runs every registered hook exactly once on
//! its own thread, and bounds the wait for them with a timeout.

use super::messages;
use super::registry::{Hook, HookRegistry};
use super::signal::{ExitSignal, TriggerSource};
use super::sink::{MessageHandler, NotificationSink};
use super::CoordinatorBuilder;
use crate::config::ShutdownConfig;
use crate::error::{Result, ShutdownError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strum_macros::{AsRefStr, Display};
use tokio::sync::watch;

/// Shared handle to a shutdown coordinator
pub type SharedCoordinator = Arc<ShutdownCoordinator>;

/// Lifecycle of a coordinator. Moves forward only, once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ShutdownPhase {
    /// Accepting hooks, nothing requested yet
    Idle = 0,
    /// Hooks dispatched, some may still be running
    Draining = 1,
    /// Every dispatched hook has returned or panicked
    Completed = 2,
}

impl ShutdownPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ShutdownPhase::Idle,
            1 => ShutdownPhase::Draining,
            _ => ShutdownPhase::Completed,
        }
    }
}

/// How the completion wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOutcome {
    /// All hooks finished before the deadline
    #[strum(to_string = "clean")]
    Clean,
    /// The deadline passed first; remaining hooks keep running detached
    #[strum(to_string = "timed out")]
    TimedOut,
}

/// Summary of one `wait_exit` call
#[derive(Debug, Clone, Serialize)]
pub struct ExitReport {
    /// What started the shutdown
    pub signal: ExitSignal,
    /// Whether hooks finished in time
    pub outcome: ExitOutcome,
    /// When the exit signal was received
    pub started_at: DateTime<Utc>,
    /// Time from signal receipt to the end of the wait
    pub elapsed: Duration,
}

/// State touched by hook threads after dispatch
struct DrainState {
    sink: NotificationSink,
    phase: AtomicU8,
    phase_tx: watch::Sender<ShutdownPhase>,
    pending: AtomicUsize,
}

impl DrainState {
    fn phase(&self) -> ShutdownPhase {
        ShutdownPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn complete(&self) {
        self.phase.store(ShutdownPhase::Completed as u8, Ordering::Release);
        self.phase_tx.send_replace(ShutdownPhase::Completed);
        tracing::debug!("All exit hooks finished");
    }
}

/// One unit of Pending-Count, released on drop
struct PendingGuard {
    state: Arc<DrainState>,
}

impl PendingGuard {
    fn acquire(state: &Arc<DrainState>) -> Self {
        state.pending.fetch_add(1, Ordering::AcqRel);
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.state.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.complete();
        }
    }
}

/// Coordinates once-only, timeout-bounded execution of cleanup hooks
///
/// Hooks registered with [`on_exit`](Self::on_exit) run in **reverse
/// order** of registration, each on its own thread, when shutdown starts.
/// A panicking hook is reported through the exit message handler and
/// never affects its siblings.
///
/// # Example
///
/// ```rust,no_run
/// use graceful_exit::ShutdownCoordinator;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> graceful_exit::Result<()> {
///     let coordinator = ShutdownCoordinator::new();
///     coordinator.on_exit(|| println!("closing database pool"));
///
///     // Blocks until Ctrl+C / SIGTERM, then runs the hooks
///     let report = coordinator.wait_exit(Duration::from_secs(5)).await?;
///     println!("shutdown {}", report.outcome);
///     Ok(())
/// }
/// ```
pub struct ShutdownCoordinator {
    config: ShutdownConfig,
    registry: HookRegistry,
    trigger: TriggerSource,
    state: Arc<DrainState>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Create a coordinator with default settings and a console handler
    pub fn new() -> Self {
        Self::with_config(ShutdownConfig::default())
    }

    /// Create a coordinator from explicit settings
    pub fn with_config(config: ShutdownConfig) -> Self {
        Self::from_parts(config, super::console_handler())
    }

    /// Create a new shared coordinator wrapped in [`Arc`]
    pub fn shared() -> SharedCoordinator {
        Arc::new(Self::new())
    }

    /// Create a new builder
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    pub(crate) fn from_parts(config: ShutdownConfig, handler: MessageHandler) -> Self {
        let (phase_tx, _) = watch::channel(ShutdownPhase::Idle);
        Self {
            trigger: TriggerSource::new(config.signals.clone()),
            config,
            registry: HookRegistry::new(),
            state: Arc::new(DrainState {
                sink: NotificationSink::new(handler),
                phase: AtomicU8::new(ShutdownPhase::Idle as u8),
                phase_tx,
                pending: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }

    pub fn phase(&self) -> ShutdownPhase {
        self.state.phase()
    }

    /// Number of hooks waiting in the registry
    pub fn registered_hooks(&self) -> usize {
        self.registry.len()
    }

    /// Number of dispatched hooks that have not finished yet
    pub fn pending_hooks(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Receiver observing every phase change
    pub fn subscribe(&self) -> watch::Receiver<ShutdownPhase> {
        self.state.phase_tx.subscribe()
    }

    /// Resolves once draining has started. Returns immediately if it has.
    pub async fn shutdown_started(&self) {
        let mut phase_rx = self.subscribe();
        let _ = phase_rx
            .wait_for(|phase| *phase != ShutdownPhase::Idle)
            .await;
    }

    /// Register a cleanup hook
    ///
    /// # Panics
    ///
    /// Panics if shutdown has already begun. Registering cleanup after
    /// the drain is a lifecycle bug; use [`try_on_exit`](Self::try_on_exit)
    /// to handle it instead.
    pub fn on_exit<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = self.try_on_exit(hook) {
            tracing::error!("Rejected exit hook: {}", e);
            panic!("{e}");
        }
    }

    /// Register a cleanup hook, failing if shutdown has already begun
    pub fn try_on_exit<F>(&self, hook: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.registry.register(Box::new(hook))
    }

    /// Replace the exit message handler
    ///
    /// Only effective before shutdown begins; afterwards the handler is
    /// frozen and this returns [`ShutdownError::SinkFrozen`].
    pub fn set_exit_message_handler(&self, handler: MessageHandler) -> Result<()> {
        self.state.sink.replace(handler)
    }

    /// Request shutdown without an OS signal
    ///
    /// Returns false if a request is already queued and not yet consumed.
    pub fn trigger_exit_signal(&self) -> bool {
        self.trigger.trigger(ExitSignal::Requested)
    }

    /// Install OS signal listeners now instead of on the first wait
    pub async fn listen_for_os_signals(&self) -> Result<()> {
        self.trigger.listen().await
    }

    /// Drain the registry and dispatch every hook, once per coordinator
    ///
    /// Safe to call from any number of threads. Only the caller that moves
    /// the phase from `Idle` to `Draining` dispatches hooks, and only that
    /// caller gets `true`. Does not wait for hooks to finish.
    pub fn execute_shutdown_hooks(&self) -> bool {
        if self
            .state
            .phase
            .compare_exchange(
                ShutdownPhase::Idle as u8,
                ShutdownPhase::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!("Exit hooks already executed, ignoring repeated request");
            return false;
        }

        self.state.sink.freeze();
        self.state.phase_tx.send_replace(ShutdownPhase::Draining);
        self.state.sink.emit(messages::BEGINNING_SHUTDOWN);

        // Held until every hook is handed off so the count can't reach
        // zero while dispatch is still running.
        let dispatcher = PendingGuard::acquire(&self.state);

        let hooks = self.registry.drain();
        let count = hooks.len();
        tracing::info!(hooks = count, "Dispatching exit hooks");

        for (position, hook) in hooks.into_iter().enumerate() {
            self.dispatch(position, hook);
        }

        self.state.sink.emit(&messages::cleanup_dispatched(count));
        drop(dispatcher);
        true
    }

    fn dispatch(&self, position: usize, hook: Hook) {
        let guard = PendingGuard::acquire(&self.state);
        let state = Arc::clone(&self.state);

        // On spawn failure the closure is dropped, and the guard with it.
        let spawned = thread::Builder::new()
            .name(format!("exit-hook-{position}"))
            .spawn(move || {
                let _guard = guard;
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(hook)) {
                    let reason = panic_message(payload.as_ref());
                    tracing::error!(position, %reason, "Exit hook panicked");
                    state.sink.emit(&messages::hook_panicked(&reason));
                }
            });

        if let Err(e) = spawned {
            tracing::error!(position, error = %e, "Failed to spawn exit hook thread");
            self.state.sink.emit(&messages::dispatch_failed(&e));
        }
    }

    /// Wait until every dispatched hook finishes or `timeout` elapses
    ///
    /// Hooks still running at the deadline are not cancelled. If shutdown
    /// was never started this waits out the full timeout.
    pub async fn wait_for_completion(&self, timeout: Duration) -> ExitOutcome {
        let mut phase_rx = self.subscribe();
        let finished = matches!(
            tokio::time::timeout(
                timeout,
                phase_rx.wait_for(|phase| *phase == ShutdownPhase::Completed),
            )
            .await,
            Ok(Ok(_))
        );

        if finished {
            self.state.sink.emit(messages::CLEAN_EXIT);
            ExitOutcome::Clean
        } else {
            tracing::warn!(
                pending = self.pending_hooks(),
                timeout_ms = timeout.as_millis() as u64,
                "Exit hooks did not finish before the deadline"
            );
            self.state.sink.emit(messages::TIMED_OUT);
            ExitOutcome::TimedOut
        }
    }

    /// Wait for an exit signal, run the hooks, and wait for them
    ///
    /// Intended as the last statement of a service's main path. Emits one
    /// status line per phase: waiting, signal received, beginning
    /// shutdown, cleanup dispatched, then clean exit or timed out.
    pub async fn wait_exit(&self, timeout: Duration) -> Result<ExitReport> {
        self.state.sink.emit(messages::WAITING_FOR_SIGNAL);
        let signal = self.trigger.recv().await?;

        let started_at = Utc::now();
        let started = Instant::now();
        tracing::info!(%signal, "Received exit signal");
        self.state.sink.emit(&messages::signal_received(signal));

        self.execute_shutdown_hooks();
        let outcome = self.wait_for_completion(timeout).await;

        Ok(ExitReport {
            signal,
            outcome,
            started_at,
            elapsed: started.elapsed(),
        })
    }

    /// [`wait_exit`](Self::wait_exit) with the configured timeout
    pub async fn wait_exit_default(&self) -> Result<ExitReport> {
        self.wait_exit(self.config.timeout()).await
    }

    /// Blocking [`wait_exit`](Self::wait_exit) for synchronous callers
    ///
    /// Builds a private current-thread runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime.
    pub fn wait_exit_blocking(&self, timeout: Duration) -> Result<ExitReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ShutdownError::Runtime)?;
        runtime.block_on(self.wait_exit(timeout))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
