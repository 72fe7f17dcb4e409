//! Exit message sink
//!
//! Every phase transition produces one human-readable status line. The
//! line goes to a replaceable handler, which prints to stdout by default.

use crate::error::{Result, ShutdownError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback receiving exit status lines
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Handler that prints `[Exit] <msg>` to stdout
pub fn console_handler() -> MessageHandler {
    Arc::new(|msg: &str| println!("[Exit] {msg}"))
}

/// Handler that forwards status lines to `tracing` at info level
pub fn tracing_handler() -> MessageHandler {
    Arc::new(|msg: &str| tracing::info!(target: "graceful_exit", "{}", msg))
}

/// Status line texts
pub mod messages {
    use crate::lifecycle::ExitSignal;

    /// Emitted when the combined wait starts listening
    pub const WAITING_FOR_SIGNAL: &str = "waiting for exit signal (Ctrl+C / SIGTERM)";

    /// Emitted once, by the caller that wins the drain
    pub const BEGINNING_SHUTDOWN: &str = "beginning shutdown, running cleanup hooks";

    /// Emitted when every hook finished before the deadline
    pub const CLEAN_EXIT: &str = "cleanup finished, exiting cleanly";

    /// Emitted when the deadline passed with hooks still running
    pub const TIMED_OUT: &str = "exit aborted: cleanup timed out";

    pub(crate) fn signal_received(signal: ExitSignal) -> String {
        format!("exit signal received: {signal}")
    }

    pub(crate) fn cleanup_dispatched(count: usize) -> String {
        format!("cleanup dispatched: {count} hook(s)")
    }

    pub(crate) fn hook_panicked(reason: &str) -> String {
        format!("exit hook panicked: {reason}")
    }

    pub(crate) fn dispatch_failed(error: &std::io::Error) -> String {
        format!("exit hook could not be dispatched: {error}")
    }
}

/// Holds the current handler; frozen once draining starts
pub(crate) struct NotificationSink {
    handler: RwLock<MessageHandler>,
    frozen: AtomicBool,
}

impl NotificationSink {
    pub(crate) fn new(handler: MessageHandler) -> Self {
        Self {
            handler: RwLock::new(handler),
            frozen: AtomicBool::new(false),
        }
    }

    pub(crate) fn replace(&self, handler: MessageHandler) -> Result<()> {
        let mut current = self.handler.write().unwrap_or_else(PoisonError::into_inner);
        if self.frozen.load(Ordering::Acquire) {
            return Err(ShutdownError::SinkFrozen);
        }
        *current = handler;
        Ok(())
    }

    /// Stop accepting replacements. Taken under the write lock so a
    /// concurrent `replace` either lands before or is rejected.
    pub(crate) fn freeze(&self) {
        let _current = self.handler.write().unwrap_or_else(PoisonError::into_inner);
        self.frozen.store(true, Ordering::Release);
    }

    pub(crate) fn emit(&self, msg: &str) {
        let handler = {
            let current = self.handler.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(&current)
        };
        handler(msg);
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(console_handler())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (MessageHandler, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let handler: MessageHandler = Arc::new(move |msg: &str| {
            sink_lines.lock().unwrap().push(msg.to_string());
        });
        (handler, lines)
    }

    #[test]
    fn test_replaced_handler_receives_lines() {
        let sink = NotificationSink::default();
        let (handler, lines) = recording();

        sink.replace(handler).unwrap();
        sink.emit("first");
        sink.emit("second");

        assert_eq!(*lines.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_frozen_sink_rejects_replacement() {
        let (original, lines) = recording();
        let sink = NotificationSink::new(original);
        sink.emit("before");
        sink.freeze();

        let (late, late_lines) = recording();
        assert!(matches!(sink.replace(late), Err(ShutdownError::SinkFrozen)));

        sink.emit("after");
        assert_eq!(*lines.lock().unwrap(), vec!["before", "after"]);
        assert!(late_lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handler_may_replace_itself_while_emitting() {
        let sink = Arc::new(NotificationSink::default());
        let (next, lines) = recording();

        let reentrant = Arc::clone(&sink);
        sink.replace(Arc::new(move |_msg: &str| {
            let _ = reentrant.replace(Arc::clone(&next));
        }))
        .unwrap();

        sink.emit("swap");
        sink.emit("recorded");
        assert_eq!(*lines.lock().unwrap(), vec!["recorded"]);
    }

    #[test]
    fn test_message_texts() {
        use crate::lifecycle::ExitSignal;

        assert_eq!(
            messages::signal_received(ExitSignal::Terminate),
            "exit signal received: SIGTERM"
        );
        assert_eq!(messages::cleanup_dispatched(3), "cleanup dispatched: 3 hook(s)");
        assert!(messages::hook_panicked("boom").contains("boom"));
    }
}
