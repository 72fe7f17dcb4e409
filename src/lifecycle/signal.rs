//! Exit Trigger Source
//!
//! OS signals and explicit programmatic requests both land in one
//! single-slot channel, so whatever consumes an [`ExitSignal`] never
//! needs to know where it came from.

use crate::error::{Result, ShutdownError};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use strum_macros::{Display, EnumString};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, OnceCell};

/// Origin of an exit request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExitSignal {
    /// Process interrupt (SIGINT / Ctrl+C)
    #[strum(to_string = "SIGINT", serialize = "interrupt")]
    #[serde(alias = "SIGINT", alias = "sigint")]
    Interrupt,

    /// Process terminate (SIGTERM)
    #[strum(to_string = "SIGTERM", serialize = "terminate")]
    #[serde(alias = "SIGTERM", alias = "sigterm")]
    Terminate,

    /// Explicit call to `trigger_exit_signal`
    #[strum(to_string = "requested")]
    Requested,
}

impl ExitSignal {
    /// Whether this signal is delivered by the operating system
    pub fn is_os_signal(&self) -> bool {
        !matches!(self, ExitSignal::Requested)
    }
}

struct SignalChannel {
    tx: mpsc::Sender<ExitSignal>,
    rx: Mutex<mpsc::Receiver<ExitSignal>>,
}

impl SignalChannel {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

/// Funnels OS signals and explicit triggers into one receive point
pub(crate) struct TriggerSource {
    signals: Vec<ExitSignal>,
    channel: OnceLock<SignalChannel>,
    os_listener: OnceCell<()>,
}

impl TriggerSource {
    pub(crate) fn new(signals: Vec<ExitSignal>) -> Self {
        Self {
            signals,
            channel: OnceLock::new(),
            os_listener: OnceCell::new(),
        }
    }

    fn channel(&self) -> &SignalChannel {
        self.channel.get_or_init(SignalChannel::new)
    }

    /// Queue an exit request. Returns false if one is already pending.
    pub(crate) fn trigger(&self, signal: ExitSignal) -> bool {
        match self.channel().tx.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(%signal, "Exit request already pending, ignoring");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Install the OS listeners. Only the first call does any work.
    pub(crate) async fn listen(&self) -> Result<()> {
        self.os_listener
            .get_or_try_init(|| async { self.install() })
            .await?;
        Ok(())
    }

    /// Wait for the next exit request from any source
    pub(crate) async fn recv(&self) -> Result<ExitSignal> {
        self.listen().await?;
        let mut rx = self.channel().rx.lock().await;
        rx.recv().await.ok_or(ShutdownError::TriggerClosed)
    }

    #[cfg(unix)]
    fn install(&self) -> Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = None;
        let mut terminate = None;
        for requested in &self.signals {
            match requested {
                ExitSignal::Interrupt if interrupt.is_none() => {
                    interrupt = Some(
                        signal(SignalKind::interrupt())
                            .map_err(|e| ShutdownError::signal_install("SIGINT", e))?,
                    );
                }
                ExitSignal::Terminate if terminate.is_none() => {
                    terminate = Some(
                        signal(SignalKind::terminate())
                            .map_err(|e| ShutdownError::signal_install("SIGTERM", e))?,
                    );
                }
                _ => {}
            }
        }

        if interrupt.is_none() && terminate.is_none() {
            tracing::debug!("No OS exit signals configured, explicit trigger only");
            return Ok(());
        }

        let tx = self.channel().tx.clone();
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    Some(()) = recv_signal(&mut interrupt) => ExitSignal::Interrupt,
                    Some(()) = recv_signal(&mut terminate) => ExitSignal::Terminate,
                    else => break,
                };
                tracing::debug!(signal = %received, "OS exit signal delivered");
                if let Err(TrySendError::Closed(_)) = tx.try_send(received) {
                    break;
                }
            }
        });

        tracing::debug!(signals = ?self.signals, "Installed OS exit signal listeners");
        Ok(())
    }

    #[cfg(not(unix))]
    fn install(&self) -> Result<()> {
        if self.signals.contains(&ExitSignal::Terminate) {
            tracing::debug!("SIGTERM is not available on this platform");
        }
        if !self.signals.contains(&ExitSignal::Interrupt) {
            return Ok(());
        }

        let tx = self.channel().tx.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if let Err(TrySendError::Closed(_)) = tx.try_send(ExitSignal::Interrupt) {
                    break;
                }
            }
        });
        Ok(())
    }
}

#[cfg(unix)]
async fn recv_signal(signal: &mut Option<tokio::signal::unix::Signal>) -> Option<()> {
    match signal {
        Some(signal) => signal.recv().await,
        None => std::future::pending().await,
    }
}
