//! Shutdown-specific error types

use thiserror::Error;

/// A specialized Result type for shutdown operations
pub type Result<T> = std::result::Result<T, ShutdownError>;

/// Errors that can occur while registering hooks or waiting for exit
///
/// Hook failures are deliberately absent: a panicking hook is reported
/// through the exit message handler and never surfaces as an error.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// A hook was registered after draining started
    #[error("shutdown already in progress, can't register new hook")]
    ShutdownInProgress,

    /// The exit message handler was replaced after draining started
    #[error("exit message handler can't be replaced once shutdown has begun")]
    SinkFrozen,

    /// Installing an OS signal listener failed
    #[error("failed to install {signal} handler: {source}")]
    SignalInstall {
        /// Name of the signal being installed
        signal: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The trigger channel closed before any exit request arrived
    #[error("exit trigger channel closed while waiting for a signal")]
    TriggerClosed,

    /// A runtime for the blocking wait could not be built
    #[error("failed to build runtime for blocking wait: {0}")]
    Runtime(#[source] std::io::Error),

    /// A configuration value was rejected
    #[error("invalid configuration value for {key}: {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Why the value was rejected
        message: String,
    },

    /// A configuration document could not be parsed
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ShutdownError {
    /// Create an invalid configuration error
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a signal install error
    pub fn signal_install(signal: &'static str, source: std::io::Error) -> Self {
        Self::SignalInstall { signal, source }
    }
}
