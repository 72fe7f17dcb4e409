use crate::error::{Result, ShutdownError};
use crate::lifecycle::ExitSignal;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Environment key for the exit timeout in milliseconds
pub const TIMEOUT_KEY: &str = "SHUTDOWN_TIMEOUT_MS";

/// Environment key for the comma-separated list of OS exit signals
pub const SIGNALS_KEY: &str = "SHUTDOWN_SIGNALS";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Key/value configuration source
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Load every variable of the process environment
    pub fn new() -> Self {
        Self::from_pairs(env::vars())
    }

    /// Build from explicit pairs, ignoring the environment
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.config.insert(key.into(), value.into());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse a value, `Ok(None)` when the key is absent
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ShutdownError::invalid_config(key, e.to_string())),
        }
    }
}

/// Settings for a shutdown coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShutdownConfig {
    /// How long `wait_exit_default` waits for hooks, in milliseconds
    pub timeout_ms: u64,
    /// OS signals that start shutdown
    pub signals: Vec<ExitSignal>,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            signals: vec![ExitSignal::Interrupt, ExitSignal::Terminate],
        }
    }
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Read `SHUTDOWN_TIMEOUT_MS` and `SHUTDOWN_SIGNALS`, defaulting what's missing
    pub fn from_service(service: &ConfigService) -> Result<Self> {
        let mut config = Self::default();

        if let Some(timeout_ms) = service.get_parsed::<u64>(TIMEOUT_KEY)? {
            config.timeout_ms = timeout_ms;
        }

        // An empty list is valid: explicit trigger only.
        if let Some(raw) = service.get(SIGNALS_KEY) {
            config.signals = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    ExitSignal::from_str(s).map_err(|_| {
                        ShutdownError::invalid_config(SIGNALS_KEY, format!("unknown signal '{s}'"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_service(&ConfigService::new())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(ShutdownError::invalid_config(
                TIMEOUT_KEY,
                "timeout must be greater than zero",
            ));
        }
        if let Some(signal) = self.signals.iter().find(|s| !s.is_os_signal()) {
            return Err(ShutdownError::invalid_config(
                SIGNALS_KEY,
                format!("'{signal}' is not an OS signal"),
            ));
        }
        Ok(())
    }
}
