//! Engine configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Listener and timeout settings for an [`Engine`](crate::Engine).
///
/// The engine only validates and stores these values. The listener in
/// `trellis-server` binds `network`/`address`, bounds header reads with
/// `read_timeout` and bounds each dispatch with `timeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Listener network: `tcp`, `tcp4` or `tcp6`. Empty means `tcp`.
    pub network: String,
    /// Listen address, e.g. `127.0.0.1:8080`.
    pub address: String,
    /// Upper bound for running one handler chain.
    pub timeout: Duration,
    /// Upper bound for reading request headers.
    pub read_timeout: Duration,
    /// Upper bound for writing a response. Stored for callers that build
    /// their own listener; the bundled server does not apply it.
    pub write_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: "tcp".to_string(),
            address: "127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration listening on `address`.
    #[must_use]
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Checks the configuration and fills in defaults.
    ///
    /// Fails when `timeout` is zero; an empty `network` becomes `tcp`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(self.timeout));
        }
        if self.network.is_empty() {
            self.network = "tcp".to_string();
        }
        Ok(self)
    }
}

/// Per-path overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodConfig {
    /// Dispatch timeout for requests on this path.
    pub timeout: Duration,
}
