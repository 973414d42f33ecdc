//! Configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use trellis_core::{EngineConfig, DEFAULT_POOL_CAPACITY};
use trellis_telemetry::{LogConfig, LogFormat};

use crate::ConfigError;

/// Networks the listener knows how to bind.
pub const SUPPORTED_NETWORKS: [&str; 3] = ["tcp", "tcp4", "tcp6"];

/// Server section: listener address, timeouts and dispatch behavior.
///
/// Durations are written in milliseconds.
///
/// # Example
///
/// ```
/// use trellis_config::ServerSection;
///
/// let section = ServerSection {
///     address: "0.0.0.0:9000".to_string(),
///     ..ServerSection::default()
/// };
/// let config = section.to_engine_config().unwrap();
/// assert_eq!(config.address, "0.0.0.0:9000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Network to bind: `tcp`, `tcp4` or `tcp6`.
    #[serde(default = "default_network")]
    pub network: String,

    /// Bind address (e.g. `"127.0.0.1:8080"`).
    #[serde(default = "default_address")]
    pub address: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Header read timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Write timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Answer 405 when another method matches the path.
    #[serde(default = "default_true")]
    pub handle_method_not_allowed: bool,

    /// Upper bound on idle pooled contexts.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            network: default_network(),
            address: default_address(),
            timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            write_timeout_ms: default_timeout_ms(),
            handle_method_not_allowed: true,
            pool_capacity: default_pool_capacity(),
        }
    }
}

impl ServerSection {
    /// Converts the section into a validated engine configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let config = EngineConfig {
            network: self.network.clone(),
            address: self.address.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        };
        Ok(config.validate()?)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.network.is_empty() && !SUPPORTED_NETWORKS.contains(&self.network.as_str()) {
            return Err(ConfigError::invalid_value(
                "server.network",
                format!("unknown network '{}'", self.network),
            ));
        }
        if !is_listen_address(&self.address) {
            return Err(ConfigError::invalid_value(
                "server.address",
                format!("expected host:port or :port, got '{}'", self.address),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.timeout_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Accepts `host:port`, `[v6]:port` and `:port`. Host names are resolved
/// when the server binds.
fn is_listen_address(address: &str) -> bool {
    let Some((host, port)) = address.rsplit_once(':') else {
        return false;
    };
    if port.parse::<u16>().is_err() {
        return false;
    }
    if let Some(inner) = host.strip_prefix('[') {
        return inner
            .strip_suffix(']')
            .is_some_and(|v6| v6.parse::<std::net::Ipv6Addr>().is_ok());
    }
    !host.contains([':', '/', ' '])
}

fn default_network() -> String {
    "tcp".to_string()
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_pool_capacity() -> usize {
    DEFAULT_POOL_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

/// Logging section, mirrored onto [`LogConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include the event target.
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// Include file and line.
    #[serde(default)]
    pub file_line_info: bool,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Emit span open/close events.
    #[serde(default)]
    pub span_events: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self::from(&LogConfig::production())
    }
}

impl From<&LogConfig> for LoggingSection {
    fn from(config: &LogConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: config.format,
            include_target: config.include_target,
            file_line_info: config.file_line_info,
            thread_ids: config.thread_ids,
            span_events: config.span_events,
        }
    }
}

impl LoggingSection {
    /// Converts the section into a telemetry configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            include_target: self.include_target,
            file_line_info: self.file_line_info,
            thread_ids: self.thread_ids,
            span_events: self.span_events,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled {
            trellis_telemetry::create_env_filter(&self.level).map_err(|e| {
                ConfigError::invalid_value("logging.level", e.to_string())
            })?;
        }
        Ok(())
    }
}
