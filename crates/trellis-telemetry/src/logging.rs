//! Structured logging for Trellis.
//!
//! Two ways to install a subscriber built from a [`LogConfig`]:
//!
//! - [`build_dispatch`] returns a [`Dispatch`] to hand to
//!   `Engine::set_logger`, scoping the output to one engine's dispatches.
//! - [`init_logging`] installs the same subscriber process-wide.
//!
//! # Example
//!
//! ```
//! use trellis_telemetry::{build_dispatch, LogConfig};
//!
//! let dispatch = build_dispatch(&LogConfig::development()).unwrap();
//! tracing::dispatcher::with_default(&dispatch, || {
//!     tracing::info!(route = "/users/:id", "route registered");
//! });
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Dispatch;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        };
        f.write_str(name)
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            _ => Err(TelemetryError::UnknownFormat(s.to_string())),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. `"info"`, `"trellis_core=debug,warn"`).
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include the target (module path).
    pub include_target: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
            file_line_info: true,
            thread_ids: false,
            span_events: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_target: true,
            file_line_info: false,
            thread_ids: false,
            span_events: false,
        }
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Creates an env filter from a directive string.
pub fn create_env_filter(level: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| TelemetryError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

/// Builds a dispatcher writing to stdout.
///
/// A disabled configuration yields a dispatcher that discards everything.
pub fn build_dispatch(config: &LogConfig) -> TelemetryResult<Dispatch> {
    build_dispatch_with_writer(config, std::io::stdout)
}

/// Builds a dispatcher writing to `writer`.
pub fn build_dispatch_with_writer<W>(config: &LogConfig, writer: W) -> TelemetryResult<Dispatch>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if !config.enabled {
        return Ok(Dispatch::none());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => base.json().with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };

    Ok(Dispatch::new(Registry::default().with(layer)))
}

/// Installs the configured subscriber as the process-wide default.
///
/// Does nothing when logging is disabled.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let dispatch = build_dispatch(config)?;
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.span_events);
        assert!(!config.file_line_info);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_format_display_round_trips() {
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("trellis_core=debug,warn").is_ok());
        assert!(matches!(
            create_env_filter("trellis=verbose"),
            Err(TelemetryError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn test_build_dispatch_rejects_bad_level() {
        let config = LogConfig::production().with_level("trellis=verbose");
        assert!(build_dispatch(&config).is_err());
    }

    #[test]
    fn test_build_dispatch_for_every_format() {
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            let config = LogConfig::production().with_format(format);
            assert!(build_dispatch(&config).is_ok());
        }
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
        assert!(build_dispatch(&config).is_ok());
    }
}
