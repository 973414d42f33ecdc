//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level directive could not be parsed.
    #[error("Invalid log level '{level}': {reason}")]
    InvalidLevel {
        /// The rejected directive.
        level: String,
        /// Parser message.
        reason: String,
    },

    /// The format name is not one of `json`, `pretty` or `compact`.
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    /// A global subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}
