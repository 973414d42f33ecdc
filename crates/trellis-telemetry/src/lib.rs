//! Logging setup for Trellis.
//!
//! Builds `tracing` subscribers from a [`LogConfig`]. The result is either
//! scoped to one engine through `Engine::set_logger` or installed globally
//! with [`init_logging`].
//!
//! ```text
//!   LogConfig ──► build_dispatch ──► Engine::set_logger (per engine)
//!        │
//!        └──────► init_logging ───► global default subscriber
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{
    build_dispatch, build_dispatch_with_writer, create_env_filter, init_logging, LogConfig,
    LogFormat,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
