//! Typed configuration for Trellis.
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! `PREFIX__SECTION__KEY` environment variables. Unknown fields are
//! rejected at every layer.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! network = "tcp"
//! address = "127.0.0.1:8080"
//! timeout_ms = 5000
//! read_timeout_ms = 5000
//! write_timeout_ms = 5000
//! handle_method_not_allowed = true
//! pool_capacity = 1024
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), trellis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("trellis.toml")?
//!     .with_env_prefix("TRELLIS")
//!     .load()?;
//! let engine = config.build_engine()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TrellisConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingSection, ServerSection, SUPPORTED_NETWORKS};
