//! Top-level configuration.

use serde::{Deserialize, Serialize};
use trellis_core::Engine;
use trellis_telemetry::LogConfig;

use crate::{ConfigError, LoggingSection, ServerSection};

/// Complete Trellis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use trellis_config::TrellisConfig;
///
/// let config = TrellisConfig::default();
/// assert_eq!(config.server.address, "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TrellisConfig {
    /// Listener and dispatch settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TrellisConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection::default(),
            logging: LoggingSection::from(&LogConfig::development()),
        }
    }

    /// Production preset: JSON info logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerSection::default(),
            logging: LoggingSection::from(&LogConfig::production()),
        }
    }

    /// Builds an engine with this configuration applied.
    ///
    /// The engine gets the server section as its [`EngineConfig`], the
    /// method-not-allowed flag, the pool capacity and, when logging is
    /// enabled, a scoped logger built from the logging section.
    ///
    /// [`EngineConfig`]: trellis_core::EngineConfig
    pub fn build_engine(&self) -> Result<Engine, ConfigError> {
        self.validate()?;

        let mut engine = Engine::new(self.server.to_engine_config()?)?;
        engine.set_handle_method_not_allowed(self.server.handle_method_not_allowed);
        engine.set_pool_capacity(self.server.pool_capacity);
        if self.logging.enabled {
            let dispatch = trellis_telemetry::build_dispatch(&self.logging.to_log_config())?;
            engine.set_logger(dispatch);
        }
        Ok(engine)
    }
}
