//! Layered configuration loading.
//!
//! Later layers override earlier ones:
//! 1. Defaults (built into the code)
//! 2. Configuration file (TOML or JSON)
//! 3. Environment variables (`PREFIX__SECTION__KEY`)

use std::env;
use std::fs;
use std::path::Path;

use trellis_telemetry::LogFormat;

use crate::{ConfigError, TrellisConfig};

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use trellis_config::ConfigLoader;
///
/// # fn main() -> Result<(), trellis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("trellis.toml")?
///     .with_env_prefix("TRELLIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: TrellisConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from [`TrellisConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use trellis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TrellisConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TrellisConfig::production();
        self
    }

    /// Loads a configuration file, picking the format from its extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Loads a configuration file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format (`toml` or
    /// `json`).
    ///
    /// ```
    /// use trellis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\naddress = \"0.0.0.0:3000\"\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.server.address, "0.0.0.0:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Sets the environment variable prefix for overrides.
    ///
    /// With prefix `TRELLIS`, `TRELLIS__SERVER__ADDRESS=0.0.0.0:9000`
    /// overrides `server.address`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates the result.
    pub fn load(mut self) -> Result<TrellisConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_vars(&prefix, env::vars())?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TrellisConfig {
        self.config
    }

    fn apply_env_vars<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(rest) = key.strip_prefix(&marker) {
                let parts: Vec<&str> = rest.split("__").collect();
                self.apply_env_var(&key, &parts, &value)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, parts: &[&str], value: &str) -> Result<(), ConfigError> {
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;

        match parts {
            ["SERVER", "NETWORK"] => server.network = value.to_string(),
            ["SERVER", "ADDRESS"] => server.address = value.to_string(),
            ["SERVER", "TIMEOUT_MS"] => server.timeout_ms = parse_number(key, value)?,
            ["SERVER", "READ_TIMEOUT_MS"] => server.read_timeout_ms = parse_number(key, value)?,
            ["SERVER", "WRITE_TIMEOUT_MS"] => server.write_timeout_ms = parse_number(key, value)?,
            ["SERVER", "HANDLE_METHOD_NOT_ALLOWED"] => {
                server.handle_method_not_allowed = parse_flag(key, value)?;
            }
            ["SERVER", "POOL_CAPACITY"] => server.pool_capacity = parse_number(key, value)?,

            ["LOGGING", "ENABLED"] => logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = value.parse::<LogFormat>().map_err(|_| {
                    ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'")
                })?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => logging.include_target = parse_flag(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => logging.file_line_info = parse_flag(key, value)?,
            ["LOGGING", "THREAD_IDS"] => logging.thread_ids = parse_flag(key, value)?,
            ["LOGGING", "SPAN_EVENTS"] => logging.span_events = parse_flag(key, value)?,

            _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
        }
        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<TrellisConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        _ => Err(ConfigError::UnsupportedFormat(format.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, TrellisConfig::default());
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"address": "127.0.0.1:3000", "pool_capacity": 8}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.address, "127.0.0.1:3000");
        assert_eq!(config.server.pool_capacity, 8);
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/trellis.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/trellis.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.address, "127.0.0.1:8080");
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                "TRELLIS",
                vars(&[
                    ("TRELLIS__SERVER__ADDRESS", "0.0.0.0:9000"),
                    ("TRELLIS__SERVER__TIMEOUT_MS", "750"),
                    ("TRELLIS__SERVER__HANDLE_METHOD_NOT_ALLOWED", "off"),
                    ("TRELLIS__LOGGING__FORMAT", "pretty"),
                    ("TRELLIS__LOGGING__LEVEL", "debug"),
                    ("OTHER__SERVER__ADDRESS", "ignored"),
                    ("TRELLISX__SERVER__ADDRESS", "ignored"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.address, "0.0.0.0:9000");
        assert_eq!(config.server.timeout_ms, 750);
        assert!(!config.server.handle_method_not_allowed);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_bad_number() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_vars("TRELLIS", vars(&[("TRELLIS__SERVER__TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_env_bad_flag() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_vars("TRELLIS", vars(&[("TRELLIS__LOGGING__ENABLED", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("expected boolean"));
    }

    #[test]
    fn test_env_unknown_key() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_vars("TRELLIS", vars(&[("TRELLIS__SERVER__PORT", "80")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { var, .. } if var == "TRELLIS__SERVER__PORT"));
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[server]\nnetwork = \"unix\"\n", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
