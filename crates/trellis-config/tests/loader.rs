//! Loading configuration from files and the process environment.

use std::io::Write;
use std::time::Duration;

use http::{Method, StatusCode};
use tempfile::NamedTempFile;
use trellis_config::{ConfigError, ConfigLoader};
use trellis_core::{Exchange, HttpExchange};

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = temp_file(
        ".toml",
        r#"
        [server]
        address = "0.0.0.0:7000"
        timeout_ms = 1200

        [logging]
        enabled = false
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.server.address, "0.0.0.0:7000");

    let engine = config.build_engine().unwrap();
    assert_eq!(engine.config().timeout, Duration::from_millis(1200));
    assert!(engine.logger().is_none());
}

#[test]
fn test_json_file() {
    let file = temp_file(".json", r#"{"logging": {"level": "warn", "format": "compact"}}"#);

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.server.address, "127.0.0.1:8080");
}

#[test]
fn test_unsupported_extension() {
    let file = temp_file(".yaml", "server: {}");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn test_unknown_field_in_file() {
    let file = temp_file(".toml", "[server]\nport = 80\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_environment_overrides_file() {
    let file = temp_file(".toml", "[server]\naddress = \"0.0.0.0:7000\"\n");
    std::env::set_var("TRELLIS_LOADER_TEST__SERVER__ADDRESS", "0.0.0.0:7100");
    std::env::set_var("TRELLIS_LOADER_TEST__LOGGING__ENABLED", "false");

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("trellis_loader_test")
        .load()
        .unwrap();

    std::env::remove_var("TRELLIS_LOADER_TEST__SERVER__ADDRESS");
    std::env::remove_var("TRELLIS_LOADER_TEST__LOGGING__ENABLED");

    assert_eq!(config.server.address, "0.0.0.0:7100");
    assert!(!config.logging.enabled);
}

#[test]
fn test_port_only_address_in_file() {
    let config = ConfigLoader::new()
        .with_string("[server]\naddress = \":8080\"\n", "toml")
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.server.address, ":8080");
    assert_eq!(config.build_engine().unwrap().config().address, ":8080");
}

#[test]
fn test_hostname_address_from_environment() {
    std::env::set_var("TRELLIS_HOST_TEST__SERVER__ADDRESS", "localhost:8080");
    let config = ConfigLoader::new()
        .with_env_prefix("trellis_host_test")
        .load();
    std::env::remove_var("TRELLIS_HOST_TEST__SERVER__ADDRESS");

    assert_eq!(config.unwrap().server.address, "localhost:8080");
}

#[test]
fn test_malformed_address_rejected() {
    let result = ConfigLoader::new()
        .with_string("[server]\naddress = \"localhost\"\n", "toml")
        .unwrap()
        .load();
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue { field, .. }) if field == "server.address"
    ));
}

#[test]
fn test_configured_engine_answers_405_per_config() {
    let config = ConfigLoader::new()
        .with_string(
            "[server]\nhandle_method_not_allowed = false\n[logging]\nenabled = false\n",
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let mut engine = config.build_engine().unwrap();
    trellis_core::Routes::get(
        &mut engine,
        "/items",
        [trellis_core::handler(|ctx| {
            ctx.string(StatusCode::OK, "items");
            Ok(())
        })],
    );

    let mut exchange = HttpExchange::new(Method::POST, "/items");
    engine.dispatch(&mut exchange);
    assert_eq!(exchange.status(), StatusCode::NOT_FOUND);
}
