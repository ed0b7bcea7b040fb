//! Integration tests for building hubs and logging from configuration.

use std::collections::HashMap;

use fanout_config::{Config, ConfigError, ConfigLayer};
use fanout_events::{DEFAULT_OUTPUT_CAPACITY, Hub, HubConfig};
use fanout_telemetry::{LogConfig, LogFormat};
use fanout_test::{collect, config_file};

#[test]
fn test_default_config_matches_hub_defaults() {
    let config = Config::from_toml_str("").unwrap();
    let hub_config = HubConfig::from(&config.hub);
    assert_eq!(hub_config, HubConfig::default());
    assert_eq!(hub_config.output_capacity, DEFAULT_OUTPUT_CAPACITY);
}

#[tokio::test]
async fn test_hub_built_from_toml() {
    let config = Config::from_toml_str(
        r#"
        [hub]
        name = "orders"
        output_capacity = 16
        "#,
    )
    .unwrap();

    let hub = Hub::with_config(HubConfig::from(&config.hub));
    assert_eq!(hub.config().name, "orders");
    assert_eq!(hub.config().output_capacity, 16);

    let mut sub = hub.subscribe();
    hub.publish(42_u64);
    hub.close();
    assert_eq!(collect(&mut sub).await, vec![42]);
}

#[test]
fn test_invalid_capacity_rejected() {
    let err = Config::from_toml_str("[hub]\noutput_capacity = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}

#[test]
fn test_file_overrides_env_fallback() {
    let file = config_file("[hub]\nname = \"from-file\"\n");
    let env = HashMap::from([
        ("FANOUT_HUB_NAME".to_string(), "from-env".to_string()),
        ("FANOUT_HUB_OUTPUT_CAPACITY".to_string(), "8".to_string()),
    ]);

    let resolved = fanout_config::loader::load(Some(file.path()), &env).unwrap();
    assert_eq!(resolved.config.hub.name, "from-file");
    assert_eq!(resolved.config.hub.output_capacity, 8);
    assert_eq!(
        resolved.field_sources.get("hub.name"),
        Some(&ConfigLayer::File)
    );
    assert_eq!(
        resolved.field_sources.get("hub.output_capacity"),
        Some(&ConfigLayer::Environment)
    );

    let hub: Hub<u8> = Hub::with_config(HubConfig::from(&resolved.config.hub));
    assert_eq!(hub.config().output_capacity, 8);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let resolved = fanout_config::loader::load(Some(&path), &HashMap::new()).unwrap();
    assert!(resolved.loaded_files.is_empty());
    assert_eq!(resolved.config, Config::default());
}

#[test]
fn test_log_config_from_logging_section() {
    let config = Config::from_toml_str(
        r#"
        [logging]
        level = "debug"
        format = "json"
        directives = ["fanout_events=trace"]
        "#,
    )
    .unwrap();

    let log = LogConfig::try_from(&config.logging).unwrap();
    assert_eq!(log.level, "debug");
    assert_eq!(log.format, LogFormat::Json);
    assert_eq!(log.directives, vec!["fanout_events=trace"]);
}

#[test]
fn test_file_logging_setup_writes_events() {
    let dir = tempfile::tempdir().unwrap();
    let log = LogConfig::new("debug")
        .with_format(LogFormat::Json)
        .with_file_logging(dir.path(), "bus");

    // One global subscriber per process; skip if another test got there first.
    if fanout_telemetry::setup_logging(&log).is_ok() {
        tracing::info!(target: "fanout_integration", "file logging ready");
        assert!(dir.path().exists());
    }
}
