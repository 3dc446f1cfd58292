//! Integration tests for blip-config crate.

use blip_common::test_utils::config_fixtures;
use blip_common::LogFormat;
use blip_config::{parse_hhmm, parse_timezone, Config, ConfigError, ConfigLoader};
use std::io::Write;
use std::path::PathBuf;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_minimal_config_fills_defaults() {
    let file = write_config(config_fixtures::minimal_config_yaml());
    let config = ConfigLoader::load_config(file.path()).unwrap();

    assert_eq!(config.analysis.flow, "Início");
    assert_eq!(config.analysis.timezone, "America/Sao_Paulo");
    assert_eq!(config.analysis.days, 30);
    assert_eq!(config.api.page_size, 500);
    assert_eq!(config.export.language, "en-US");
}

#[test]
fn test_full_config_round_trips_every_section() {
    let file = write_config(config_fixtures::full_config_yaml());
    let config = ConfigLoader::load_config(file.path()).unwrap();

    assert_eq!(config.api.base_url, "http://localhost:8080");
    assert_eq!(config.api.timeout_secs, 20);
    assert_eq!(config.api.max_events, 5000);
    assert_eq!(config.analysis.flow, "Boas-vindas");
    assert_eq!(config.analysis.days, 14);
    assert_eq!(config.analysis.business_start, "08:30");
    assert_eq!(config.export.output_dir, PathBuf::from("reports"));
    assert_eq!(config.export.language, "pt-BR");
    assert_eq!(config.logging.format, LogFormat::Compact);

    assert!(parse_timezone(&config.analysis.timezone).is_ok());
    assert!(parse_hhmm("end", &config.analysis.business_end).is_ok());
}

#[test]
fn test_empty_file_means_defaults() {
    let file = write_config("");
    let config = ConfigLoader::load_config(file.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_invalid_timezone_is_rejected_on_load() {
    let file = write_config("analysis:\n  timezone: \"Nowhere/Special\"\n");
    let err = ConfigLoader::load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "timezone"));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let file = write_config("api: [unclosed");
    let err = ConfigLoader::load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_config_has_no_credential_field() {
    let yaml = serde_yaml::to_string(&Config::default()).unwrap();
    assert!(!yaml.contains("api_key"));
}
