//! Integration tests for configuration loading and validation.

use std::io::Write;
use std::time::Duration;

use assert_matches::assert_matches;
use serial_test::serial;
use tempfile::NamedTempFile;
use vrgate::config::{load_config, load_config_or_default, validate_config, Config};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn loads_full_file() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 9100

[origin]
url = "http://stash.lan:9999/"
api_key = "abc"

[timeouts]
probe_secs = 5
transfer_secs = 600

[images]
max_concurrent_transcodes = 2

[auth]
enabled = true
tokens = ["t1"]
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.origin.base_url(), "http://stash.lan:9999");
    assert_eq!(config.timeouts.probe(), Duration::from_secs(5));
    assert_eq!(config.timeouts.transfer(), Some(Duration::from_secs(600)));
    assert_eq!(config.images.transcode_permits(), 2);
    assert!(config.auth.enabled);
}

#[test]
fn partial_file_keeps_defaults() {
    let file = write_config("[origin]\napi_key = \"k\"\n");

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.server.port, 8890);
    assert_eq!(config.origin.credential_header, "ApiKey");
    assert_eq!(config.timeouts.transfer(), None);
}

#[test]
fn explicit_path_wins() {
    let file = write_config("[server]\nport = 9200\n");

    let config = load_config_or_default(Some(file.path())).unwrap();

    assert_eq!(config.server.port, 9200);
}

#[test]
fn missing_explicit_path_is_error() {
    let result = load_config_or_default(Some(std::path::Path::new("/no/such/vrgate.toml")));
    assert_matches!(result, Err(e) if e.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn discovers_file_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("vrgate.toml"), "[server]\nport = 9300\n").unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = load_config_or_default(None);
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(result.unwrap().server.port, 9300);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn rejects_zero_port() {
    let file = write_config("[server]\nport = 0\n");
    assert!(load_config(file.path()).is_err());
}

#[test]
fn rejects_non_http_origin() {
    let mut config = Config::default();
    config.origin.url = "ftp://stash.lan".into();
    assert!(validate_config(&config).is_err());
}

#[test]
fn rejects_malformed_toml() {
    let file = write_config("[server\nport = ");
    assert!(load_config(file.path()).is_err());
}

#[test]
fn default_config_is_valid() {
    assert!(validate_config(&Config::default()).is_ok());
}
