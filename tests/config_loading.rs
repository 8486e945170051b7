// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use qahub::config::{load_and_validate, load_or_default};
use qahub::errors::QahubError;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn full_config_is_loaded() {
    let file = write_config(
        r#"
[store]
path = "/var/lib/qahub/qahub.db"

[runs]
root = "/var/lib/qahub/runs"
files_url_prefix = "/artifacts"
history_limit = 25
max_concurrent = 3

[runner]
program = "/opt/robot/bin/robot"
listener = "my_listener"

[report]
enabled = false

[probe]
api_timeout_secs = 5
website_timeout_secs = 2.5
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.store.path, PathBuf::from("/var/lib/qahub/qahub.db"));
    assert_eq!(cfg.runs.root, PathBuf::from("/var/lib/qahub/runs"));
    assert_eq!(cfg.runs.files_url_prefix, "/artifacts");
    assert_eq!(cfg.runs.history_limit, 25);
    assert_eq!(cfg.concurrency_limit(), Some(3));
    assert_eq!(cfg.runner.program, "/opt/robot/bin/robot");
    assert_eq!(cfg.runner.listener, "my_listener");
    assert!(!cfg.report.enabled);
    assert_eq!(cfg.probe.api_timeout_secs, 5.0);
    assert_eq!(cfg.probe.website_timeout_secs, 2.5);
}

#[test]
fn empty_config_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert!(cfg.runs.root.is_absolute());
    assert!(cfg.runs.root.ends_with("data/robot_runs"));
    assert_eq!(cfg.runs.files_url_prefix, "/files/robot_runs");
    assert_eq!(cfg.runs.history_limit, 100);
    assert_eq!(cfg.concurrency_limit(), None);
    assert_eq!(cfg.runner.program, "robot");
    assert_eq!(cfg.runner.listener, "allure_robotframework");
    assert!(cfg.report.enabled);
    assert_eq!(cfg.report.program, "allure");
    assert_eq!(cfg.probe.api_timeout_secs, 15.0);
    assert_eq!(cfg.probe.website_timeout_secs, 8.0);
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_config("[probe]\napi_timeout_secs = 0\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(QahubError::ConfigError(_))
    ));

    let file = write_config("[runner]\nprogram = \"\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(QahubError::ConfigError(_))
    ));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[runs\nroot = 1");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(QahubError::TomlError(_))
    ));
}

#[test]
fn explicitly_named_config_must_exist() {
    let missing = PathBuf::from("/nonexistent/qahub/Qahub.toml");
    assert!(matches!(
        load_or_default(Some(&missing)),
        Err(QahubError::IoError(_))
    ));
}
