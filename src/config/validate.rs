// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{QahubError, Result};
use crate::fs::path::make_absolute;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = QahubError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        raw.store.path = resolve(&raw.store.path)?;
        raw.runs.root = resolve(&raw.runs.root)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run the semantic checks on an already-deserialized config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runs(cfg)?;
    validate_programs(cfg)?;
    validate_probe(cfg)?;
    Ok(())
}

fn validate_runs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runs.history_limit == 0 {
        return Err(QahubError::ConfigError(
            "[runs].history_limit must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.runs.root.as_os_str().is_empty() {
        return Err(QahubError::ConfigError(
            "[runs].root must not be empty".to_string(),
        ));
    }
    if cfg.store.path.as_os_str().is_empty() {
        return Err(QahubError::ConfigError(
            "[store].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_programs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.program.trim().is_empty() {
        return Err(QahubError::ConfigError(
            "[runner].program must not be empty".to_string(),
        ));
    }
    if cfg.report.enabled && cfg.report.program.trim().is_empty() {
        return Err(QahubError::ConfigError(
            "[report].program must not be empty when reports are enabled".to_string(),
        ));
    }
    Ok(())
}

fn validate_probe(cfg: &RawConfigFile) -> Result<()> {
    let timeouts = [
        ("api_timeout_secs", cfg.probe.api_timeout_secs),
        ("website_timeout_secs", cfg.probe.website_timeout_secs),
    ];
    for (name, value) in timeouts {
        if !value.is_finite() || value <= 0.0 {
            return Err(QahubError::ConfigError(format!(
                "[probe].{name} must be a positive number of seconds (got {value})"
            )));
        }
    }
    Ok(())
}

fn resolve(path: &Path) -> Result<PathBuf> {
    Ok(make_absolute(path)?)
}
