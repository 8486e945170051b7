// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config the CLI asked for.
///
/// An explicitly named file must exist. When no path was given, a missing
/// `Qahub.toml` simply means "use the built-in defaults".
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => load_and_validate(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_and_validate(&path)
            } else {
                debug!(path = %path.display(), "no config file found; using defaults");
                ConfigFile::try_from(RawConfigFile::default())
            }
        }
    }
}

/// Default config location: `Qahub.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Qahub.toml")
}
