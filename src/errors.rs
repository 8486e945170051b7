// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QahubError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A request was rejected before anything was created.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// The external suite runner could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QahubError {
    pub fn not_found(kind: &'static str, id: impl Into<u64>) -> Self {
        QahubError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this error should be reported to a client as its own fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QahubError::Validation(_) | QahubError::NotFound { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, QahubError>;
