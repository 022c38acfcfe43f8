//! Error types for devstack

use std::path::PathBuf;
use thiserror::Error;

/// Result type for devstack operations
pub type Result<T> = std::result::Result<T, DevstackError>;

/// Devstack error types
#[derive(Error, Debug)]
pub enum DevstackError {
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Missing service for logs (expected one of: db, product, sales, all)")]
    MissingLogService,

    #[error("Unknown service for logs: '{0}' (expected one of: db, product, sales, all)")]
    UnknownLogService(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DevstackError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            DevstackError::Interrupted => 130,
            _ => 1,
        }
    }
}
