//! Error types for calcmatrix

use thiserror::Error;

/// Result type alias using calcmatrix Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating case tables
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("YAML error in {path}: {source}")]
    TableYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid case table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("Case table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
