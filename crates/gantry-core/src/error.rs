//! Error types for Gantry CI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Registry errors
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Cyclic inheritance at job '{job}' (chain: {chain:?})")]
    CyclicInheritance { job: String, chain: Vec<String> },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // Execution errors
    #[error("Failed to materialize project '{project}': {reason}")]
    Materialize { project: String, reason: String },

    #[error("Failed to spawn task: {0}")]
    TaskSpawn(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
