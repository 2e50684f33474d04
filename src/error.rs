use thiserror::Error;

use crate::command::CommandParseError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("No room on the canvas for node {node} after {attempts} placement attempts")]
    CapacityExceeded { node: String, attempts: u32 },

    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CommandParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cluster service is no longer running")]
    ServiceClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
