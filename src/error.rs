//! Error types for the galaxy simulation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalaxyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GalaxyError>;
