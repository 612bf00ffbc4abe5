//! Error types for the RL core library

use thiserror::Error;

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RlError {
    /// Invalid environment configuration, rejected before any state mutation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Action index outside the environment's action space
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// `step` called after the episode reached a terminal or truncated state
    #[error("Episode already ended: {0}")]
    EpisodeFinished(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensionality
        expected: usize,
        /// Actual dimensionality
        actual: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RlError>;
