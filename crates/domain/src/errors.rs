//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Gantry
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GantryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GantryError {
    /// True for failures caused by connectivity rather than data.
    ///
    /// Connectivity failures abort the batch item that hit them; anything
    /// else degrades to "not found" during resolution.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, GantryError::Network(_) | GantryError::Auth(_))
    }
}

/// Result type alias for Gantry operations
pub type Result<T> = std::result::Result<T, GantryError>;
