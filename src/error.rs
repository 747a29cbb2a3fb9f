use thiserror::Error;

use crate::bridge::BridgeError;

/// Custom error type for maquette operations.
#[derive(Debug, Error)]
pub enum MaquetteError {
    /// Requested template was not found.
    #[error("Not found: template '{name}'")]
    NotFound { name: String },

    /// Input validation failed. `path` names the offending field,
    /// e.g. `name` or `actions[2].tool`.
    #[error("Validation error at {path}: {message}")]
    Validation { path: String, message: String },

    /// Reading or writing the template store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document failed to serialize or deserialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The socket bridge to the host application failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl MaquetteError {
    pub fn not_found(name: impl Into<String>) -> Self {
        MaquetteError::NotFound { name: name.into() }
    }

    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        MaquetteError::Validation {
            path: path.into(),
            message: message.into(),
        }
    }
}
