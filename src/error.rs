//! Error types for Handsfree
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Handsfree
#[derive(Debug, Error)]
pub enum HandsfreeError {
    /// Command name is not in the registry
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A registered action failed while executing
    #[error("Action failed: {0}")]
    Action(String),

    /// Speech recognizer could not be driven
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// Screen capture failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Detector could not process a frame
    #[error("Detection error: {0}")]
    Detection(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Server rejected or failed a client request
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Handsfree operations
pub type Result<T> = std::result::Result<T, HandsfreeError>;
