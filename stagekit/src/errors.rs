//! Error types for stagekit.
//!
//! The public stage API reports failure through `Option`/`bool` results.
//! These types carry the reason on the internal paths (construction,
//! persistence) and through the `try_*` entry points.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for stagekit operations.
#[derive(Debug, Error)]
pub enum StageError {
    /// A required argument was empty or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The canvas backing a stage could not be created.
    #[error("{0}")]
    Canvas(#[from] CanvasError),

    /// The owning registry has already been shut down.
    #[error("Stage registry has been shut down")]
    ShutDown,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns a short machine-readable code for the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "STAGE-INVALID-ARGUMENT",
            Self::Canvas(_) => "STAGE-CANVAS",
            Self::ShutDown => "STAGE-SHUT-DOWN",
            Self::Serialization(_) => "STAGE-SERIALIZATION",
            Self::Io(_) => "STAGE-IO",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Error raised when a canvas factory refuses to build a canvas.
#[derive(Debug, Clone, Error)]
#[error("Canvas '{name}' could not be created: {reason}")]
pub struct CanvasError {
    /// The name the canvas was requested under.
    pub name: String,
    /// Why creation failed.
    pub reason: String,
}

impl CanvasError {
    /// Creates a new canvas error.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
