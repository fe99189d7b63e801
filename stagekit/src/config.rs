//! Registry and logging configuration.

use crate::errors::StageError;
use crate::media::VideoInfo;
use serde::{Deserialize, Serialize};

/// Configuration for a [`StageRegistry`](crate::registry::StageRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Video configuration for stages created without one.
    #[serde(default)]
    pub default_video: VideoInfo,
    /// Broadcast buffer size of every signal endpoint.
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,
}

fn default_signal_capacity() -> usize {
    64
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_video: VideoInfo::default(),
            signal_capacity: default_signal_capacity(),
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default video configuration.
    #[must_use]
    pub fn with_default_video(mut self, video: VideoInfo) -> Self {
        self.default_video = video;
        self
    }

    /// Sets the broadcast buffer size.
    #[must_use]
    pub fn with_signal_capacity(mut self, capacity: usize) -> Self {
        self.signal_capacity = capacity;
        self
    }

    /// Broadcast buffer size, never below one.
    #[must_use]
    pub fn effective_signal_capacity(&self) -> usize {
        self.signal_capacity.max(1)
    }

    /// Parses a configuration from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Logging configuration for [`init_tracing`](crate::observability::init_tracing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Switches JSON output on or off.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}
