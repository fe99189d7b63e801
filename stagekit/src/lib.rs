//! # Stagekit
//!
//! Reference-counted stage management for live production.
//!
//! A *stage* is a named production unit that owns one canvas (its
//! composition surface) and a set of outputs (streams, recordings, ...).
//! Stagekit provides:
//!
//! - **Strong and weak handles**: [`Stage`](stage::Stage) keeps a stage
//!   alive; [`WeakStage`](stage::WeakStage) observes it and upgrades only
//!   while it has not been destroyed
//! - **A thread-safe registry**: creation with full rollback, newest-first
//!   enumeration, lookup by name or UUID
//! - **Output management**: deduplicated attachment, start/stop, bulk
//!   operations
//! - **Notifications**: typed events on a per-stage and a global endpoint,
//!   always dispatched outside any lock
//! - **Persistence**: save and load stages through a flat key-value record
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stagekit::prelude::*;
//! use stagekit::testing::RecordingOutput;
//!
//! let registry = StageRegistry::new();
//! let stage = registry
//!     .create("Vertical", None, StageFlags::MIX_AUDIO)
//!     .expect("stage");
//!
//! let output: OutputRef = Arc::new(RecordingOutput::new("stream"));
//! assert!(stage.add_output(&output));
//! assert!(stage.start_output(0));
//!
//! // Releasing the last handle stops the output and unlinks the stage.
//! assert!(stage.release());
//! assert!(registry.find_by_name("Vertical").is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod flags;
pub mod media;
pub mod observability;
pub mod persistence;
pub mod registry;
pub mod stage;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LogConfig, RegistryConfig};
    pub use crate::errors::{CanvasError, StageError};
    pub use crate::events::{
        EventSink, HandlerId, LoggingEventSink, NoOpEventSink, SignalHandler, SignalScope,
        StageEvent, StageEventKind,
    };
    pub use crate::flags::{CanvasFlags, StageFlags};
    pub use crate::media::{
        Canvas, CanvasFactory, CanvasRef, MemoryCanvasFactory, Output, OutputRef, Source,
        SourceRef, VideoInfo,
    };
    pub use crate::persistence::{save_stage, StageData};
    pub use crate::registry::{
        get_stage_registry, set_stage_registry, shutdown_stage_registry, StageId, StageRegistry,
    };
    pub use crate::stage::{Stage, WeakStage};
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
