//! Test doubles for stage collaborators.
//!
//! - [`RecordingOutput`]: an output that counts start/stop calls
//! - [`NamedSource`]: a minimal scene source
//! - [`FailingCanvasFactory`]: forces the canvas step of stage creation to fail
//! - [`EventRecorder`]: captures what a signal endpoint delivered

mod mocks;
mod recorder;

pub use mocks::{FailingCanvasFactory, NamedSource, RecordingOutput};
pub use recorder::EventRecorder;
