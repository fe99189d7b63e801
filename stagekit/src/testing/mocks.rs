//! Hand-written collaborators for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::errors::CanvasError;
use crate::flags::CanvasFlags;
use crate::media::{CanvasFactory, CanvasRef, Output, Source, VideoInfo};

/// An output that records start and stop calls.
#[derive(Debug)]
pub struct RecordingOutput {
    name: String,
    refuse_start: bool,
    active: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl RecordingOutput {
    /// Creates an output that starts successfully.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            refuse_start: false,
            active: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// Creates an output whose `start` always fails.
    #[must_use]
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            refuse_start: true,
            ..Self::new(name)
        }
    }

    /// Returns how many times `start` was called.
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Returns how many times `stop` was called.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Output for RecordingOutput {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn start(&self) -> bool {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.refuse_start {
            return false;
        }
        self.active.store(true, Ordering::SeqCst);
        true
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// A source that only has a name.
#[derive(Debug, Clone)]
pub struct NamedSource {
    name: String,
}

impl NamedSource {
    /// Creates a named source.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Source for NamedSource {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A canvas factory that refuses every request.
#[derive(Debug)]
pub struct FailingCanvasFactory {
    reason: String,
    attempts: AtomicUsize,
}

impl FailingCanvasFactory {
    /// Creates a factory failing with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Returns how many canvases were requested.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl CanvasFactory for FailingCanvasFactory {
    fn create_canvas(
        &self,
        name: &str,
        _video: &VideoInfo,
        _flags: CanvasFlags,
    ) -> Result<CanvasRef, CanvasError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CanvasError::new(name, self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_output() {
        let output = RecordingOutput::new("rec");
        assert!(!output.is_active());

        assert!(output.start());
        assert!(output.is_active());
        output.force_stop();

        assert!(!output.is_active());
        assert_eq!(output.start_count(), 1);
        assert_eq!(output.stop_count(), 1);
    }

    #[test]
    fn test_failing_output() {
        let output = RecordingOutput::failing("bad");
        assert!(!output.start());
        assert!(!output.is_active());
        assert_eq!(output.start_count(), 1);
    }

    #[test]
    fn test_failing_canvas_factory() {
        let factory = FailingCanvasFactory::new("no device");
        let Err(err) = factory.create_canvas("cam", &VideoInfo::default(), CanvasFlags::empty())
        else {
            panic!("canvas creation should fail");
        };

        assert_eq!(err.name, "cam");
        assert_eq!(err.reason, "no device");
        assert_eq!(factory.attempts(), 1);
    }
}
