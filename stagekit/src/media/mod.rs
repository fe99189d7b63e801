//! Interfaces to the collaborators a stage drives but does not implement.
//!
//! A stage owns one [`Canvas`] built by a [`CanvasFactory`], holds strong
//! references to [`Output`]s, and can place a [`Source`] (typically a
//! scene) on the canvas' primary channel. The compositing, encoding and
//! transport behind these traits live elsewhere.

mod memory;
mod video;

pub use memory::{MemoryCanvas, MemoryCanvasFactory};
pub use video::VideoInfo;

use crate::errors::CanvasError;
use crate::flags::CanvasFlags;
use std::sync::Arc;

/// Shared handle to an output.
pub type OutputRef = Arc<dyn Output>;
/// Shared handle to a canvas.
pub type CanvasRef = Arc<dyn Canvas>;
/// Shared handle to a source.
pub type SourceRef = Arc<dyn Source>;

/// Channel that carries a stage's scene.
pub const SCENE_CHANNEL: u32 = 0;

/// A delivery endpoint (stream, recording, ...).
///
/// `start` and `stop` may block on external I/O.
#[cfg_attr(test, mockall::automock)]
pub trait Output: Send + Sync {
    /// Returns the output's name.
    fn name(&self) -> String;

    /// Starts the output. Returns false if it could not be started.
    fn start(&self) -> bool;

    /// Stops the output, letting it flush.
    fn stop(&self);

    /// Stops the output without waiting for pending data.
    fn force_stop(&self) {
        self.stop();
    }

    /// Returns whether the output is currently running.
    fn is_active(&self) -> bool;
}

/// Content that can be placed on a canvas channel.
pub trait Source: Send + Sync {
    /// Returns the source's name.
    fn name(&self) -> &str;
}

/// The composition surface owned by a stage.
pub trait Canvas: Send + Sync {
    /// Returns the canvas' current name.
    fn name(&self) -> String;

    /// Renames the canvas.
    fn set_name(&self, name: &str);

    /// Returns the video configuration, if the canvas has one.
    fn video_info(&self) -> Option<VideoInfo>;

    /// Assigns (or clears) the source on a channel.
    fn set_channel(&self, channel: u32, source: Option<SourceRef>);

    /// Returns the source on a channel.
    fn channel(&self, channel: u32) -> Option<SourceRef>;
}

/// Builds canvases for newly created stages.
pub trait CanvasFactory: Send + Sync {
    /// Creates a canvas.
    ///
    /// # Errors
    ///
    /// Returns `CanvasError` if the canvas cannot be built; stage creation
    /// is then rolled back.
    fn create_canvas(
        &self,
        name: &str,
        video: &VideoInfo,
        flags: CanvasFlags,
    ) -> Result<CanvasRef, CanvasError>;
}

/// Returns true if both handles point at the same output.
///
/// Compares data pointers only, so two handles to one object always match
/// regardless of how the trait object was formed.
#[must_use]
pub fn same_output(a: &OutputRef, b: &OutputRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

/// Returns true if both handles point at the same source.
#[must_use]
pub fn same_source(a: &SourceRef, b: &SourceRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingOutput;

    #[test]
    fn test_same_output_identity() {
        let a: OutputRef = Arc::new(RecordingOutput::new("a"));
        let b: OutputRef = Arc::new(RecordingOutput::new("a"));
        let a2 = Arc::clone(&a);

        assert!(same_output(&a, &a2));
        assert!(!same_output(&a, &b));
    }

    #[test]
    fn test_force_stop_defaults_to_stop() {
        let output = RecordingOutput::new("rec");
        output.start();
        output.force_stop();

        assert!(!output.is_active());
        assert_eq!(output.stop_count(), 1);
    }
}
