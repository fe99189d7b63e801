//! In-process canvas used when no rendering backend is plugged in.

use super::{Canvas, CanvasFactory, CanvasRef, SourceRef, VideoInfo};
use crate::errors::CanvasError;
use crate::flags::CanvasFlags;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of channels a canvas exposes.
pub const MAX_CHANNELS: u32 = 64;

/// A canvas that only records its configuration and channel assignments.
pub struct MemoryCanvas {
    name: RwLock<String>,
    video: VideoInfo,
    flags: CanvasFlags,
    channels: RwLock<HashMap<u32, SourceRef>>,
}

impl MemoryCanvas {
    /// Creates a new memory canvas.
    #[must_use]
    pub fn new(name: impl Into<String>, video: VideoInfo, flags: CanvasFlags) -> Self {
        Self {
            name: RwLock::new(name.into()),
            video,
            flags,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the flags the canvas was created with.
    #[must_use]
    pub fn flags(&self) -> CanvasFlags {
        self.flags
    }
}

impl Canvas for MemoryCanvas {
    fn name(&self) -> String {
        self.name.read().clone()
    }

    fn set_name(&self, name: &str) {
        *self.name.write() = name.to_string();
    }

    fn video_info(&self) -> Option<VideoInfo> {
        Some(self.video)
    }

    fn set_channel(&self, channel: u32, source: Option<SourceRef>) {
        if channel >= MAX_CHANNELS {
            return;
        }

        let mut channels = self.channels.write();
        match source {
            Some(source) => {
                channels.insert(channel, source);
            }
            None => {
                channels.remove(&channel);
            }
        }
    }

    fn channel(&self, channel: u32) -> Option<SourceRef> {
        self.channels.read().get(&channel).cloned()
    }
}

impl std::fmt::Debug for MemoryCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCanvas")
            .field("name", &*self.name.read())
            .field("video", &self.video)
            .field("flags", &self.flags)
            .field("channel_count", &self.channels.read().len())
            .finish()
    }
}

/// Factory producing [`MemoryCanvas`] instances.
///
/// Rejects video info with a zero dimension or rate term.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryCanvasFactory;

impl MemoryCanvasFactory {
    /// Creates a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CanvasFactory for MemoryCanvasFactory {
    fn create_canvas(
        &self,
        name: &str,
        video: &VideoInfo,
        flags: CanvasFlags,
    ) -> Result<CanvasRef, CanvasError> {
        if !video.is_valid() {
            return Err(CanvasError::new(name, "invalid video info"));
        }
        Ok(Arc::new(MemoryCanvas::new(name, *video, flags)))
    }
}
