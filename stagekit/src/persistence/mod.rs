//! Saving and loading stages.
//!
//! A saved stage is a [`StageData`] record with the keys `name`, `flags`,
//! `uuid` and, when the canvas reports them, `base_width`, `base_height`,
//! `output_width`, `output_height`, `fps_num` and `fps_den`. Ephemeral
//! stages are never saved, and `MAIN` is never restored.

mod data;

pub use data::StageData;

use crate::errors::StageError;
use crate::flags::StageFlags;
use crate::media::VideoInfo;
use crate::registry::StageRegistry;
use crate::stage::Stage;
use crate::utils::parse_uuid;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Saves a stage. Returns `None` for ephemeral stages.
#[must_use]
pub fn save_stage(stage: &Stage) -> Option<StageData> {
    if stage.flags().contains(StageFlags::EPHEMERAL) {
        return None;
    }

    let mut data = StageData::new();
    data.set_string("name", stage.name());
    data.set_int("flags", i64::from(stage.flags().bits()));
    data.set_string("uuid", stage.uuid().to_string());

    if let Some(video) = stage.video_info() {
        data.set_int("base_width", i64::from(video.base_width));
        data.set_int("base_height", i64::from(video.base_height));
        data.set_int("output_width", i64::from(video.output_width));
        data.set_int("output_height", i64::from(video.output_height));
        data.set_int("fps_num", i64::from(video.fps_num));
        data.set_int("fps_den", i64::from(video.fps_den));
    }

    Some(data)
}

fn stored_u32(data: &StageData, key: &str) -> u32 {
    u32::try_from(data.get_int(key)).unwrap_or(0)
}

impl Stage {
    /// Saves this stage. See [`save_stage`].
    #[must_use]
    pub fn save(&self) -> Option<StageData> {
        save_stage(self)
    }
}

impl StageRegistry {
    /// Recreates a public stage from a saved record.
    ///
    /// `MAIN` is stripped from the stored flags. The stored UUID is reused
    /// unless it is malformed or already taken by a live stage; the check
    /// and the insert are atomic, so concurrent loads of one record end up
    /// with distinct UUIDs. Missing
    /// geometry reads as zero, which the canvas factory may reject.
    pub fn load_stage(self: &Arc<Self>, data: &StageData) -> Option<Stage> {
        match self.try_load_stage(data) {
            Ok(stage) => Some(stage),
            Err(e) => {
                debug!(stage = %data.get_string("name"), code = e.code(), "Failed to load stage: {}", e);
                None
            }
        }
    }

    /// Like [`load_stage`](Self::load_stage) but reports why loading failed.
    pub fn try_load_stage(self: &Arc<Self>, data: &StageData) -> Result<Stage, StageError> {
        let name = data.get_string("name");
        let flags = StageFlags::from_stored(data.get_int("flags")).without_main();
        let uuid = parse_uuid(data.get_string("uuid"));

        let video = VideoInfo {
            base_width: stored_u32(data, "base_width"),
            base_height: stored_u32(data, "base_height"),
            output_width: stored_u32(data, "output_width"),
            output_height: stored_u32(data, "output_height"),
            fps_num: stored_u32(data, "fps_num"),
            fps_den: stored_u32(data, "fps_den"),
        };

        self.create_internal(name, uuid, Some(&video), flags, false)
    }

    /// Saves every non-private, non-ephemeral stage, oldest first.
    #[must_use]
    pub fn save_stages(&self) -> Vec<StageData> {
        let mut saved: Vec<StageData> = self
            .stages()
            .iter()
            .filter(|stage| !stage.is_private())
            .filter_map(save_stage)
            .collect();
        saved.reverse();
        saved
    }

    /// Loads every record, skipping the ones that fail.
    pub fn load_stages(self: &Arc<Self>, records: &[StageData]) -> Vec<Stage> {
        records
            .iter()
            .filter_map(|data| self.load_stage(data))
            .collect()
    }

    /// Writes [`save_stages`](Self::save_stages) to `path` as a JSON array.
    /// Returns the number of stages written.
    pub fn save_stages_to_file(&self, path: impl AsRef<Path>) -> Result<usize, StageError> {
        let path = path.as_ref();
        let records = self.save_stages();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;

        info!(path = %path.display(), stages = records.len(), "Saved stages");
        Ok(records.len())
    }

    /// Reads a JSON array written by
    /// [`save_stages_to_file`](Self::save_stages_to_file) and loads it.
    pub fn load_stages_from_file(self: &Arc<Self>, path: impl AsRef<Path>) -> Result<Vec<Stage>, StageError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let records: Vec<StageData> = serde_json::from_str(&json)?;
        let stages = self.load_stages(&records);

        info!(
            path = %path.display(),
            stages = stages.len(),
            skipped = records.len() - stages.len(),
            "Loaded stages"
        );
        Ok(stages)
    }
}
