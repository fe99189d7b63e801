//! Stages: named production units bundling one canvas and a set of outputs.
//!
//! A [`Stage`] is a strong handle; a [`WeakStage`] observes one without
//! keeping it usable. Stages are created through a
//! [`StageRegistry`](crate::registry::StageRegistry) and destroyed when the
//! last strong handle is released.
//!
//! Every state change is announced on the stage's own [`SignalHandler`]
//! and, for non-private stages, on the registry's global one. Notifications
//! are always dispatched after any stage lock has been released, so handlers
//! may call back into the stage.

mod control;
mod lifecycle;
mod outputs;

pub use control::{Stage, WeakStage};
pub(crate) use control::StageControl;

use crate::events::{SignalHandler, StageEventKind};
use crate::flags::StageFlags;
use crate::media::{CanvasRef, OutputRef, SourceRef, VideoInfo, SCENE_CHANNEL};
use crate::registry::{StageId, StageRegistry};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use uuid::Uuid;

/// Stage state shared by every handle.
pub(crate) struct StageInner {
    uuid: Uuid,
    name: RwLock<String>,
    flags: StageFlags,
    private: bool,
    id: OnceLock<StageId>,
    registry: Weak<StageRegistry>,
    signals: SignalHandler,
    /// Serializes changes to `outputs`; held across bulk start/stop.
    output_lock: Mutex<()>,
    /// Attached outputs. Replaced wholesale on every change, so readers
    /// never wait on I/O and each attachment is owned exactly once.
    outputs: RwLock<Arc<[OutputRef]>>,
    canvas: RwLock<Option<CanvasRef>>,
    destroyed: AtomicBool,
    removed: AtomicBool,
}

impl StageInner {
    pub(crate) fn new(
        name: &str,
        uuid: Uuid,
        flags: StageFlags,
        private: bool,
        registry: Weak<StageRegistry>,
        signals: SignalHandler,
        canvas: CanvasRef,
    ) -> Self {
        Self {
            uuid,
            name: RwLock::new(name.to_string()),
            flags,
            private,
            id: OnceLock::new(),
            registry,
            signals,
            output_lock: Mutex::new(()),
            outputs: RwLock::new(Arc::from(Vec::<OutputRef>::new())),
            canvas: RwLock::new(Some(canvas)),
            destroyed: AtomicBool::new(false),
            removed: AtomicBool::new(false),
        }
    }

    pub(crate) fn name(&self) -> String {
        self.name.read().clone()
    }

    pub(crate) fn name_eq(&self, name: &str) -> bool {
        *self.name.read() == name
    }

    pub(crate) const fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub(crate) const fn flags(&self) -> StageFlags {
        self.flags
    }

    pub(crate) const fn is_private(&self) -> bool {
        self.private
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn id(&self) -> Option<StageId> {
        self.id.get().copied()
    }

    pub(crate) fn set_id(&self, id: StageId) {
        // Set exactly once, right after the registry insert.
        let _ = self.id.set(id);
    }

    pub(crate) fn registry(&self) -> Option<Arc<StageRegistry>> {
        self.registry.upgrade()
    }

    pub(crate) fn canvas(&self) -> Option<CanvasRef> {
        self.canvas.read().clone()
    }

    /// Installs a new output list. Called with `output_lock` held; the
    /// previous list is dropped once no reader holds it.
    fn publish(&self, outputs: Vec<OutputRef>) {
        *self.outputs.write() = Arc::from(outputs);
    }

    fn snapshot(&self) -> Arc<[OutputRef]> {
        self.outputs.read().clone()
    }
}

impl Stage {
    /// Returns the stage's current name.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner().name()
    }

    /// Returns the stage's stable UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.inner().uuid()
    }

    /// Returns the stage's flags.
    #[must_use]
    pub fn flags(&self) -> StageFlags {
        self.inner().flags()
    }

    /// Returns true if the stage is excluded from global notifications.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.inner().is_private()
    }

    /// Returns true once the stage has been torn down.
    ///
    /// A handle can observe this after a registry-wide teardown.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner().is_destroyed()
    }

    /// Returns true once [`remove`](Self::remove) has been called.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.inner().removed.load(Ordering::Acquire)
    }

    /// Returns the stage-local signal endpoint.
    #[must_use]
    pub fn signal_handler(&self) -> &SignalHandler {
        &self.inner().signals
    }

    /// Renames the stage.
    ///
    /// Ignored for empty names, the `MAIN` stage, destroyed stages and
    /// unchanged names. Otherwise the canvas is renamed too and `rename`
    /// (plus `stage_rename` for public stages) fires with both names.
    pub fn set_name(&self, name: &str) {
        let stage = self.inner();
        if name.is_empty() || stage.flags.contains(StageFlags::MAIN) || stage.is_destroyed() {
            return;
        }

        let prev_name = {
            let mut current = stage.name.write();
            if *current == name {
                return;
            }
            std::mem::replace(&mut *current, name.to_string())
        };

        if let Some(canvas) = stage.canvas() {
            canvas.set_name(name);
        }

        self.control.notify(StageEventKind::Renamed {
            new_name: name.to_string(),
            prev_name,
        });
    }

    /// Flags the stage as removed by the user and fires `remove` once.
    ///
    /// Holders are expected to drop their handles in response; the stage
    /// itself stays alive until they do.
    pub fn remove(&self) {
        let stage = self.inner();
        if stage.is_destroyed() || stage.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.control.notify(StageEventKind::Removed);
    }

    /// Returns the stage's canvas. `None` only after destruction.
    #[must_use]
    pub fn canvas(&self) -> Option<CanvasRef> {
        self.inner().canvas()
    }

    /// Returns the canvas' video configuration.
    #[must_use]
    pub fn video_info(&self) -> Option<VideoInfo> {
        self.canvas().and_then(|canvas| canvas.video_info())
    }

    /// Places a scene (or clears it) on the canvas' primary channel.
    pub fn set_scene(&self, scene: Option<SourceRef>) {
        if let Some(canvas) = self.canvas() {
            canvas.set_channel(SCENE_CHANNEL, scene);
        }
    }

    /// Returns the source on the canvas' primary channel.
    #[must_use]
    pub fn scene_source(&self) -> Option<SourceRef> {
        self.canvas()
            .and_then(|canvas| canvas.channel(SCENE_CHANNEL))
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::StageFlags;
    use crate::media::{same_source, SourceRef, VideoInfo};
    use crate::registry::StageRegistry;
    use crate::testing::{EventRecorder, NamedSource};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_accessors() {
        let registry = StageRegistry::new();
        let video = VideoInfo::new(1280, 720, 60, 1);
        let stage = registry
            .create("Vertical", Some(&video), StageFlags::MIX_AUDIO)
            .unwrap();

        assert_eq!(stage.name(), "Vertical");
        assert_eq!(stage.flags(), StageFlags::MIX_AUDIO);
        assert!(!stage.is_private());
        assert_eq!(stage.video_info(), Some(video));
        assert_eq!(stage.canvas().unwrap().name(), "Vertical");
        assert!(stage.id().is_some());
    }

    #[test]
    fn test_rename_propagates_and_notifies() {
        let registry = StageRegistry::new();
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();
        let local = EventRecorder::attach(stage.signal_handler());
        let global = EventRecorder::attach(registry.signal_handler());

        stage.set_name("B");

        assert_eq!(stage.name(), "B");
        assert_eq!(stage.canvas().unwrap().name(), "B");
        assert_eq!(local.names(), vec!["rename".to_string()]);
        assert_eq!(global.names(), vec!["stage_rename".to_string()]);
        assert_eq!(
            local.renames(),
            vec![("B".to_string(), "A".to_string())]
        );
    }

    #[test]
    fn test_rename_noops() {
        let registry = StageRegistry::new();
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();
        let local = EventRecorder::attach(stage.signal_handler());

        stage.set_name("");
        stage.set_name("A");

        assert_eq!(stage.name(), "A");
        assert!(local.is_empty());
    }

    #[test]
    fn test_rename_main_is_noop() {
        let registry = StageRegistry::new();
        let main = registry.create_main("Main", None).unwrap();
        let local = EventRecorder::attach(main.signal_handler());

        main.set_name("Other");

        assert_eq!(main.name(), "Main");
        assert!(main.flags().contains(StageFlags::MAIN));
        assert!(local.is_empty());
    }

    #[test]
    fn test_private_rename_stays_local() {
        let registry = StageRegistry::new();
        let stage = registry.create_private("hidden", None, StageFlags::empty()).unwrap();
        let local = EventRecorder::attach(stage.signal_handler());
        let global = EventRecorder::attach(registry.signal_handler());

        stage.set_name("still hidden");

        assert_eq!(local.len(), 1);
        assert!(global.is_empty());
    }

    #[test]
    fn test_remove_fires_once() {
        let registry = StageRegistry::new();
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();
        let local = EventRecorder::attach(stage.signal_handler());
        let global = EventRecorder::attach(registry.signal_handler());

        stage.remove();
        stage.remove();

        assert!(stage.is_removed());
        assert_eq!(local.names(), vec!["remove".to_string()]);
        assert!(global.is_empty());
    }

    #[test]
    fn test_scene_assignment() {
        let registry = StageRegistry::new();
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();
        let scene: SourceRef = Arc::new(NamedSource::new("Scene"));

        assert!(stage.scene_source().is_none());
        stage.set_scene(Some(Arc::clone(&scene)));
        assert!(same_source(&stage.scene_source().unwrap(), &scene));
        stage.set_scene(None);
        assert!(stage.scene_source().is_none());
    }
}
