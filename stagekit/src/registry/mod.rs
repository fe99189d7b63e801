//! The stage registry.
//!
//! A [`StageRegistry`] tracks every live stage, creates stages through its
//! [`CanvasFactory`], and owns the global notification endpoint. Stages
//! hold only a weak link back to it, so dropping the last `Arc` to the
//! registry tears down whatever stages are still alive.

mod arena;
#[cfg(test)]
mod integration_tests;

pub use arena::StageId;

use crate::config::RegistryConfig;
use crate::errors::StageError;
use crate::events::{SignalHandler, SignalScope, StageEventKind};
use crate::flags::{CanvasFlags, StageFlags};
use crate::media::{CanvasFactory, MemoryCanvasFactory, VideoInfo};
use crate::stage::{Stage, StageControl, StageInner};
use crate::utils::generate_uuid;
use arena::Arena;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Registry of live stages.
pub struct StageRegistry {
    config: RegistryConfig,
    canvas_factory: Arc<dyn CanvasFactory>,
    stages: Mutex<Arena<Arc<StageControl>>>,
    signals: SignalHandler,
    shut_down: AtomicBool,
}

impl StageRegistry {
    /// Creates a registry backed by in-memory canvases.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates a registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Arc<Self> {
        Self::with_canvas_factory(config, Arc::new(MemoryCanvasFactory::new()))
    }

    /// Creates a registry that builds canvases with `canvas_factory`.
    #[must_use]
    pub fn with_canvas_factory(
        config: RegistryConfig,
        canvas_factory: Arc<dyn CanvasFactory>,
    ) -> Arc<Self> {
        let signals = SignalHandler::new(SignalScope::Global, config.effective_signal_capacity());
        Arc::new(Self {
            config,
            canvas_factory,
            stages: Mutex::new(Arena::new()),
            signals,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Returns the registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the global notification endpoint.
    #[must_use]
    pub fn signal_handler(&self) -> &SignalHandler {
        &self.signals
    }

    /// Creates a public stage. `MAIN` is stripped from `flags`.
    ///
    /// Returns `None` if the name is empty, the canvas cannot be created,
    /// or the registry has been shut down. Nothing is left behind on
    /// failure.
    pub fn create(
        self: &Arc<Self>,
        name: &str,
        video: Option<&VideoInfo>,
        flags: StageFlags,
    ) -> Option<Stage> {
        self.create_or_log(name, None, video, flags.without_main(), false)
    }

    /// Creates a stage that never appears on the global endpoint.
    /// `MAIN` is stripped from `flags`.
    pub fn create_private(
        self: &Arc<Self>,
        name: &str,
        video: Option<&VideoInfo>,
        flags: StageFlags,
    ) -> Option<Stage> {
        self.create_or_log(name, None, video, flags.without_main(), true)
    }

    /// Creates the protected main stage (`MAIN | MIX_AUDIO`), whose name
    /// cannot be changed.
    pub fn create_main(self: &Arc<Self>, name: &str, video: Option<&VideoInfo>) -> Option<Stage> {
        self.create_or_log(
            name,
            None,
            video,
            StageFlags::MAIN | StageFlags::MIX_AUDIO,
            false,
        )
    }

    /// Like [`create`](Self::create) but reports why creation failed.
    pub fn try_create(
        self: &Arc<Self>,
        name: &str,
        video: Option<&VideoInfo>,
        flags: StageFlags,
    ) -> Result<Stage, StageError> {
        self.create_internal(name, None, video, flags.without_main(), false)
    }

    fn create_or_log(
        self: &Arc<Self>,
        name: &str,
        uuid: Option<Uuid>,
        video: Option<&VideoInfo>,
        flags: StageFlags,
        private: bool,
    ) -> Option<Stage> {
        match self.create_internal(name, uuid, video, flags, private) {
            Ok(stage) => Some(stage),
            Err(e) => {
                debug!(stage = %name, code = e.code(), "Failed to create stage: {}", e);
                None
            }
        }
    }

    /// Builds a stage and links it. Every completed step is undone if a
    /// later one fails.
    pub(crate) fn create_internal(
        self: &Arc<Self>,
        name: &str,
        uuid: Option<Uuid>,
        video: Option<&VideoInfo>,
        flags: StageFlags,
        private: bool,
    ) -> Result<Stage, StageError> {
        if self.is_shut_down() {
            return Err(StageError::ShutDown);
        }
        if name.is_empty() {
            return Err(StageError::invalid_argument("stage name must not be empty"));
        }

        let signals = SignalHandler::new(SignalScope::Local, self.config.effective_signal_capacity());
        let video = video.copied().unwrap_or(self.config.default_video);

        let canvas = self
            .canvas_factory
            .create_canvas(name, &video, CanvasFlags::from(flags))
            .map_err(|e| {
                debug!(stage = %name, "Rolling back stage creation: {}", e);
                e
            })?;

        let control = {
            let mut stages = self.stages.lock();
            // Shutdown may have raced with canvas creation.
            if self.is_shut_down() {
                return Err(StageError::ShutDown);
            }
            // Checked under the lock so two loads of one record cannot
            // both keep its UUID.
            let uuid = match uuid {
                Some(uuid) if !stages.iter().any(|control| control.stage.uuid() == uuid) => uuid,
                _ => generate_uuid(),
            };
            let control = StageControl::new(StageInner::new(
                name,
                uuid,
                flags,
                private,
                Arc::downgrade(self),
                signals,
                canvas,
            ));
            let id = stages.insert(Arc::clone(&control));
            control.stage.set_id(id);
            control
        };

        let stage = Stage::adopt(control);
        self.announce_created(&stage);

        debug!(
            "{}stage '{}' created",
            if private { "private " } else { "" },
            name
        );
        Ok(stage)
    }

    /// Fires `Created` outside the registry lock. A concurrent
    /// [`destroy_all`](Self::destroy_all) may already have torn the stage
    /// down, in which case nothing is announced.
    fn announce_created(&self, stage: &Stage) {
        if stage.control.stage.is_destroyed() {
            return;
        }
        stage.control.dispatch(StageEventKind::Created, Some(self));
    }

    /// Visits every stage, private ones included, newest first.
    ///
    /// The visitor returns `false` to stop. Handles are collected under the
    /// registry lock and visited after it is released, so the visitor may
    /// call back into the registry. Stages destroyed in the meantime are
    /// skipped.
    pub fn enumerate<F>(&self, mut visitor: F)
    where
        F: FnMut(&Stage) -> bool,
    {
        for control in self.snapshot() {
            let Some(stage) = control.try_acquire() else {
                continue;
            };
            if !visitor(&stage) {
                break;
            }
        }
    }

    /// Returns strong handles to every live stage, newest first.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.snapshot()
            .iter()
            .filter_map(StageControl::try_acquire)
            .collect()
    }

    /// Finds the newest stage named `name`.
    ///
    /// Returns `None` for an empty name, when nothing matches, or when the
    /// matching stage is being destroyed.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Stage> {
        if name.is_empty() {
            return None;
        }
        let found = self
            .stages
            .lock()
            .newest_first()
            .into_iter()
            .find(|control| control.stage.name_eq(name))
            .cloned();
        found?.try_acquire()
    }

    /// Finds the stage with the given UUID.
    #[must_use]
    pub fn find_by_uuid(&self, uuid: &Uuid) -> Option<Stage> {
        let found = self
            .stages
            .lock()
            .iter()
            .find(|control| control.stage.uuid() == *uuid)
            .cloned();
        found?.try_acquire()
    }

    /// Returns the stage in slot `id`, unless that stage is gone.
    #[must_use]
    pub fn get(&self, id: StageId) -> Option<Stage> {
        let found = self.stages.lock().get(id).cloned();
        found?.try_acquire()
    }

    /// Returns the number of linked stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.lock().len()
    }

    /// Returns true if no stage is linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.lock().is_empty()
    }

    /// Destroys every stage, regardless of outstanding handles.
    ///
    /// Handles that outlive this call observe a destroyed stage.
    pub fn destroy_all(&self) {
        let drained = self.stages.lock().drain();
        for control in drained {
            control.destroy(Some(self));
        }
    }

    /// Refuses further creation and destroys every stage.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let count = self.len();
        self.destroy_all();
        info!(stages = count, "Stage registry shut down");
    }

    /// Returns true once [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub(crate) fn unlink(&self, id: StageId) {
        self.stages.lock().remove(id);
    }

    fn snapshot(&self) -> Vec<Arc<StageControl>> {
        self.stages
            .lock()
            .newest_first()
            .into_iter()
            .cloned()
            .collect()
    }
}

impl Drop for StageRegistry {
    fn drop(&mut self) {
        self.shut_down.store(true, Ordering::Release);
        self.destroy_all();
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.len())
            .field("shut_down", &self.is_shut_down())
            .field("config", &self.config)
            .finish()
    }
}

static STAGE_REGISTRY: RwLock<Option<Arc<StageRegistry>>> = RwLock::new(None);

/// Installs the process-wide registry, returning the one it replaces.
pub fn set_stage_registry(registry: Arc<StageRegistry>) -> Option<Arc<StageRegistry>> {
    STAGE_REGISTRY.write().replace(registry)
}

/// Gets the process-wide registry, creating a default one on first use.
pub fn get_stage_registry() -> Arc<StageRegistry> {
    let read = STAGE_REGISTRY.read();
    if let Some(ref registry) = *read {
        return Arc::clone(registry);
    }
    drop(read);

    let mut write = STAGE_REGISTRY.write();
    Arc::clone(write.get_or_insert_with(StageRegistry::new))
}

/// Shuts down and forgets the process-wide registry.
pub fn shutdown_stage_registry() {
    let registry = STAGE_REGISTRY.write().take();
    if let Some(registry) = registry {
        registry.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EventRecorder;
    use pretty_assertions::assert_eq;

    fn names(registry: &StageRegistry) -> Vec<String> {
        registry.stages().iter().map(Stage::name).collect()
    }

    #[test]
    fn test_taken_uuid_is_replaced() {
        let registry = StageRegistry::new();
        let first = registry.create("A", None, StageFlags::empty()).unwrap();

        let copy = registry
            .create_internal("B", Some(first.uuid()), None, StageFlags::empty(), false)
            .unwrap();
        assert_ne!(copy.uuid(), first.uuid());

        let uuid = first.uuid();
        drop(first);
        let reused = registry
            .create_internal("C", Some(uuid), None, StageFlags::empty(), false)
            .unwrap();
        assert_eq!(reused.uuid(), uuid);
    }

    #[test]
    fn test_created_not_announced_after_teardown() {
        let registry = StageRegistry::new();
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();
        let global = EventRecorder::attach(registry.signal_handler());
        let local = EventRecorder::attach(stage.signal_handler());
        registry.destroy_all();

        registry.announce_created(&stage);

        assert_eq!(global.names(), vec!["stage_destroy".to_string()]);
        assert_eq!(local.names(), vec!["destroy".to_string()]);
    }

    #[test]
    fn test_enumerate_newest_first() {
        let registry = StageRegistry::new();
        let _a = registry.create("A", None, StageFlags::empty()).unwrap();
        let _b = registry.create("B", None, StageFlags::empty()).unwrap();
        let _c = registry.create_private("C", None, StageFlags::empty()).unwrap();

        let mut visited = Vec::new();
        registry.enumerate(|stage| {
            visited.push(stage.name());
            true
        });
        assert_eq!(visited, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_enumerate_stops_early() {
        let registry = StageRegistry::new();
        let _a = registry.create("A", None, StageFlags::empty()).unwrap();
        let _b = registry.create("B", None, StageFlags::empty()).unwrap();
        let _c = registry.create("C", None, StageFlags::empty()).unwrap();

        let mut visited = Vec::new();
        registry.enumerate(|stage| {
            visited.push(stage.name());
            stage.name() != "B"
        });
        assert_eq!(visited, vec!["C", "B"]);
    }

    #[test]
    fn test_find_by_name() {
        let registry = StageRegistry::new();
        let _old = registry.create("dup", None, StageFlags::EPHEMERAL).unwrap();
        let _new = registry.create("dup", None, StageFlags::empty()).unwrap();

        assert!(registry.find_by_name("x").is_none());
        assert!(registry.find_by_name("").is_none());
        let found = registry.find_by_name("dup").unwrap();
        assert_eq!(found.flags(), StageFlags::empty());
        assert_eq!(found.strong_count(), 2);
    }

    #[test]
    fn test_find_by_uuid() {
        let registry = StageRegistry::new();
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();

        let found = registry.find_by_uuid(&stage.uuid()).unwrap();
        assert!(Stage::ptr_eq(&stage, &found));
        assert!(registry.find_by_uuid(&generate_uuid()).is_none());
    }

    #[test]
    fn test_release_unlinks() {
        let registry = StageRegistry::new();
        let a = registry.create("A", None, StageFlags::empty()).unwrap();
        let _b = registry.create("B", None, StageFlags::empty()).unwrap();
        assert_eq!(registry.len(), 2);

        drop(a);

        assert_eq!(registry.len(), 1);
        assert_eq!(names(&registry), vec!["B"]);
    }

    #[test]
    fn test_slot_reuse_gets_new_id() {
        let registry = StageRegistry::new();
        let a = registry.create("A", None, StageFlags::empty()).unwrap();
        let first = a.id().unwrap();
        drop(a);

        let b = registry.create("B", None, StageFlags::empty()).unwrap();
        let second = b.id().unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert!(Stage::ptr_eq(&registry.get(second).unwrap(), &b));
        assert!(Arc::ptr_eq(&b.registry().unwrap(), &registry));
    }

    #[test]
    fn test_destroy_all_invalidates_handles() {
        let registry = StageRegistry::new();
        let global = EventRecorder::attach(registry.signal_handler());
        let a = registry.create("A", None, StageFlags::empty()).unwrap();
        let b = registry.create("B", None, StageFlags::empty()).unwrap();
        global.clear();

        registry.destroy_all();

        assert!(registry.is_empty());
        assert!(a.is_destroyed());
        assert!(b.get_ref().is_none());
        assert_eq!(global.count("stage_destroy"), 2);

        // Late releases find nothing left to destroy.
        assert!(!a.release());
        assert_eq!(global.count("stage_destroy"), 2);
        assert!(!registry.is_shut_down());
    }

    #[test]
    fn test_shutdown_refuses_creation() {
        let registry = StageRegistry::new();
        let _a = registry.create("A", None, StageFlags::empty()).unwrap();

        registry.shutdown();

        assert!(registry.is_shut_down());
        assert!(registry.is_empty());
        assert!(registry.create("B", None, StageFlags::empty()).is_none());
        assert!(matches!(
            registry.try_create("B", None, StageFlags::empty()),
            Err(StageError::ShutDown)
        ));
    }

    #[test]
    fn test_default_video_from_config() {
        let video = VideoInfo::new(1280, 720, 60, 1);
        let registry = StageRegistry::with_config(RegistryConfig::default().with_default_video(video));
        let stage = registry.create("A", None, StageFlags::empty()).unwrap();

        assert_eq!(stage.video_info(), Some(video));
    }

    #[test]
    fn test_create_main() {
        let registry = StageRegistry::new();
        let global = EventRecorder::attach(registry.signal_handler());
        let main = registry.create_main("Main", None).unwrap();

        assert_eq!(main.flags(), StageFlags::MAIN | StageFlags::MIX_AUDIO);
        assert_eq!(global.names(), vec!["stage_create".to_string()]);
    }

    #[test]
    fn test_global_registry_accessors() {
        let registry = StageRegistry::new();
        set_stage_registry(Arc::clone(&registry));
        assert!(Arc::ptr_eq(&get_stage_registry(), &registry));

        let stage = get_stage_registry()
            .create("global", None, StageFlags::empty())
            .unwrap();
        shutdown_stage_registry();

        assert!(registry.is_shut_down());
        assert!(stage.is_destroyed());
        assert!(!Arc::ptr_eq(&get_stage_registry(), &registry));
        shutdown_stage_registry();
    }
}
