//! Strong and weak stage handles.
//!
//! Every stage lives in a [`StageControl`] block shared by all handles. The
//! block carries two counters:
//!
//! - the **strong** count: the stage is usable while it is non-zero, and the
//!   release that brings it to zero tears the stage down;
//! - the **weak** count: one unit is held collectively by the strong side
//!   and one per [`WeakStage`]. It only reports when the block itself is no
//!   longer observed; memory is reclaimed by the `Arc` once every handle is
//!   gone.
//!
//! Upgrading a weak handle is a compare-and-swap on the strong count that
//! refuses to move it off zero, combined with the stage's destroyed flag.

use super::StageInner;
use crate::registry::{StageId, StageRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Shared control block for one stage.
pub(crate) struct StageControl {
    strong: AtomicUsize,
    weak: AtomicUsize,
    pub(crate) stage: StageInner,
}

impl StageControl {
    /// Wraps a freshly built stage; the caller owns the first strong count.
    pub(crate) fn new(stage: StageInner) -> Arc<Self> {
        Arc::new(Self {
            strong: AtomicUsize::new(1),
            weak: AtomicUsize::new(1),
            stage,
        })
    }

    /// Acquires a strong handle if the stage is still alive.
    pub(crate) fn try_acquire(self: &Arc<Self>) -> Option<Stage> {
        let mut current = self.strong.load(Ordering::Acquire);
        loop {
            if current == 0 || self.stage.is_destroyed() {
                return None;
            }
            match self.strong.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(Stage::adopt(Arc::clone(self))),
                Err(actual) => current = actual,
            }
        }
    }

    fn add_weak(&self) {
        self.weak.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns true when this was the last weak unit.
    fn release_weak(&self) -> bool {
        self.weak.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Drops one strong count; the last one destroys the stage.
    fn release_strong(self: &Arc<Self>) -> bool {
        let registry = self
            .stage
            .registry()
            .filter(|registry| !registry.is_shut_down());
        let Some(registry) = registry else {
            warn!(
                stage = %self.stage.name(),
                "Tried to release a stage after its registry was shut down"
            );
            return false;
        };

        if self.strong.fetch_sub(1, Ordering::AcqRel) != 1 {
            return false;
        }

        let destroyed = self.destroy(Some(registry.as_ref()));
        self.release_weak();
        destroyed
    }
}

/// A strong, owning handle to a stage.
///
/// Cloning adds a strong reference; dropping (or [`release`](Self::release))
/// removes one. When the last strong handle goes away the stage stops and
/// releases its outputs, releases its canvas and leaves the registry.
pub struct Stage {
    pub(crate) control: Arc<StageControl>,
    released: bool,
}

impl Stage {
    /// Takes ownership of a strong count that was already added.
    pub(crate) fn adopt(control: Arc<StageControl>) -> Self {
        Self {
            control,
            released: false,
        }
    }

    pub(crate) fn inner(&self) -> &StageInner {
        &self.control.stage
    }

    /// Releases this handle. Returns true if it destroyed the stage; a
    /// stage already torn down by the registry reports false.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.control.release_strong()
    }

    /// Acquires a new strong handle, or `None` if the stage was destroyed.
    #[must_use]
    pub fn get_ref(&self) -> Option<Self> {
        self.control.try_acquire()
    }

    /// Returns a weak observer for this stage.
    #[must_use]
    pub fn weak(&self) -> WeakStage {
        WeakStage::from_control(&self.control)
    }

    /// Returns the registry slot of this stage, once it has been linked.
    #[must_use]
    pub fn id(&self) -> Option<StageId> {
        self.inner().id()
    }

    /// Returns the current strong count. Diagnostic only.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        self.control.strong.load(Ordering::Acquire)
    }

    /// Returns the current weak count. Diagnostic only.
    #[must_use]
    pub fn weak_count(&self) -> usize {
        self.control.weak.load(Ordering::Acquire)
    }

    /// Returns true if both handles refer to the same stage.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.control, &b.control)
    }

    /// Returns the owning registry while it is alive.
    #[must_use]
    pub fn registry(&self) -> Option<Arc<StageRegistry>> {
        self.inner().registry()
    }
}

impl Clone for Stage {
    fn clone(&self) -> Self {
        self.control.strong.fetch_add(1, Ordering::Relaxed);
        Self::adopt(Arc::clone(&self.control))
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        if !self.released {
            self.control.release_strong();
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = self.inner();
        f.debug_struct("Stage")
            .field("name", &stage.name())
            .field("uuid", &stage.uuid())
            .field("flags", &stage.flags())
            .field("private", &stage.is_private())
            .field("strong", &self.strong_count())
            .finish()
    }
}

/// A weak observer of a stage.
///
/// Does not keep the stage usable; [`upgrade`](Self::upgrade) yields a strong
/// handle only while the stage has not been destroyed.
pub struct WeakStage {
    control: Arc<StageControl>,
    released: bool,
}

impl WeakStage {
    pub(crate) fn from_control(control: &Arc<StageControl>) -> Self {
        control.add_weak();
        Self {
            control: Arc::clone(control),
            released: false,
        }
    }

    /// Returns a strong handle if the stage is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Stage> {
        self.control.try_acquire()
    }

    /// Returns true once the stage has been destroyed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.control.strong.load(Ordering::Acquire) == 0 || self.control.stage.is_destroyed()
    }

    /// Returns true if this observer refers to `stage`.
    #[must_use]
    pub fn references(&self, stage: &Stage) -> bool {
        Arc::ptr_eq(&self.control, &stage.control)
    }

    /// Releases this observer. Returns true if no observers remain on the
    /// control block, strong side included.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.control.release_weak()
    }
}

impl Clone for WeakStage {
    fn clone(&self) -> Self {
        Self::from_control(&self.control)
    }
}

impl Drop for WeakStage {
    fn drop(&mut self) {
        if !self.released {
            self.control.release_weak();
        }
    }
}

impl std::fmt::Debug for WeakStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakStage")
            .field("name", &self.control.stage.name())
            .field("expired", &self.is_expired())
            .finish()
    }
}
