//! Stage teardown and the notification protocol.

use super::{StageControl, WeakStage};
use crate::events::{StageEvent, StageEventKind};
use crate::registry::StageRegistry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

impl StageControl {
    /// Sends `kind` to the local endpoint and, for public stages, to the
    /// registry's global endpoint.
    ///
    /// Each endpoint only receives the kinds it carries a signal for.
    /// Callers must not hold any stage lock.
    pub(crate) fn dispatch(self: &Arc<Self>, kind: StageEventKind, registry: Option<&StageRegistry>) {
        let stage = &self.stage;
        let event = StageEvent::new(
            kind,
            WeakStage::from_control(self),
            stage.name(),
            stage.uuid(),
        );

        if event.kind.local_signal().is_some() {
            stage.signals.emit(&event);
        }

        if stage.is_private() || event.kind.global_signal().is_none() {
            return;
        }

        match registry {
            Some(registry) => registry.signal_handler().emit(&event),
            None => {
                if let Some(registry) = stage.registry() {
                    registry.signal_handler().emit(&event);
                }
            }
        }
    }

    pub(crate) fn notify(self: &Arc<Self>, kind: StageEventKind) {
        self.dispatch(kind, None);
    }

    /// Tears the stage down. Runs at most once; returns false if it
    /// already ran.
    ///
    /// `destroy` fires first, while the stage is still intact; then the
    /// outputs are stopped and released, the canvas is released, and the
    /// stage is unlinked from the registry.
    pub(crate) fn destroy(self: &Arc<Self>, registry: Option<&StageRegistry>) -> bool {
        let stage = &self.stage;
        if stage.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.dispatch(StageEventKind::Destroyed, registry);

        {
            let _guard = stage.output_lock.lock();
            for output in stage.snapshot().iter() {
                if output.is_active() {
                    output.stop();
                }
            }
            stage.publish(Vec::new());
        }

        // Dropping the last handle releases the canvas.
        let canvas = stage.canvas.write().take();
        drop(canvas);

        if let Some(id) = stage.id() {
            match registry {
                Some(registry) => registry.unlink(id),
                None => {
                    if let Some(registry) = stage.registry() {
                        registry.unlink(id);
                    }
                }
            }
        }

        debug!(
            "{}stage '{}' destroyed",
            if stage.is_private() { "private " } else { "" },
            stage.name()
        );

        stage.signals.disconnect_all();
        true
    }
}
