//! Output attachment: add, remove, index, start and stop.
//!
//! Changes to the output list are serialized by a per-stage lock and
//! installed as a fresh list. Readers (`output_count`, `output`, `outputs`,
//! `any_output_active`) take the current list and never wait behind a slow
//! start/stop batch.

use super::Stage;
use crate::events::StageEventKind;
use crate::media::{same_output, OutputRef};
use std::sync::Arc;
use tracing::debug;

impl Stage {
    /// Attaches an output, taking a strong reference to it.
    ///
    /// Returns false if the output is already attached or the stage has
    /// been destroyed. Fires `output_add` on success.
    pub fn add_output(&self, output: &OutputRef) -> bool {
        let stage = self.inner();

        {
            let _guard = stage.output_lock.lock();
            // Checked under the lock: teardown clears the list while holding it.
            if stage.is_destroyed() {
                return false;
            }
            let current = stage.snapshot();
            if current.iter().any(|existing| same_output(existing, output)) {
                return false;
            }
            let mut outputs = current.to_vec();
            drop(current);
            outputs.push(Arc::clone(output));
            stage.publish(outputs);
        }

        self.control
            .notify(StageEventKind::OutputAdded(Arc::clone(output)));

        debug!(stage = %stage.name(), output = %output.name(), "Added output to stage");
        true
    }

    /// Detaches an output, stopping it first if it is running.
    ///
    /// Returns false if the output is not attached. The order of the
    /// remaining outputs is preserved. Fires `output_remove` once the list
    /// lock has been released.
    pub fn remove_output(&self, output: &OutputRef) -> bool {
        let stage = self.inner();

        let removed = {
            let _guard = stage.output_lock.lock();
            let mut outputs = stage.snapshot().to_vec();
            let Some(index) = outputs
                .iter()
                .position(|existing| same_output(existing, output))
            else {
                return false;
            };

            if outputs[index].is_active() {
                outputs[index].stop();
            }
            let removed = outputs.remove(index);
            stage.publish(outputs);
            removed
        };

        self.control
            .notify(StageEventKind::OutputRemoved(Arc::clone(&removed)));

        debug!(stage = %stage.name(), output = %removed.name(), "Removed output from stage");
        true
    }

    /// Returns the number of attached outputs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.inner().snapshot().len()
    }

    /// Returns the output at `index`.
    #[must_use]
    pub fn output(&self, index: usize) -> Option<OutputRef> {
        self.inner().snapshot().get(index).cloned()
    }

    /// Returns all attached outputs in attachment order.
    #[must_use]
    pub fn outputs(&self) -> Vec<OutputRef> {
        self.inner().snapshot().to_vec()
    }

    /// Starts the output at `index`. Fires `output_start` only on success.
    pub fn start_output(&self, index: usize) -> bool {
        let Some(output) = self.output(index) else {
            return false;
        };

        let started = output.start();
        if started {
            self.control.notify(StageEventKind::OutputStarted(output));
        }
        started
    }

    /// Stops the output at `index` and fires `output_stop`, whether or not
    /// it was running.
    pub fn stop_output(&self, index: usize, force: bool) {
        let Some(output) = self.output(index) else {
            return;
        };

        if force {
            output.force_stop();
        } else {
            output.stop();
        }
        self.control.notify(StageEventKind::OutputStopped(output));
    }

    /// Starts every inactive output.
    ///
    /// The list lock is held for the whole batch; `output_start` fires for
    /// each output that started, after the lock is released.
    pub fn start_all_outputs(&self) {
        let stage = self.inner();

        let started: Vec<OutputRef> = {
            let _guard = stage.output_lock.lock();
            let mut started = Vec::new();
            for output in stage.snapshot().iter() {
                if !output.is_active() && output.start() {
                    started.push(Arc::clone(output));
                }
            }
            started
        };

        for output in started {
            self.control.notify(StageEventKind::OutputStarted(output));
        }
    }

    /// Stops every active output, forcibly if `force` is set.
    ///
    /// The list lock is held for the whole batch; `output_stop` fires for
    /// each stopped output after the lock is released.
    pub fn stop_all_outputs(&self, force: bool) {
        let stage = self.inner();

        let stopped: Vec<OutputRef> = {
            let _guard = stage.output_lock.lock();
            let mut stopped = Vec::new();
            for output in stage.snapshot().iter() {
                if output.is_active() {
                    if force {
                        output.force_stop();
                    } else {
                        output.stop();
                    }
                    stopped.push(Arc::clone(output));
                }
            }
            stopped
        };

        for output in stopped {
            self.control.notify(StageEventKind::OutputStopped(output));
        }
    }

    /// Returns true if any attached output is running.
    #[must_use]
    pub fn any_output_active(&self) -> bool {
        self.inner()
            .snapshot()
            .iter()
            .any(|output| output.is_active())
    }
}
