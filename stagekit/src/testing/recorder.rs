//! Captures the notifications delivered to a signal endpoint.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{SignalHandler, SignalScope, StageEvent, StageEventKind};

/// Records every event seen by one [`SignalHandler`].
#[derive(Debug)]
pub struct EventRecorder {
    scope: SignalScope,
    events: Mutex<Vec<StageEvent>>,
}

impl EventRecorder {
    /// Connects a new recorder to `handler`.
    pub fn attach(handler: &SignalHandler) -> Arc<Self> {
        let recorder = Arc::new(Self {
            scope: handler.scope(),
            events: Mutex::new(Vec::new()),
        });
        let sink = Arc::clone(&recorder);
        handler.connect(move |event| sink.events.lock().push(event.clone()));
        recorder
    }

    /// Returns the recorded events in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().clone()
    }

    /// Returns the signal names in delivery order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| event.signal(self.scope))
            .map(str::to_string)
            .collect()
    }

    /// Returns `(new_name, prev_name)` for each recorded rename.
    #[must_use]
    pub fn renames(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match &event.kind {
                StageEventKind::Renamed { new_name, prev_name } => {
                    Some((new_name.clone(), prev_name.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Returns how many times `signal` was recorded.
    #[must_use]
    pub fn count(&self, signal: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.signal(self.scope) == Some(signal))
            .count()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
