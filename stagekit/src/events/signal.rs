//! Signal endpoints for stage notifications.

use super::{EventSink, StageEvent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Which endpoint a [`SignalHandler`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalScope {
    /// Per-stage endpoint.
    Local,
    /// Registry-wide endpoint.
    Global,
}

/// Identifies a connected callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// A connected callback.
pub type SignalCallback = Arc<dyn Fn(&StageEvent) + Send + Sync>;

/// A notification endpoint.
///
/// Events reach subscribers three ways: synchronous callbacks (run on the
/// emitting thread, in connection order), [`EventSink`]s, and a tokio
/// broadcast channel for async consumers. Events the endpoint has no
/// signal for are dropped.
pub struct SignalHandler {
    scope: SignalScope,
    next_id: AtomicU64,
    handlers: RwLock<Vec<(HandlerId, SignalCallback)>>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
    sender: broadcast::Sender<StageEvent>,
}

impl SignalHandler {
    /// Creates an endpoint whose broadcast channel buffers `capacity` events.
    #[must_use]
    pub fn new(scope: SignalScope, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            scope,
            next_id: AtomicU64::new(1),
            handlers: RwLock::new(Vec::new()),
            sinks: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Returns the endpoint's scope.
    #[must_use]
    pub const fn scope(&self) -> SignalScope {
        self.scope
    }

    /// Connects a callback. It sees every event this endpoint carries.
    pub fn connect<F>(&self, callback: F) -> HandlerId
    where
        F: Fn(&StageEvent) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(callback)));
        id
    }

    /// Disconnects a callback. Returns false if it was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Disconnects every callback and sink.
    pub fn disconnect_all(&self) {
        self.handlers.write().clear();
        self.sinks.write().clear();
    }

    /// Returns the number of connected callbacks.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Subscribes to the broadcast channel.
    ///
    /// Slow receivers observe `RecvError::Lagged` rather than blocking
    /// the emitter.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.sender.subscribe()
    }

    /// Forwards every event to `sink` as `stage.<signal>`, synchronously
    /// through [`EventSink::try_emit`].
    pub fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    /// Spawns a task that awaits [`EventSink::emit`] for every event on the
    /// broadcast channel, so a slow sink never holds up the emitter.
    ///
    /// Must be called from within a tokio runtime. The task ends once the
    /// endpoint is dropped and the buffered events are drained. A sink that
    /// falls more than the channel capacity behind skips the oldest events.
    pub fn forward_to(&self, sink: Arc<dyn EventSink>) -> JoinHandle<()> {
        let mut receiver = self.sender.subscribe();
        let scope = self.scope;

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Some(signal) = event.signal(scope) {
                            let data = event.to_json(scope);
                            sink.emit(&format!("stage.{signal}"), Some(data)).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event forwarder fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(?scope, "Event forwarder finished");
        })
    }

    /// Delivers `event` to every subscriber.
    ///
    /// Callbacks run against a snapshot of the handler list, so a callback
    /// may connect or disconnect handlers (or re-enter the stage) without
    /// deadlocking. A panicking callback is logged and skipped.
    pub fn emit(&self, event: &StageEvent) {
        let Some(signal) = event.signal(self.scope) else {
            return;
        };

        let handlers: Vec<SignalCallback> = self
            .handlers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in handlers {
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            })) {
                warn!("Signal handler for '{}' panicked: {:?}", signal, e);
            }
        }

        let sinks: Vec<Arc<dyn EventSink>> = self.sinks.read().clone();
        if !sinks.is_empty() {
            let event_type = format!("stage.{signal}");
            let data = event.to_json(self.scope);
            for sink in sinks {
                sink.try_emit(&event_type, Some(data.clone()));
            }
        }

        // No receivers is not an error.
        let _ = self.sender.send(event.clone());
    }
}

impl std::fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalHandler")
            .field("scope", &self.scope)
            .field("handlers", &self.handlers.read().len())
            .field("sinks", &self.sinks.read().len())
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
