//! Typed stage notifications.

use super::SignalScope;
use crate::media::OutputRef;
use crate::stage::WeakStage;
use crate::utils::iso_timestamp;
use uuid::Uuid;

/// What happened to a stage.
#[derive(Clone)]
pub enum StageEventKind {
    /// The stage was created (global only).
    Created,
    /// The stage is about to be torn down.
    Destroyed,
    /// The user asked for the stage to be removed.
    Removed,
    /// An output was attached.
    OutputAdded(OutputRef),
    /// An output was detached.
    OutputRemoved(OutputRef),
    /// An output started.
    OutputStarted(OutputRef),
    /// An output was stopped.
    OutputStopped(OutputRef),
    /// The stage was renamed.
    Renamed {
        /// The name after the change.
        new_name: String,
        /// The name before the change.
        prev_name: String,
    },
}

impl StageEventKind {
    /// Signal name on the stage's own endpoint, if this kind is sent there.
    #[must_use]
    pub const fn local_signal(&self) -> Option<&'static str> {
        match self {
            Self::Created => None,
            Self::Destroyed => Some("destroy"),
            Self::Removed => Some("remove"),
            Self::OutputAdded(_) => Some("output_add"),
            Self::OutputRemoved(_) => Some("output_remove"),
            Self::OutputStarted(_) => Some("output_start"),
            Self::OutputStopped(_) => Some("output_stop"),
            Self::Renamed { .. } => Some("rename"),
        }
    }

    /// Signal name on the registry's endpoint, if this kind is sent there.
    #[must_use]
    pub const fn global_signal(&self) -> Option<&'static str> {
        match self {
            Self::Created => Some("stage_create"),
            Self::Destroyed => Some("stage_destroy"),
            Self::Renamed { .. } => Some("stage_rename"),
            _ => None,
        }
    }

    /// Signal name for the given endpoint scope.
    #[must_use]
    pub const fn signal(&self, scope: SignalScope) -> Option<&'static str> {
        match scope {
            SignalScope::Local => self.local_signal(),
            SignalScope::Global => self.global_signal(),
        }
    }

    /// The output participating in the event, if any.
    #[must_use]
    pub const fn output(&self) -> Option<&OutputRef> {
        match self {
            Self::OutputAdded(output)
            | Self::OutputRemoved(output)
            | Self::OutputStarted(output)
            | Self::OutputStopped(output) => Some(output),
            _ => None,
        }
    }
}

impl std::fmt::Debug for StageEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => f.write_str("Created"),
            Self::Destroyed => f.write_str("Destroyed"),
            Self::Removed => f.write_str("Removed"),
            Self::OutputAdded(output) => write!(f, "OutputAdded({})", output.name()),
            Self::OutputRemoved(output) => write!(f, "OutputRemoved({})", output.name()),
            Self::OutputStarted(output) => write!(f, "OutputStarted({})", output.name()),
            Self::OutputStopped(output) => write!(f, "OutputStopped({})", output.name()),
            Self::Renamed { new_name, prev_name } => f
                .debug_struct("Renamed")
                .field("new_name", new_name)
                .field("prev_name", prev_name)
                .finish(),
        }
    }
}

/// A notification about one stage.
///
/// Carries a weak handle rather than a strong one: handlers of `destroy`
/// see a stage that can no longer be upgraded, and a handler that stores
/// the event does not keep the stage alive.
#[derive(Debug, Clone)]
pub struct StageEvent {
    /// What happened.
    pub kind: StageEventKind,
    /// The stage the event is about.
    pub stage: WeakStage,
    /// The stage's name when the event fired.
    pub stage_name: String,
    /// The stage's UUID.
    pub stage_uuid: Uuid,
    /// When the event fired (ISO 8601).
    pub timestamp: String,
}

impl StageEvent {
    pub(crate) fn new(
        kind: StageEventKind,
        stage: WeakStage,
        stage_name: String,
        stage_uuid: Uuid,
    ) -> Self {
        Self {
            kind,
            stage,
            stage_name,
            stage_uuid,
            timestamp: iso_timestamp(),
        }
    }

    /// Signal name for the given endpoint scope.
    #[must_use]
    pub const fn signal(&self, scope: SignalScope) -> Option<&'static str> {
        self.kind.signal(scope)
    }

    /// Converts the event into the payload handed to event sinks.
    #[must_use]
    pub fn to_json(&self, scope: SignalScope) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(signal) = self.signal(scope) {
            map.insert("signal".to_string(), serde_json::json!(signal));
        }
        map.insert("stage".to_string(), serde_json::json!(self.stage_name));
        map.insert("uuid".to_string(), serde_json::json!(self.stage_uuid.to_string()));
        map.insert("timestamp".to_string(), serde_json::json!(self.timestamp));

        if let Some(output) = self.kind.output() {
            map.insert("output".to_string(), serde_json::json!(output.name()));
        }
        if let StageEventKind::Renamed { new_name, prev_name } = &self.kind {
            map.insert("new_name".to_string(), serde_json::json!(new_name));
            map.insert("prev_name".to_string(), serde_json::json!(prev_name));
        }

        serde_json::Value::Object(map)
    }
}
