//! Stage notifications.
//!
//! Every stage owns a local [`SignalHandler`]; the registry owns a global
//! one. A state change is delivered to the local endpoint first and then,
//! for non-private stages, to the global endpoint. Each endpoint only
//! carries the signals listed below.
//!
//! | Signal          | Endpoint | Kind                               |
//! |-----------------|----------|------------------------------------|
//! | `destroy`       | local    | [`StageEventKind::Destroyed`]      |
//! | `remove`        | local    | [`StageEventKind::Removed`]        |
//! | `output_add`    | local    | [`StageEventKind::OutputAdded`]    |
//! | `output_remove` | local    | [`StageEventKind::OutputRemoved`]  |
//! | `output_start`  | local    | [`StageEventKind::OutputStarted`]  |
//! | `output_stop`   | local    | [`StageEventKind::OutputStopped`]  |
//! | `rename`        | local    | [`StageEventKind::Renamed`]        |
//! | `stage_create`  | global   | [`StageEventKind::Created`]        |
//! | `stage_destroy` | global   | [`StageEventKind::Destroyed`]      |
//! | `stage_rename`  | global   | [`StageEventKind::Renamed`]        |

mod event;
mod signal;
mod sink;

pub use event::{StageEvent, StageEventKind};
pub use signal::{HandlerId, SignalCallback, SignalHandler, SignalScope};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
