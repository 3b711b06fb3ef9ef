//! Messages that drive the update loop.
//!
//! Everything the loop reacts to — keystrokes, poll ticks, worker
//! results — arrives as one of these, in strict arrival order, through a
//! single queue. Action progress carries the kind it was produced for so
//! superseded workers can be disowned (see the tag check in `App`).

use std::collections::BTreeMap;

use crossterm::event::KeyEvent;

use crate::stack::status::ContainerStatus;
use crate::stack::ActionKind;

/// Progress from an action worker. Exactly one of `Done`/`Err` is the
/// final event for a given run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    /// One complete output line.
    Line(String),
    /// The operation finished successfully.
    Done,
    /// The operation failed; carries the error text.
    Err(String),
}

/// Messages consumed by the event loop.
#[derive(Debug, Clone)]
pub enum Msg {
    /// Keyboard input.
    Input(KeyEvent),
    /// Progress from the action worker, tagged with its kind.
    Action { kind: ActionKind, event: ActionEvent },
    /// Periodic status poll tick.
    PollTick,
    /// A status fetch completed.
    StatusFetched(Vec<ContainerStatus>),
    /// A status fetch failed; previous statuses are kept.
    StatusFetchFailed(String),
    /// Configuration reload completed.
    ConfigLoaded(BTreeMap<String, String>),
    /// Configuration reload failed.
    ConfigLoadFailed(String),
}
