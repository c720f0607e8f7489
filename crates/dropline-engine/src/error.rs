#![forbid(unsafe_code)]

//! Error types.
//!
//! Contract violations (invalid transitions, double lifts) surface as
//! [`StateError`] / [`LockError`]. Anything that goes wrong while a lock is
//! held is folded into [`EngineError`] and aborts the active drag.

use std::fmt;

use dropline_core::{DraggableId, DroppableId, TypeId};

use crate::lock::LockId;
use crate::state::{ActionKind, Phase};

/// Reducer rejected an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The action is not legal in the current phase.
    InvalidTransition { action: ActionKind, phase: Phase },
    /// The critical draggable was not part of the published dimensions.
    MissingDraggable(DraggableId),
    /// A referenced droppable is not part of the published dimensions.
    MissingDroppable(DroppableId),
    /// A droppable of another type was targeted.
    TypeMismatch { expected: TypeId, found: TypeId },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { action, phase } => {
                write!(f, "cannot apply {action:?} while {phase:?}")
            }
            Self::MissingDraggable(id) => write!(f, "no dimension published for draggable {id}"),
            Self::MissingDroppable(id) => write!(f, "no dimension published for droppable {id}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "droppable type {found} does not accept items of type {expected}")
            }
        }
    }
}

impl std::error::Error for StateError {}

/// Misuse of a lock handle that cannot be degraded to a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The lock was already promoted to a drag.
    AlreadyLifted { lock: LockId },
    /// A drag operation was attempted on a lock that never lifted.
    NotLifted { lock: LockId },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLifted { lock } => write!(f, "lock {lock} has already lifted"),
            Self::NotLifted { lock } => write!(f, "lock {lock} has not lifted yet"),
        }
    }
}

impl std::error::Error for LockError {}

/// Umbrella error for the drag context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    State(StateError),
    Lock(LockError),
    /// The draggable is not registered.
    UnknownDraggable(DraggableId),
    /// The droppable is not registered.
    UnknownDroppable(DroppableId),
    /// The dragged item was unmounted mid-drag.
    CriticalUnmounted(DraggableId),
    /// A failure reported by the host while a drag was active.
    External(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(err) => write!(f, "state: {err}"),
            Self::Lock(err) => write!(f, "lock: {err}"),
            Self::UnknownDraggable(id) => write!(f, "draggable {id} is not registered"),
            Self::UnknownDroppable(id) => write!(f, "droppable {id} is not registered"),
            Self::CriticalUnmounted(id) => write!(f, "dragged item {id} was unmounted"),
            Self::External(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::State(err) => Some(err),
            Self::Lock(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StateError> for EngineError {
    fn from(err: StateError) -> Self {
        Self::State(err)
    }
}

impl From<LockError> for EngineError {
    fn from(err: LockError) -> Self {
        Self::Lock(err)
    }
}
