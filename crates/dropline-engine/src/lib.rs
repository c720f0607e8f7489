#![forbid(unsafe_code)]

//! Engine: drag lifecycle, geometry collection, impact calculation, scrolling
//! and input arbitration.
//!
//! # Role in dropline
//! `dropline-engine` owns the single authoritative answer to "what is being
//! dragged, where, and what would happen if dropped now". Hosts construct one
//! [`DragContext`] per drag context, register their draggables/droppables,
//! feed input through sensors, and call [`DragContext::frame`] once per
//! animation frame.
//!
//! # Primary responsibilities
//! - **State**: [`DragStore`] reducer over [`DragState`] phases.
//! - **Movement**: pure impact calculation in [`movement`].
//! - **Geometry**: [`Registry`] callbacks and the lazy [`marshal`].
//! - **Arbitration**: one live [`Lock`] at a time, handed out via [`SensorApi`].
//! - **Side effects**: [`auto_scroll`] and [`responders`] react to every state.
//!
//! # How it fits in the system
//! Data flows sensor → lock → context → store, with the marshal supplying
//! dimensions and the movement engine turning positions into impacts. Every
//! operation is synchronous and runs on the caller's thread; the only
//! suspension points are the host's frame callbacks.

pub mod auto_scroll;
pub mod context;
pub mod error;
pub mod lock;
pub mod marshal;
pub mod movement;
pub mod registry;
pub mod responders;
pub mod scheduler;
pub mod sensors;
pub mod state;

pub use auto_scroll::{AutoScroller, ScrollRequest};
pub use context::{DragContext, SensorApi};
pub use error::{EngineError, LockError, StateError};
pub use lock::{
    DragActions, FluidDragActions, Lock, LockCapabilities, LockId, PreDragActions,
    SnapDragActions,
};
pub use marshal::{DimensionMarshal, InitialCollection, RegistryChange};
pub use registry::{
    DraggableCallbacks, DraggableEntry, DraggableOptions, DroppableCallbacks, DroppableEntry,
    Registry, WindowCallbacks,
};
pub use responders::{Announce, Announcer, Responders, TracingAnnouncer};
pub use scheduler::{FrameScheduler, FrameWork};
pub use sensors::{
    InputEvent, Key, KeyboardSensor, Modifiers, PointerButton, PointerSensor, Sensor, TouchSensor,
};
pub use state::{
    Action, ActionKind, CompletedDrag, DragPositions, DragState, DragStore, DragTransition,
    DraggingState, Phase, Published,
};
