#![forbid(unsafe_code)]

//! dropline public facade crate.
//!
//! Re-exports the data model from `dropline-core` and the engine from
//! `dropline-engine`, plus a small prelude for hosts wiring up a board.
//!
//! ```no_run
//! use dropline::prelude::*;
//!
//! struct Host;
//!
//! impl WindowCallbacks for Host {
//!     fn viewport(&self) -> Viewport {
//!         Viewport::new(1280.0, 800.0, Point::ORIGIN, Point::ORIGIN)
//!     }
//!
//!     fn scroll_by(&mut self, _change: Point) {}
//! }
//!
//! let ctx = dropline::context(Host, DragConfig::default())?;
//! assert_eq!(ctx.phase(), Phase::Idle);
//! # Ok::<(), dropline::Error>(())
//! ```

use std::fmt;

// --- Data model re-exports -------------------------------------------------

pub use dropline_core::{
    ApplyOutcome, Axis, BeforeCapture, BoxModel, Combine, ConfigError, Critical, DimensionMap,
    Displacement, DragConfig, DragStart, DragUpdate, DraggableDescriptor, DraggableDimension,
    DraggableId, DraggableLocation, DropReason, DropResult, DroppableDescriptor,
    DroppableDimension, DroppableId, Impact, MovementMode, Point, Rect, ScrollDetails,
    ScrollFrame, Spacing, TypeId, Viewport, move_between, reorder,
};

// --- Engine re-exports -----------------------------------------------------

pub use dropline_engine::{
    Announce, Announcer, DragContext, DragState, DraggableCallbacks, DraggableEntry,
    DraggableOptions, DroppableCallbacks, DroppableEntry, EngineError, FluidDragActions,
    InputEvent, Key, KeyboardSensor, Lock, LockError, Modifiers, Phase, PointerButton,
    PointerSensor, PreDragActions, Responders, Sensor, SensorApi, SnapDragActions, StateError,
    TouchSensor, TracingAnnouncer, WindowCallbacks,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for dropline hosts.
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// The engine rejected an operation or aborted a drag.
    Engine(EngineError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Standard result type for dropline APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Validate `config` and build an idle context driving `window`.
pub fn context(window: impl WindowCallbacks + 'static, config: DragConfig) -> Result<DragContext> {
    let config = config.into_validated()?;
    Ok(DragContext::new(window, config))
}

/// Load a TOML config file and build an idle context from it.
#[cfg(feature = "config-file")]
pub fn context_from_toml_file(
    window: impl WindowCallbacks + 'static,
    path: impl AsRef<std::path::Path>,
) -> Result<DragContext> {
    let config = DragConfig::from_toml_file(path)?;
    Ok(DragContext::new(window, config))
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DragConfig, DragContext, DraggableDescriptor, DraggableEntry, DraggableId,
        DraggableLocation, DropReason, DropResult, DroppableCallbacks, DroppableDescriptor,
        DroppableEntry, DroppableId, Error, InputEvent, KeyboardSensor, Phase, Point,
        PointerSensor, Rect, Responders, Result, Sensor, TouchSensor, Viewport, WindowCallbacks,
    };

    pub use crate::{core, engine};
}

pub use dropline_core as core;
pub use dropline_engine as engine;
