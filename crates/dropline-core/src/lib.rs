#![forbid(unsafe_code)]

//! Core: identities, geometry, measured dimensions, impacts and drop results.
//!
//! # Role in dropline
//! `dropline-core` is the shared data model. It owns the value types that
//! flow between the host's rendering layer and the drag engine: descriptors
//! for draggables and droppables, immutable dimension snapshots, the
//! [`Impact`] describing what would happen if the item were dropped now, and
//! the consumer-facing [`DropResult`].
//!
//! # Primary responsibilities
//! - **Identity**: [`DraggableId`], [`DroppableId`], [`TypeId`] and descriptors.
//! - **Geometry**: [`Point`], [`Rect`], [`Spacing`], [`BoxModel`], [`Axis`].
//! - **Dimensions**: frozen measurements plus scroll bookkeeping.
//! - **Outcomes**: [`Impact`], [`DropResult`] and list helpers to apply them.
//! - **Configuration**: [`DragConfig`] with validated, loadable tunables.
//!
//! # How it fits in the system
//! `dropline-engine` consumes these types in its reducer, movement engine and
//! sensors. Nothing in this crate holds mutable engine state, so every type
//! here is cheap to snapshot and safe to hand to responders.

pub mod config;
pub mod dimension;
pub mod geometry;
pub mod id;
pub mod impact;
pub mod result;

pub use config::{
    AutoScrollConfig, ConfigError, DragConfig, DropAnimationConfig, MovementConfig, SensorConfig,
};
pub use dimension::{
    DimensionMap, DraggableDimension, DroppableDimension, ScrollDetails, ScrollFrame, Viewport,
};
pub use geometry::{Axis, BoxModel, Point, Rect, Spacing};
pub use id::{DraggableDescriptor, DraggableId, DroppableDescriptor, DroppableId, TypeId};
pub use impact::{Combine, Displacement, DraggableLocation, Impact};
pub use result::{
    ApplyOutcome, BeforeCapture, Critical, DragStart, DragUpdate, DropReason, DropResult,
    MovementMode, move_between, reorder,
};
