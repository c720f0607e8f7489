#![forbid(unsafe_code)]

//! The hypothetical outcome of dropping the dragged item right now.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::id::{DraggableId, DroppableId};

/// A slot in a droppable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraggableLocation {
    pub droppable_id: DroppableId,
    pub index: usize,
}

impl DraggableLocation {
    pub fn new(droppable_id: impl Into<DroppableId>, index: usize) -> Self {
        Self {
            droppable_id: droppable_id.into(),
            index,
        }
    }
}

/// Merge target: the dragged item would be combined into this sibling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combine {
    pub draggable_id: DraggableId,
    pub droppable_id: DroppableId,
}

/// A sibling shifted out of the way of the dragged item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Displacement {
    pub draggable_id: DraggableId,
    /// Whether the renderer should animate this item into its new place.
    pub should_animate: bool,
}

/// Would-be reorder/combine result.
///
/// # Invariants
///
/// 1. At most one of `destination` and `combine` is set.
/// 2. `displaced` entries all belong to the destination droppable.
/// 3. `destination.index` is a valid insertion point for that droppable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Impact {
    /// Siblings moved out of the way, in list order.
    pub displaced: Vec<Displacement>,
    /// How far each displaced sibling moves (the dragged item's margin box).
    pub displaced_by: Point,
    pub destination: Option<DraggableLocation>,
    pub combine: Option<Combine>,
}

impl Impact {
    /// Impact that leaves everything in place: dropping returns the item home.
    pub fn no_op() -> Self {
        Self::default()
    }

    /// Impact of a freshly lifted item sitting in its original slot.
    pub fn at_location(location: DraggableLocation, displaced_by: Point) -> Self {
        Self {
            displaced: Vec::new(),
            displaced_by,
            destination: Some(location),
            combine: None,
        }
    }

    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.destination.is_none() && self.combine.is_none()
    }

    #[must_use]
    pub fn is_displaced(&self, id: &DraggableId) -> bool {
        self.displaced.iter().any(|d| &d.draggable_id == id)
    }

    /// Droppable the item would land in, whether reordered or combined.
    pub fn target_droppable(&self) -> Option<&DroppableId> {
        self.destination
            .as_ref()
            .map(|d| &d.droppable_id)
            .or_else(|| self.combine.as_ref().map(|c| &c.droppable_id))
    }
}
