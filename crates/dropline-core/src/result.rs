#![forbid(unsafe_code)]

//! Consumer-facing lifecycle payloads and helpers to apply a drop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{DraggableDescriptor, DraggableId, DroppableDescriptor, DroppableId, TypeId};
use crate::impact::{Combine, DraggableLocation};

/// Why a drag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropReason {
    Drop,
    Cancel,
}

/// How the dragged item is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementMode {
    /// Continuous coordinate stream (pointer, touch).
    Fluid,
    /// Discrete step commands (keyboard, programmatic).
    Snap,
}

/// The dragged item and its home droppable, fixed for one drag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Critical {
    pub draggable: DraggableDescriptor,
    pub droppable: DroppableDescriptor,
}

impl Critical {
    /// The slot the item was lifted from.
    pub fn source(&self) -> DraggableLocation {
        DraggableLocation::new(
            self.draggable.droppable_id.clone(),
            self.draggable.index,
        )
    }
}

/// Payload of `on_before_capture`, fired before anything is measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeforeCapture {
    pub draggable_id: DraggableId,
    pub mode: MovementMode,
}

/// Payload of `on_before_drag_start` and `on_drag_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragStart {
    pub draggable_id: DraggableId,
    pub type_id: TypeId,
    pub source: DraggableLocation,
    pub mode: MovementMode,
}

impl DragStart {
    pub fn from_critical(critical: &Critical, mode: MovementMode) -> Self {
        Self {
            draggable_id: critical.draggable.id.clone(),
            type_id: critical.droppable.type_id.clone(),
            source: critical.source(),
            mode,
        }
    }
}

/// Payload of `on_drag_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragUpdate {
    pub start: DragStart,
    pub destination: Option<DraggableLocation>,
    pub combine: Option<Combine>,
}

/// Payload of `on_drag_end`: the outcome the consumer should apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropResult {
    pub draggable_id: DraggableId,
    pub type_id: TypeId,
    pub source: DraggableLocation,
    pub destination: Option<DraggableLocation>,
    pub combine: Option<Combine>,
    pub reason: DropReason,
    pub mode: MovementMode,
}

impl DropResult {
    /// The result reported when a drag is cancelled or aborted.
    pub fn cancelled(start: &DragStart) -> Self {
        Self {
            draggable_id: start.draggable_id.clone(),
            type_id: start.type_id.clone(),
            source: start.source.clone(),
            destination: None,
            combine: None,
            reason: DropReason::Cancel,
            mode: start.mode,
        }
    }

    /// Fold this result into the consumer's lists.
    ///
    /// Reorders within a list, moves between lists, or removes the item from
    /// its source on combine (the caller merges it into the target).
    pub fn apply<T>(&self, lists: &mut BTreeMap<DroppableId, Vec<T>>) -> ApplyOutcome<T> {
        if self.reason == DropReason::Cancel {
            return ApplyOutcome::Unchanged;
        }
        if self.combine.is_some() {
            return match lists.get_mut(&self.source.droppable_id) {
                Some(list) if self.source.index < list.len() => {
                    ApplyOutcome::Combined(list.remove(self.source.index))
                }
                _ => ApplyOutcome::Unchanged,
            };
        }
        let Some(destination) = &self.destination else {
            return ApplyOutcome::Unchanged;
        };
        if destination.droppable_id == self.source.droppable_id {
            if destination.index == self.source.index {
                return ApplyOutcome::Unchanged;
            }
            let Some(list) = lists.get_mut(&self.source.droppable_id) else {
                return ApplyOutcome::Unchanged;
            };
            return if reorder(list, self.source.index, destination.index) {
                ApplyOutcome::Reordered
            } else {
                ApplyOutcome::Unchanged
            };
        }

        let Some(mut source) = lists.remove(&self.source.droppable_id) else {
            return ApplyOutcome::Unchanged;
        };
        let moved = match lists.get_mut(&destination.droppable_id) {
            Some(target) => move_between(
                &mut source,
                target,
                self.source.index,
                destination.index,
            ),
            None => false,
        };
        lists.insert(self.source.droppable_id.clone(), source);
        if moved {
            ApplyOutcome::Moved
        } else {
            ApplyOutcome::Unchanged
        }
    }
}

/// What [`DropResult::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome<T> {
    Unchanged,
    Reordered,
    Moved,
    /// The item was removed from its source; merge it into the combine target.
    Combined(T),
}

/// Move the item at `from` so it ends up at `to`. Returns `false` when either
/// index is out of range.
pub fn reorder<T>(list: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= list.len() || to >= list.len() {
        return false;
    }
    let item = list.remove(from);
    list.insert(to, item);
    true
}

/// Move `source[from]` into `destination` at `to`. Returns `false` when either
/// index is out of range.
pub fn move_between<T>(
    source: &mut Vec<T>,
    destination: &mut Vec<T>,
    from: usize,
    to: usize,
) -> bool {
    if from >= source.len() || to > destination.len() {
        return false;
    }
    let item = source.remove(from);
    destination.insert(to, item);
    true
}
