#![forbid(unsafe_code)]

//! Dimension marshal: decides when the registry is measured.
//!
//! On lift only the home droppable and its items are measured, right away.
//! Everything else of the same type is collected on the next frame. While a
//! drag is live, mount/unmount/update notifications are batched and turned
//! into a single [`Published`] delta per frame.
//!
//! The marshal never measures on its own schedule: the drag context calls
//! [`DimensionMarshal::collect_remaining`] and
//! [`DimensionMarshal::publish_pending`] from its frame handler.

use std::collections::BTreeSet;

use dropline_core::{
    Critical, DimensionMap, DraggableDescriptor, DraggableId, DroppableDescriptor, DroppableId,
    Point, TypeId, Viewport,
};
use tracing::{debug, trace};

use crate::error::EngineError;
use crate::registry::{Registry, WindowCallbacks};
use crate::state::Published;

/// What the first, blocking collection produced.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialCollection {
    pub critical: Critical,
    pub dimensions: DimensionMap,
    pub viewport: Viewport,
    /// No other droppables of this type exist; nothing is deferred.
    pub is_complete: bool,
}

#[derive(Debug, Default)]
struct Pending {
    draggables: BTreeSet<DraggableId>,
    draggable_removals: BTreeSet<DraggableId>,
    droppables: BTreeSet<DroppableId>,
    droppable_removals: BTreeSet<DroppableId>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.draggables.is_empty()
            && self.draggable_removals.is_empty()
            && self.droppables.is_empty()
            && self.droppable_removals.is_empty()
    }
}

#[derive(Debug)]
struct Collection {
    critical: Critical,
    type_id: TypeId,
    /// Deferred collection has not run yet.
    remaining: bool,
    /// Droppables measured during this drag; told `drag_stopped` at the end.
    measured: BTreeSet<DroppableId>,
    pending: Pending,
}

/// Outcome of a registry change seen during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    /// Not relevant to the current drag.
    Ignored,
    /// Batched for the next frame.
    Batched,
    /// The dragged item (or its home) went away; the drag must end.
    CriticalRemoved,
}

/// Lazy collector of dimensions for one drag at a time.
#[derive(Debug, Default)]
pub struct DimensionMarshal {
    collection: Option<Collection>,
}

fn normalized_viewport(window: &dyn WindowCallbacks) -> Viewport {
    let viewport = window.viewport();
    Viewport::new(
        viewport.frame.width,
        viewport.frame.height,
        viewport.scroll.current,
        viewport.scroll.max,
    )
}

impl DimensionMarshal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.collection.is_some()
    }

    /// Deferred collection still outstanding.
    #[must_use]
    pub fn is_collecting(&self) -> bool {
        self.collection.as_ref().is_some_and(|c| c.remaining)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.collection
            .as_ref()
            .is_some_and(|c| !c.pending.is_empty())
    }

    /// Measure the critical pair (and the rest of the home list) now.
    pub fn start(
        &mut self,
        registry: &mut Registry,
        window: &dyn WindowCallbacks,
        draggable_id: &DraggableId,
    ) -> Result<InitialCollection, EngineError> {
        let viewport = normalized_viewport(window);
        let window_scroll = viewport.scroll.current;

        let descriptor: DraggableDescriptor = registry
            .draggable(draggable_id)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| EngineError::UnknownDraggable(draggable_id.clone()))?;
        let home_id = descriptor.droppable_id.clone();
        let home = registry
            .droppable_mut(&home_id)
            .ok_or_else(|| EngineError::UnknownDroppable(home_id.clone()))?;
        let home_dimension = home.measure(window_scroll);
        let home_descriptor: DroppableDescriptor = home.descriptor.clone();

        let mut dimensions = DimensionMap::default();
        dimensions.insert_droppable(home_dimension);
        for entry in registry
            .draggables()
            .filter(|entry| entry.descriptor.droppable_id == home_id)
        {
            dimensions.insert_draggable(entry.measure(window_scroll));
        }

        let type_id = descriptor.type_id.clone();
        let is_complete = registry
            .droppable_ids_of_type(&type_id)
            .iter()
            .all(|id| id == &home_id);

        let critical = Critical {
            draggable: descriptor,
            droppable: home_descriptor,
        };
        debug!(
            target: "dropline.marshal",
            draggable = %critical.draggable.id,
            droppable = %critical.droppable.id,
            is_complete,
            "initial collection"
        );

        self.collection = Some(Collection {
            critical: critical.clone(),
            type_id,
            remaining: !is_complete,
            measured: BTreeSet::from([home_id]),
            pending: Pending::default(),
        });

        Ok(InitialCollection {
            critical,
            dimensions,
            viewport,
            is_complete,
        })
    }

    /// Measure every other droppable of the dragged type and its items.
    pub fn collect_remaining(
        &mut self,
        registry: &mut Registry,
        window: &dyn WindowCallbacks,
    ) -> Option<Published> {
        let collection = self.collection.as_mut().filter(|c| c.remaining)?;
        collection.remaining = false;
        let window_scroll = window.viewport().scroll.current;
        let home_id = collection.critical.droppable.id.clone();

        let mut published = Published::default();
        let others: Vec<DroppableId> = registry
            .droppable_ids_of_type(&collection.type_id)
            .into_iter()
            .filter(|id| id != &home_id)
            .collect();
        for id in &others {
            if let Some(entry) = registry.droppable_mut(id) {
                published.droppables.push(entry.measure(window_scroll));
                collection.measured.insert(id.clone());
            }
        }
        published.additions = registry
            .draggables()
            .filter(|entry| others.contains(&entry.descriptor.droppable_id))
            .map(|entry| entry.measure(window_scroll))
            .collect();

        debug!(
            target: "dropline.marshal",
            droppables = published.droppables.len(),
            draggables = published.additions.len(),
            "deferred collection"
        );
        Some(published)
    }

    /// Record a draggable mount/update.
    pub fn draggable_changed(&mut self, descriptor: &DraggableDescriptor) -> RegistryChange {
        let Some(collection) = self.collection.as_mut() else {
            return RegistryChange::Ignored;
        };
        if descriptor.type_id != collection.type_id || descriptor.id == collection.critical.draggable.id {
            return RegistryChange::Ignored;
        }
        collection.pending.draggable_removals.remove(&descriptor.id);
        collection.pending.draggables.insert(descriptor.id.clone());
        collection.pending.droppables.insert(descriptor.droppable_id.clone());
        trace!(target: "dropline.marshal", draggable = %descriptor.id, "draggable change batched");
        RegistryChange::Batched
    }

    /// Record a draggable unmount.
    pub fn draggable_removed(&mut self, descriptor: &DraggableDescriptor) -> RegistryChange {
        let Some(collection) = self.collection.as_mut() else {
            return RegistryChange::Ignored;
        };
        if descriptor.id == collection.critical.draggable.id {
            return RegistryChange::CriticalRemoved;
        }
        if descriptor.type_id != collection.type_id {
            return RegistryChange::Ignored;
        }
        collection.pending.draggables.remove(&descriptor.id);
        collection.pending.draggable_removals.insert(descriptor.id.clone());
        collection.pending.droppables.insert(descriptor.droppable_id.clone());
        RegistryChange::Batched
    }

    /// Record a droppable mount/update.
    pub fn droppable_changed(&mut self, descriptor: &DroppableDescriptor) -> RegistryChange {
        let Some(collection) = self.collection.as_mut() else {
            return RegistryChange::Ignored;
        };
        if descriptor.type_id != collection.type_id {
            return RegistryChange::Ignored;
        }
        collection.pending.droppable_removals.remove(&descriptor.id);
        collection.pending.droppables.insert(descriptor.id.clone());
        RegistryChange::Batched
    }

    /// Record a droppable unmount.
    pub fn droppable_removed(&mut self, descriptor: &DroppableDescriptor) -> RegistryChange {
        let Some(collection) = self.collection.as_mut() else {
            return RegistryChange::Ignored;
        };
        if descriptor.id == collection.critical.droppable.id {
            return RegistryChange::CriticalRemoved;
        }
        if descriptor.type_id != collection.type_id {
            return RegistryChange::Ignored;
        }
        collection.pending.droppables.remove(&descriptor.id);
        collection.pending.droppable_removals.insert(descriptor.id.clone());
        collection.measured.remove(&descriptor.id);
        RegistryChange::Batched
    }

    /// Measure batched changes.
    ///
    /// Every droppable touched by a change is re-measured together with all
    /// of its items except the dragged one, whose frozen dimension stays.
    pub fn publish_pending(
        &mut self,
        registry: &mut Registry,
        window: &dyn WindowCallbacks,
    ) -> Option<Published> {
        let collection = self.collection.as_mut()?;
        if collection.pending.is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut collection.pending);
        let window_scroll = window.viewport().scroll.current;
        let critical_id = collection.critical.draggable.id.clone();

        let mut published = Published {
            removals: pending.draggable_removals.into_iter().collect(),
            droppable_removals: pending.droppable_removals.into_iter().collect(),
            ..Published::default()
        };
        for id in &pending.droppables {
            if let Some(entry) = registry.droppable_mut(id) {
                published.droppables.push(entry.measure(window_scroll));
                collection.measured.insert(id.clone());
            }
        }
        published.additions = registry
            .draggables()
            .filter(|entry| entry.descriptor.id != critical_id)
            .filter(|entry| {
                pending.droppables.contains(&entry.descriptor.droppable_id)
                    || pending.draggables.contains(&entry.descriptor.id)
            })
            .map(|entry| entry.measure(window_scroll))
            .collect();

        debug!(
            target: "dropline.marshal",
            additions = published.additions.len(),
            removals = published.removals.len(),
            droppables = published.droppables.len(),
            "publishing registry changes"
        );
        Some(published)
    }

    /// Ask the registry to scroll a droppable by up to `change`.
    ///
    /// `scroll` is the droppable's published scroll state. Returns the new
    /// offset when anything moved.
    pub fn scroll_droppable(
        &self,
        registry: &mut Registry,
        id: &DroppableId,
        scroll: &dropline_core::ScrollDetails,
        change: Point,
    ) -> Option<Point> {
        if self.collection.is_none() {
            return None;
        }
        let available = scroll.available(change);
        if available.is_origin() {
            return None;
        }
        registry.droppable_mut(id)?.scroll(available);
        Some(scroll.current + available)
    }

    /// End of drag: notify measured droppables and forget everything.
    pub fn stop(&mut self, registry: &mut Registry) {
        let Some(collection) = self.collection.take() else {
            return;
        };
        for id in &collection.measured {
            if let Some(entry) = registry.droppable_mut(id) {
                entry.drag_stopped();
            }
        }
        debug!(target: "dropline.marshal", notified = collection.measured.len(), "collection stopped");
    }
}
