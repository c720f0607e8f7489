#![forbid(unsafe_code)]

//! Geometry registry: mounted draggables/droppables and their measurement
//! callbacks.
//!
//! The rendering layer owns the real elements. It registers an entry per
//! mounted element and answers measurement requests through the callback
//! traits below. The registry itself never measures on its own; the
//! [`marshal`](crate::marshal) decides when to ask.

use std::fmt;

use dropline_core::{
    DraggableDescriptor, DraggableDimension, DraggableId, DroppableDescriptor,
    DroppableDimension, DroppableId, Point, Rect, TypeId, Viewport,
};
use rustc_hash::FxHashMap;

/// Measurement contract for one draggable element.
pub trait DraggableCallbacks {
    /// Measure the element now. `window_scroll` is the current window offset.
    fn get_dimension(&self, window_scroll: Point) -> DraggableDimension;
}

impl<F> DraggableCallbacks for F
where
    F: Fn(Point) -> DraggableDimension,
{
    fn get_dimension(&self, window_scroll: Point) -> DraggableDimension {
        self(window_scroll)
    }
}

/// Measurement and scroll contract for one droppable element.
pub trait DroppableCallbacks {
    /// Measure the element now, including its scroll container if any.
    fn get_dimension(&mut self, window_scroll: Point) -> DroppableDimension;

    /// Scroll the droppable's container by `change`.
    fn scroll(&mut self, change: Point);

    /// The drag that measured this droppable has ended.
    fn drag_stopped(&mut self) {}
}

/// The window as an external collaborator.
pub trait WindowCallbacks {
    /// Current size and scroll position.
    fn viewport(&self) -> Viewport;

    /// Scroll the window by `change`.
    fn scroll_by(&mut self, change: Point);
}

/// Per-draggable behaviour flags, as returned by `find_options_for_draggable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraggableOptions {
    pub is_enabled: bool,
    pub can_drag_interactive_elements: bool,
    pub should_respect_force_press: bool,
}

impl Default for DraggableOptions {
    fn default() -> Self {
        Self {
            is_enabled: true,
            can_drag_interactive_elements: false,
            should_respect_force_press: true,
        }
    }
}

/// A mounted draggable.
pub struct DraggableEntry {
    pub descriptor: DraggableDescriptor,
    pub options: DraggableOptions,
    callbacks: Box<dyn DraggableCallbacks>,
}

impl DraggableEntry {
    pub fn new(descriptor: DraggableDescriptor, callbacks: impl DraggableCallbacks + 'static) -> Self {
        Self {
            descriptor,
            options: DraggableOptions::default(),
            callbacks: Box::new(callbacks),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: DraggableOptions) -> Self {
        self.options = options;
        self
    }

    /// Measure through the host callback, stamping the registered descriptor.
    pub fn measure(&self, window_scroll: Point) -> DraggableDimension {
        let mut dimension = self.callbacks.get_dimension(window_scroll);
        dimension.descriptor = self.descriptor.clone();
        dimension
    }
}

impl fmt::Debug for DraggableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraggableEntry")
            .field("descriptor", &self.descriptor)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A mounted droppable.
pub struct DroppableEntry {
    pub descriptor: DroppableDescriptor,
    callbacks: Box<dyn DroppableCallbacks>,
}

impl DroppableEntry {
    pub fn new(descriptor: DroppableDescriptor, callbacks: impl DroppableCallbacks + 'static) -> Self {
        Self {
            descriptor,
            callbacks: Box::new(callbacks),
        }
    }

    pub fn measure(&mut self, window_scroll: Point) -> DroppableDimension {
        let mut dimension = self.callbacks.get_dimension(window_scroll);
        dimension.descriptor = self.descriptor.clone();
        dimension
    }

    pub fn scroll(&mut self, change: Point) {
        self.callbacks.scroll(change);
    }

    pub fn drag_stopped(&mut self) {
        self.callbacks.drag_stopped();
    }
}

impl fmt::Debug for DroppableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DroppableEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// All mounted draggables and droppables.
#[derive(Debug, Default)]
pub struct Registry {
    draggables: FxHashMap<DraggableId, DraggableEntry>,
    droppables: FxHashMap<DroppableId, DroppableEntry>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a draggable. Returns the previous entry if any.
    pub fn insert_draggable(&mut self, entry: DraggableEntry) -> Option<DraggableEntry> {
        self.draggables.insert(entry.descriptor.id.clone(), entry)
    }

    pub fn remove_draggable(&mut self, id: &DraggableId) -> Option<DraggableEntry> {
        self.draggables.remove(id)
    }

    pub fn insert_droppable(&mut self, entry: DroppableEntry) -> Option<DroppableEntry> {
        self.droppables.insert(entry.descriptor.id.clone(), entry)
    }

    pub fn remove_droppable(&mut self, id: &DroppableId) -> Option<DroppableEntry> {
        self.droppables.remove(id)
    }

    pub fn draggable(&self, id: &DraggableId) -> Option<&DraggableEntry> {
        self.draggables.get(id)
    }

    pub fn droppable(&self, id: &DroppableId) -> Option<&DroppableEntry> {
        self.droppables.get(id)
    }

    pub fn droppable_mut(&mut self, id: &DroppableId) -> Option<&mut DroppableEntry> {
        self.droppables.get_mut(id)
    }

    pub fn draggables(&self) -> impl Iterator<Item = &DraggableEntry> {
        self.draggables.values()
    }

    /// Ids of droppables of `type_id`, sorted for deterministic collection.
    pub fn droppable_ids_of_type(&self, type_id: &TypeId) -> Vec<DroppableId> {
        let mut ids: Vec<_> = self
            .droppables
            .values()
            .filter(|e| &e.descriptor.type_id == type_id)
            .map(|e| e.descriptor.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Topmost enabled draggable whose client box contains `point`.
    ///
    /// Measures every candidate, so only call this outside of a drag (sensors
    /// use it on press to find what was pressed). Nested draggables resolve to
    /// the smallest box.
    pub fn hit_test(&self, point: Point, window_scroll: Point) -> Option<DraggableId> {
        self.draggables
            .values()
            .filter(|entry| entry.options.is_enabled)
            .filter_map(|entry| {
                let rect: Rect = entry.measure(window_scroll).client.border_box;
                rect.contains(point).then(|| (rect.area(), entry.descriptor.id.clone()))
            })
            .min_by(|(a_area, a_id), (b_area, b_id)| {
                a_area.total_cmp(b_area).then_with(|| a_id.cmp(b_id))
            })
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropline_core::{Axis, BoxModel};

    fn fixed(rect: Rect) -> impl Fn(Point) -> DraggableDimension {
        move |scroll| {
            DraggableDimension::new(
                DraggableDescriptor::new("placeholder", 0, "list", "DEFAULT"),
                BoxModel::from_rect(rect),
                scroll,
            )
        }
    }

    struct StaticDroppable;

    impl DroppableCallbacks for StaticDroppable {
        fn get_dimension(&mut self, window_scroll: Point) -> DroppableDimension {
            DroppableDimension::new(
                DroppableDescriptor::new("placeholder", "DEFAULT"),
                Axis::Vertical,
                BoxModel::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
                window_scroll,
            )
        }

        fn scroll(&mut self, _change: Point) {}
    }

    #[test]
    fn measure_stamps_registered_descriptor() {
        let entry = DraggableEntry::new(
            DraggableDescriptor::new("a", 2, "list", "DEFAULT"),
            fixed(Rect::new(0.0, 0.0, 10.0, 10.0)),
        );
        let dimension = entry.measure(Point::ORIGIN);
        assert_eq!(dimension.descriptor.id, DraggableId::new("a"));
        assert_eq!(dimension.descriptor.index, 2);

        let mut droppable = DroppableEntry::new(
            DroppableDescriptor::new("list", "DEFAULT"),
            StaticDroppable,
        );
        assert_eq!(droppable.measure(Point::ORIGIN).id(), &DroppableId::new("list"));
    }

    #[test]
    fn hit_test_prefers_smallest_enabled_box() {
        let mut registry = Registry::new();
        registry.insert_draggable(DraggableEntry::new(
            DraggableDescriptor::new("outer", 0, "list", "DEFAULT"),
            fixed(Rect::new(0.0, 0.0, 100.0, 100.0)),
        ));
        registry.insert_draggable(DraggableEntry::new(
            DraggableDescriptor::new("inner", 1, "list", "DEFAULT"),
            fixed(Rect::new(10.0, 10.0, 20.0, 20.0)),
        ));
        registry.insert_draggable(
            DraggableEntry::new(
                DraggableDescriptor::new("disabled", 2, "list", "DEFAULT"),
                fixed(Rect::new(12.0, 12.0, 5.0, 5.0)),
            )
            .with_options(DraggableOptions {
                is_enabled: false,
                ..DraggableOptions::default()
            }),
        );

        assert_eq!(
            registry.hit_test(Point::new(14.0, 14.0), Point::ORIGIN),
            Some(DraggableId::new("inner"))
        );
        assert_eq!(
            registry.hit_test(Point::new(80.0, 80.0), Point::ORIGIN),
            Some(DraggableId::new("outer"))
        );
        assert_eq!(registry.hit_test(Point::new(200.0, 0.0), Point::ORIGIN), None);
    }

    #[test]
    fn ids_of_type_are_sorted() {
        let mut registry = Registry::new();
        for id in ["c", "a", "b"] {
            registry.insert_droppable(DroppableEntry::new(
                DroppableDescriptor::new(id, "DEFAULT"),
                StaticDroppable,
            ));
        }
        registry.insert_droppable(DroppableEntry::new(
            DroppableDescriptor::new("other", "OTHER"),
            StaticDroppable,
        ));
        let ids = registry.droppable_ids_of_type(&TypeId::default());
        assert_eq!(
            ids,
            vec![DroppableId::new("a"), DroppableId::new("b"), DroppableId::new("c")]
        );
    }
}
