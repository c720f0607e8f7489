#![forbid(unsafe_code)]

//! Frozen measurements of draggables, droppables and the viewport.
//!
//! A dimension is a snapshot taken at the instant it was captured. Once it is
//! published into a drag it is never re-measured implicitly: scroll changes
//! are tracked as offsets in [`ScrollDetails`] and applied on read.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Axis, BoxModel, Point, Rect};
use crate::id::{DraggableDescriptor, DraggableId, DroppableDescriptor, DroppableId, TypeId};

/// Measured box of one draggable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraggableDimension {
    pub descriptor: DraggableDescriptor,
    /// Box relative to the viewport at capture time.
    pub client: BoxModel,
    /// Box in page coordinates (client + window scroll at capture time).
    pub page: BoxModel,
    /// Space this item occupies in a list: its margin box size.
    pub displace_by: Point,
}

impl DraggableDimension {
    /// Build a dimension from a client box measured while the window was
    /// scrolled to `window_scroll`.
    pub fn new(descriptor: DraggableDescriptor, client: BoxModel, window_scroll: Point) -> Self {
        let margin_box = client.margin_box();
        Self {
            descriptor,
            client,
            page: client.shift(window_scroll),
            displace_by: Point::new(margin_box.width, margin_box.height),
        }
    }

    #[inline]
    pub fn id(&self) -> &DraggableId {
        &self.descriptor.id
    }

    /// Size of the gap this item leaves (or needs) along `axis`.
    #[inline]
    pub fn displace_along(&self, axis: Axis) -> f32 {
        axis.main(self.displace_by)
    }
}

/// Scroll offsets of a scroll container or the window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollDetails {
    /// Offset when the drag started.
    pub initial: Point,
    /// Latest known offset.
    pub current: Point,
    /// Largest reachable offset.
    pub max: Point,
}

impl ScrollDetails {
    pub fn new(initial: Point, max: Point) -> Self {
        Self {
            initial,
            current: initial,
            max,
        }
    }

    /// Distance scrolled since the drag started.
    #[inline]
    pub fn diff(&self) -> Point {
        self.current - self.initial
    }

    /// Clamp an offset into `0..=max`.
    pub fn clamp(&self, offset: Point) -> Point {
        Point::new(
            offset.x.clamp(0.0, self.max.x.max(0.0)),
            offset.y.clamp(0.0, self.max.y.max(0.0)),
        )
    }

    /// Record a new current offset (clamped).
    #[must_use]
    pub fn with_current(&self, offset: Point) -> ScrollDetails {
        ScrollDetails {
            current: self.clamp(offset),
            ..*self
        }
    }

    /// The part of `change` that can actually be applied from `current`.
    pub fn available(&self, change: Point) -> Point {
        self.clamp(self.current + change) - self.current
    }
}

/// Scroll container wrapping a droppable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollFrame {
    /// Visible box of the container in page coordinates at capture time.
    pub page: Rect,
    pub scroll: ScrollDetails,
    /// Whether the frame clips the droppable for hit testing.
    pub should_clip: bool,
}

/// Measured box and behaviour flags of one droppable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppableDimension {
    pub descriptor: DroppableDescriptor,
    pub axis: Axis,
    pub is_enabled: bool,
    pub is_combine_enabled: bool,
    pub client: BoxModel,
    pub page: BoxModel,
    /// Present when the droppable scrolls internally.
    pub frame: Option<ScrollFrame>,
}

impl DroppableDimension {
    pub fn new(
        descriptor: DroppableDescriptor,
        axis: Axis,
        client: BoxModel,
        window_scroll: Point,
    ) -> Self {
        Self {
            descriptor,
            axis,
            is_enabled: true,
            is_combine_enabled: false,
            client,
            page: client.shift(window_scroll),
            frame: None,
        }
    }

    #[must_use]
    pub fn with_frame(mut self, frame: ScrollFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = is_enabled;
        self
    }

    #[must_use]
    pub fn with_combine_enabled(mut self, is_combine_enabled: bool) -> Self {
        self.is_combine_enabled = is_combine_enabled;
        self
    }

    #[inline]
    pub fn id(&self) -> &DroppableId {
        &self.descriptor.id
    }

    #[inline]
    pub fn type_id(&self) -> &TypeId {
        &self.descriptor.type_id
    }

    /// How far the contents have scrolled since capture.
    pub fn scroll_diff(&self) -> Point {
        self.frame.map_or(Point::ORIGIN, |f| f.scroll.diff())
    }

    /// The area of the page where this droppable can receive a drop.
    pub fn visible_page_box(&self) -> Option<Rect> {
        let border_box = self.page.border_box;
        match self.frame {
            Some(frame) if frame.should_clip => frame.page.intersection_opt(&border_box),
            _ => Some(border_box),
        }
    }
}

/// The window as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Visible area in page coordinates.
    pub frame: Rect,
    pub scroll: ScrollDetails,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scroll: Point, max_scroll: Point) -> Self {
        Self {
            frame: Rect::new(scroll.x, scroll.y, width, height),
            scroll: ScrollDetails::new(scroll, max_scroll),
        }
    }

    /// Move the visible area to a new (clamped) scroll offset.
    #[must_use]
    pub fn with_scroll(&self, offset: Point) -> Viewport {
        let scroll = self.scroll.with_current(offset);
        Viewport {
            frame: Rect::new(
                scroll.current.x,
                scroll.current.y,
                self.frame.width,
                self.frame.height,
            ),
            scroll,
        }
    }
}

/// Every dimension published into the current drag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionMap {
    pub draggables: FxHashMap<DraggableId, DraggableDimension>,
    pub droppables: FxHashMap<DroppableId, DroppableDimension>,
}

impl DimensionMap {
    pub fn insert_draggable(&mut self, dimension: DraggableDimension) {
        self.draggables.insert(dimension.id().clone(), dimension);
    }

    pub fn insert_droppable(&mut self, dimension: DroppableDimension) {
        self.droppables.insert(dimension.id().clone(), dimension);
    }

    /// Draggables of a droppable, ordered by index.
    pub fn draggables_in(&self, droppable: &DroppableId) -> Vec<&DraggableDimension> {
        let mut list: Vec<_> = self
            .draggables
            .values()
            .filter(|d| &d.descriptor.droppable_id == droppable)
            .collect();
        list.sort_by(|a, b| {
            a.descriptor
                .index
                .cmp(&b.descriptor.index)
                .then_with(|| a.descriptor.id.cmp(&b.descriptor.id))
        });
        list
    }

    /// Reassign indices so each droppable holds a dense `0..len` sequence.
    pub fn normalize_indices(&mut self) {
        let mut ordered: Vec<(DroppableId, usize, DraggableId)> = self
            .draggables
            .values()
            .map(|d| {
                (
                    d.descriptor.droppable_id.clone(),
                    d.descriptor.index,
                    d.descriptor.id.clone(),
                )
            })
            .collect();
        ordered.sort();

        let mut current: Option<&DroppableId> = None;
        let mut next = 0usize;
        let mut assignments = Vec::with_capacity(ordered.len());
        for (droppable, _, id) in &ordered {
            if current != Some(droppable) {
                current = Some(droppable);
                next = 0;
            }
            assignments.push((id.clone(), next));
            next += 1;
        }
        for (id, index) in assignments {
            if let Some(dimension) = self.draggables.get_mut(&id) {
                dimension.descriptor.index = index;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Spacing;

    fn item(id: &str, index: usize, droppable: &str) -> DraggableDimension {
        DraggableDimension::new(
            DraggableDescriptor::new(id, index, droppable, "DEFAULT"),
            BoxModel::new(Rect::new(0.0, index as f32 * 40.0, 100.0, 36.0), Spacing::new(2.0, 0.0, 2.0, 0.0)),
            Point::ORIGIN,
        )
    }

    #[test]
    fn displace_by_uses_margin_box() {
        let dimension = item("a", 0, "list");
        assert_eq!(dimension.displace_along(Axis::Vertical), 40.0);
        assert_eq!(dimension.displace_along(Axis::Horizontal), 100.0);
    }

    #[test]
    fn page_box_includes_window_scroll() {
        let dimension = DraggableDimension::new(
            DraggableDescriptor::new("a", 0, "list", "DEFAULT"),
            BoxModel::from_rect(Rect::new(0.0, 10.0, 10.0, 10.0)),
            Point::new(0.0, 100.0),
        );
        assert_eq!(dimension.page.border_box.y, 110.0);
    }

    #[test]
    fn scroll_details_clamp_and_available() {
        let scroll = ScrollDetails::new(Point::new(0.0, 10.0), Point::new(0.0, 50.0));
        let moved = scroll.with_current(Point::new(0.0, 80.0));
        assert_eq!(moved.current, Point::new(0.0, 50.0));
        assert_eq!(moved.diff(), Point::new(0.0, 40.0));
        assert_eq!(scroll.available(Point::new(0.0, -30.0)), Point::new(0.0, -10.0));
    }

    #[test]
    fn normalize_indices_makes_lists_dense() {
        let mut map = DimensionMap::default();
        map.insert_draggable(item("a", 3, "left"));
        map.insert_draggable(item("b", 7, "left"));
        map.insert_draggable(item("c", 1, "left"));
        map.insert_draggable(item("z", 9, "right"));
        map.normalize_indices();

        let left: Vec<_> = map
            .draggables_in(&DroppableId::new("left"))
            .iter()
            .map(|d| (d.id().as_str().to_owned(), d.descriptor.index))
            .collect();
        let expected: Vec<(String, usize)> = vec![
            ("c".to_owned(), 0),
            ("a".to_owned(), 1),
            ("b".to_owned(), 2),
        ];
        assert_eq!(left, expected);
        assert_eq!(map.draggables[&DraggableId::new("z")].descriptor.index, 0);
    }

    #[test]
    fn clipped_visible_box() {
        let droppable = DroppableDimension::new(
            DroppableDescriptor::new("list", "DEFAULT"),
            Axis::Vertical,
            BoxModel::from_rect(Rect::new(0.0, 0.0, 100.0, 1000.0)),
            Point::ORIGIN,
        )
        .with_frame(ScrollFrame {
            page: Rect::new(0.0, 0.0, 100.0, 200.0),
            scroll: ScrollDetails::new(Point::ORIGIN, Point::new(0.0, 800.0)),
            should_clip: true,
        });
        assert_eq!(
            droppable.visible_page_box(),
            Some(Rect::new(0.0, 0.0, 100.0, 200.0))
        );
    }

    #[test]
    fn viewport_scroll_moves_frame() {
        let viewport = Viewport::new(800.0, 600.0, Point::ORIGIN, Point::new(0.0, 400.0));
        let scrolled = viewport.with_scroll(Point::new(0.0, 120.0));
        assert_eq!(scrolled.frame.y, 120.0);
        assert_eq!(scrolled.scroll.diff(), Point::new(0.0, 120.0));
    }
}
