#![forbid(unsafe_code)]

//! Movement engine: turns the dragged item's position into an [`Impact`].
//!
//! Everything here is a pure function of a [`MovementContext`] snapshot. The
//! reducer calls in after every position, scroll or flag change; the result
//! is folded into the published state.
//!
//! # Rules
//!
//! - **Reorder** ([`reorder`]): scan along the droppable's axis and pick the
//!   furthest insertion point whose sibling midpoint has been crossed.
//! - **Combine** ([`combine`]): only in combine-enabled droppables, when the
//!   dragged centre sits inside the central band of a sibling.
//! - **Cross-droppable** ([`over`]): the innermost matching droppable under
//!   the dragged centre becomes the destination.
//! - **Keyboard** ([`keyboard`]): discrete index requests, clamped.
//!
//! # Stability
//!
//! A sibling that stays displaced across consecutive impacts keeps its
//! `should_animate` flag, so renderers never re-trigger an animation for an
//! item that did not move.

pub mod combine;
pub mod keyboard;
pub mod over;
pub mod placement;
pub mod reorder;

use dropline_core::{
    Critical, DimensionMap, Displacement, DraggableDimension, DraggableId, DraggableLocation,
    DroppableDimension, Impact, MovementConfig, Point,
};

/// Snapshot the movement engine reads from.
#[derive(Debug, Clone, Copy)]
pub struct MovementContext<'a> {
    pub critical: &'a Critical,
    pub dimensions: &'a DimensionMap,
    /// Impact published before this computation.
    pub previous: &'a Impact,
    pub config: &'a MovementConfig,
    /// Only the home droppable is a candidate (collection still in flight).
    pub home_only: bool,
    /// `should_animate` for siblings that were not displaced before.
    pub animate_new: bool,
}

impl<'a> MovementContext<'a> {
    /// The dragged item's frozen dimension.
    pub fn dragged(&self) -> Option<&'a DraggableDimension> {
        self.dimensions.draggables.get(&self.critical.draggable.id)
    }

    /// Whether `droppable` is the item's home.
    pub fn is_home(&self, droppable: &DroppableDimension) -> bool {
        droppable.id() == &self.critical.droppable.id
    }

    /// Whether the previous impact targeted `droppable`.
    pub fn previously_targeted(&self, droppable: &DroppableDimension) -> bool {
        self.previous.target_droppable() == Some(droppable.id())
    }

    /// Displacement entry honouring the stability rule.
    pub fn displacement(&self, id: &DraggableId) -> Displacement {
        let should_animate = self
            .previous
            .displaced
            .iter()
            .find(|d| &d.draggable_id == id)
            .map_or(self.animate_new, |d| d.should_animate);
        Displacement {
            draggable_id: id.clone(),
            should_animate,
        }
    }

    /// Gap the dragged item opens along `droppable`'s axis.
    pub fn displaced_by(&self, droppable: &DroppableDimension) -> Point {
        let size = self
            .dragged()
            .map_or(0.0, |d| d.displace_along(droppable.axis));
        droppable.axis.point(size, 0.0)
    }

    pub fn location(&self, droppable: &DroppableDimension, index: usize) -> DraggableLocation {
        DraggableLocation::new(droppable.id().clone(), index)
    }
}

/// Impact for a continuous (pointer) position.
///
/// `page_center` is the dragged item's border-box centre in page coordinates.
/// Disabled or missing droppables collapse to [`Impact::no_op`].
pub fn fluid_impact(ctx: &MovementContext<'_>, page_center: Point) -> Impact {
    let Some(dragged) = ctx.dragged() else {
        return Impact::no_op();
    };
    let Some(droppable) = over::droppable_over(ctx, page_center) else {
        return Impact::no_op();
    };
    if !droppable.is_enabled {
        return Impact::no_op();
    }

    // Compare against frozen boxes: shift the dragged centre into the
    // droppable's capture-time scroll position.
    let center = page_center + droppable.scroll_diff();

    if droppable.is_combine_enabled
        && let Some(impact) = combine::combine_impact(ctx, dragged, droppable, center)
    {
        return impact;
    }
    reorder::reorder_impact(ctx, dragged, droppable, center)
}

/// Recompute an impact after geometry changed without the item moving.
///
/// Snap drags keep their logical destination (clamped to the new list
/// length); fluid drags re-run hit testing.
pub fn recompute(ctx: &MovementContext<'_>, page_center: Point, snap: bool) -> Impact {
    if !snap {
        return fluid_impact(ctx, page_center);
    }
    let Some(destination) = &ctx.previous.destination else {
        return Impact::no_op();
    };
    match ctx.dimensions.droppables.get(&destination.droppable_id) {
        Some(droppable) if droppable.is_enabled => {
            keyboard::impact_for_index(ctx, droppable, destination.index)
        }
        _ => Impact::no_op(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use dropline_core::{DimensionMap, DroppableId, Impact};

    fn board() -> DimensionMap {
        let mut map = DimensionMap::default();
        column(&mut map, "todo", 0.0, &["A", "B", "C"]);
        column(&mut map, "done", 200.0, &["X", "Y"]);
        map
    }

    fn ctx<'a>(
        critical: &'a Critical,
        map: &'a DimensionMap,
        previous: &'a Impact,
        config: &'a MovementConfig,
    ) -> MovementContext<'a> {
        MovementContext {
            critical,
            dimensions: map,
            previous,
            config,
            home_only: false,
            animate_new: true,
        }
    }

    #[test]
    fn lifting_in_place_targets_origin() {
        let map = board();
        let critical = fixtures::critical(&map, "B");
        let previous = Impact::no_op();
        let config = MovementConfig::default();
        let impact = fluid_impact(
            &ctx(&critical, &map, &previous, &config),
            center_of(&map, "B", 0.0, 0.0),
        );
        assert_eq!(impact.destination, Some(DraggableLocation::new("todo", 1)));
        assert!(impact.displaced.is_empty());
    }

    #[test]
    fn outside_every_droppable_is_no_op() {
        let map = board();
        let critical = fixtures::critical(&map, "A");
        let previous = Impact::no_op();
        let config = MovementConfig::default();
        let impact = fluid_impact(
            &ctx(&critical, &map, &previous, &config),
            Point::new(150.0, 20.0),
        );
        assert!(impact.is_no_op());
        assert!(impact.displaced.is_empty());
    }

    #[test]
    fn disabled_droppable_is_no_op() {
        let mut map = board();
        map.droppables
            .get_mut(&DroppableId::new("done"))
            .unwrap()
            .is_enabled = false;
        let critical = fixtures::critical(&map, "A");
        let previous = Impact::no_op();
        let config = MovementConfig::default();
        let impact = fluid_impact(
            &ctx(&critical, &map, &previous, &config),
            Point::new(250.0, 20.0),
        );
        assert!(impact.is_no_op());
    }

    #[test]
    fn stability_keeps_should_animate() {
        let map = board();
        let critical = fixtures::critical(&map, "A");
        let config = MovementConfig::default();
        let first_prev = Impact::no_op();
        let center = center_of(&map, "A", 0.0, 30.0);
        let first = fluid_impact(&ctx(&critical, &map, &first_prev, &config), center);
        assert_eq!(first.displaced.len(), 1);
        assert!(first.displaced[0].should_animate);

        // Same geometry, but the previous impact says "do not animate".
        let mut frozen = first.clone();
        frozen.displaced[0].should_animate = false;
        let second = fluid_impact(&ctx(&critical, &map, &frozen, &config), center);
        assert!(!second.displaced[0].should_animate);
    }

    #[test]
    fn home_only_ignores_other_droppables() {
        let map = board();
        let critical = fixtures::critical(&map, "A");
        let previous = Impact::no_op();
        let config = MovementConfig::default();
        let mut context = ctx(&critical, &map, &previous, &config);
        context.home_only = true;
        let impact = fluid_impact(&context, Point::new(250.0, 20.0));
        assert!(impact.is_no_op());
    }
}
