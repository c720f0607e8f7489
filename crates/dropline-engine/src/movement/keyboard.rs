#![forbid(unsafe_code)]

//! Discrete (snap) movement.
//!
//! Main-axis arrows step the destination index by one. Cross-axis arrows
//! jump to the nearest droppable in that direction. Both produce the same
//! kind of [`Impact`] a pointer would, so the rest of the pipeline does not
//! care which sensor is in charge.

use dropline_core::{DraggableDimension, DroppableDimension, Impact, Point};

use super::MovementContext;

/// Direction along (or across) a droppable's axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Backward,
    Forward,
}

/// Impact for placing the dragged item at `requested` in `droppable`.
///
/// Home lists clamp to `0..len`, foreign lists to `0..=len`.
pub fn impact_for_index(
    ctx: &MovementContext<'_>,
    droppable: &DroppableDimension,
    requested: usize,
) -> Impact {
    let Some(dragged) = ctx.dragged() else {
        return Impact::no_op();
    };
    let siblings = ctx.dimensions.draggables_in(droppable.id());

    let (index, displaced): (usize, &[&DraggableDimension]) = match siblings
        .iter()
        .position(|s| s.id() == dragged.id())
    {
        Some(origin) => {
            let index = requested.min(siblings.len().saturating_sub(1));
            let displaced = if index > origin {
                &siblings[origin + 1..=index]
            } else {
                &siblings[index..origin]
            };
            (index, displaced)
        }
        None => {
            let index = requested.min(siblings.len());
            (index, &siblings[index..])
        }
    };

    Impact {
        displaced: displaced
            .iter()
            .map(|sibling| ctx.displacement(sibling.id()))
            .collect(),
        displaced_by: ctx.displaced_by(droppable),
        destination: Some(ctx.location(droppable, index)),
        combine: None,
    }
}

/// Step the current destination one slot along its droppable's axis.
///
/// Returns `None` when there is nowhere to go (already at an end, or the
/// item is not over a droppable).
pub fn move_on_main_axis(ctx: &MovementContext<'_>, step: Step) -> Option<Impact> {
    let current = ctx.previous.destination.as_ref()?;
    let droppable = ctx.dimensions.droppables.get(&current.droppable_id)?;
    let requested = match step {
        Step::Forward => current.index + 1,
        Step::Backward => current.index.checked_sub(1)?,
    };
    let impact = impact_for_index(ctx, droppable, requested);
    (impact.destination.as_ref() != Some(current)).then_some(impact)
}

/// Jump to the closest enabled droppable of the same type across the
/// current droppable's axis.
///
/// The insertion point is the first sibling whose centre lies past the
/// dragged item's current centre along the target's axis.
pub fn move_on_cross_axis(
    ctx: &MovementContext<'_>,
    page_center: Point,
    step: Step,
) -> Option<Impact> {
    let current_id = ctx
        .previous
        .target_droppable()
        .unwrap_or(&ctx.critical.droppable.id);
    let current = ctx.dimensions.droppables.get(current_id)?;
    let axis = current.axis;
    let origin = axis.cross(current.page.border_box.center());

    let target = ctx
        .dimensions
        .droppables
        .values()
        .filter(|d| d.id() != current.id())
        .filter(|d| d.is_enabled && d.type_id() == current.type_id())
        .filter_map(|d| {
            let center = d.page.border_box.center();
            let delta = axis.cross(center) - origin;
            let ahead = match step {
                Step::Forward => delta > 0.0,
                Step::Backward => delta < 0.0,
            };
            ahead.then(|| {
                let along = (axis.main(center) - axis.main(page_center)).abs();
                (delta.abs(), along, d)
            })
        })
        .min_by(|(a_cross, a_main, a), (b_cross, b_main, b)| {
            a_cross
                .total_cmp(b_cross)
                .then_with(|| a_main.total_cmp(b_main))
                .then_with(|| a.id().cmp(b.id()))
        })
        .map(|(_, _, d)| d)?;

    let target_axis = target.axis;
    let probe = target_axis.main(page_center + target.scroll_diff());
    let index = ctx
        .dimensions
        .draggables_in(target.id())
        .iter()
        .filter(|s| s.id() != &ctx.critical.draggable.id)
        .position(|s| target_axis.main(s.page.border_box.center()) > probe)
        .unwrap_or_else(|| {
            ctx.dimensions
                .draggables_in(target.id())
                .iter()
                .filter(|s| s.id() != &ctx.critical.draggable.id)
                .count()
        });

    Some(impact_for_index(ctx, target, index))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use dropline_core::{Critical, DimensionMap, DraggableLocation, MovementConfig};

    fn board() -> DimensionMap {
        let mut map = DimensionMap::default();
        column(&mut map, "left", 0.0, &["A", "B", "C"]);
        column(&mut map, "middle", 200.0, &["X", "Y"]);
        column(&mut map, "right", 400.0, &[]);
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

    fn start(map: &DimensionMap, id: &str) -> Impact {
        let critical = critical(map, id);
        Impact::at_location(critical.source(), Point::new(0.0, ITEM_HEIGHT))
    }

    #[test]
    fn main_axis_steps_and_clamps() {
        let map = board();
        let critical = critical(&map, "A");
        let config = MovementConfig::default();
        let mut impact = start(&map, "A");

        assert!(move_on_main_axis(&ctx(&critical, &map, &impact, &config), Step::Backward).is_none());

        for expected in [1, 2] {
            impact = move_on_main_axis(&ctx(&critical, &map, &impact, &config), Step::Forward)
                .expect("room to move");
            assert_eq!(impact.destination, Some(DraggableLocation::new("left", expected)));
        }
        assert_eq!(impact.displaced.len(), 2);
        assert!(move_on_main_axis(&ctx(&critical, &map, &impact, &config), Step::Forward).is_none());
    }

    #[test]
    fn moving_back_home_clears_displacement() {
        let map = board();
        let critical = critical(&map, "B");
        let config = MovementConfig::default();
        let impact = start(&map, "B");
        let up = move_on_main_axis(&ctx(&critical, &map, &impact, &config), Step::Backward).unwrap();
        assert_eq!(up.displaced.len(), 1);
        let back = move_on_main_axis(&ctx(&critical, &map, &up, &config), Step::Forward).unwrap();
        assert_eq!(back.destination, Some(DraggableLocation::new("left", 1)));
        assert!(back.displaced.is_empty());
    }

    #[test]
    fn cross_axis_picks_nearest_column() {
        let map = board();
        let critical = critical(&map, "B");
        let config = MovementConfig::default();
        let impact = start(&map, "B");
        let center = center_of(&map, "B", 0.0, 0.0);

        let moved =
            move_on_cross_axis(&ctx(&critical, &map, &impact, &config), center, Step::Forward)
                .unwrap();
        // B's centre (60) sits between X (20) and Y (60, not strictly past).
        assert_eq!(moved.destination, Some(DraggableLocation::new("middle", 2)));

        let further =
            move_on_cross_axis(&ctx(&critical, &map, &moved, &config), center, Step::Forward)
                .unwrap();
        assert_eq!(further.destination, Some(DraggableLocation::new("right", 0)));
        assert!(further.displaced.is_empty());

        assert!(
            move_on_cross_axis(&ctx(&critical, &map, &further, &config), center, Step::Forward)
                .is_none()
        );
    }

    #[test]
    fn foreign_index_clamps_to_len() {
        let map = board();
        let critical = critical(&map, "A");
        let config = MovementConfig::default();
        let previous = Impact::no_op();
        let middle = &map.droppables[&dropline_core::DroppableId::new("middle")];
        let impact = impact_for_index(&ctx(&critical, &map, &previous, &config), middle, 99);
        assert_eq!(impact.destination, Some(DraggableLocation::new("middle", 2)));
        assert!(impact.displaced.is_empty());
    }
}
