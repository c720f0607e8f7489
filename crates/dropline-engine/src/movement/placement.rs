#![forbid(unsafe_code)]

//! Where the dragged item ends up, and how long it takes to get there.

use std::time::Duration;

use dropline_core::{
    Axis, Critical, DimensionMap, DraggableDimension, DropAnimationConfig, DropReason, Impact,
    Point, Spacing,
};

fn margin_start(axis: Axis, margin: &Spacing) -> f32 {
    match axis {
        Axis::Vertical => margin.top,
        Axis::Horizontal => margin.left,
    }
}

fn margin_cross_start(axis: Axis, margin: &Spacing) -> f32 {
    margin_start(axis.flip(), margin)
}

/// Page-space offset from the item's original border box to the slot the
/// impact would drop it into.
///
/// A no-op impact returns the item home ([`Point::ORIGIN`]). The result
/// already accounts for the target droppable's scroll change.
pub fn new_home_page_offset(critical: &Critical, dimensions: &DimensionMap, impact: &Impact) -> Point {
    let Some(dragged) = dimensions.draggables.get(&critical.draggable.id) else {
        return Point::ORIGIN;
    };
    if let Some(combine) = &impact.combine {
        return combine_offset(dragged, dimensions, combine);
    }
    let Some(destination) = &impact.destination else {
        return Point::ORIGIN;
    };
    let Some(droppable) = dimensions.droppables.get(&destination.droppable_id) else {
        return Point::ORIGIN;
    };
    let axis = droppable.axis;
    let siblings = dimensions.draggables_in(droppable.id());
    let original = dragged.page.border_box;

    let slot = match siblings.iter().position(|s| s.id() == dragged.id()) {
        Some(origin) => {
            let index = destination.index.min(siblings.len().saturating_sub(1));
            let travel: f32 = if index > origin {
                siblings[origin + 1..=index]
                    .iter()
                    .map(|s| s.displace_along(axis))
                    .sum()
            } else {
                -siblings[index..origin]
                    .iter()
                    .map(|s| s.displace_along(axis))
                    .sum::<f32>()
            };
            axis.point(travel, 0.0)
        }
        None => {
            let margin = &dragged.page.margin;
            let main_start = match siblings.get(destination.index) {
                Some(next) => axis.start(&next.page.margin_box()),
                None => match siblings.last() {
                    Some(last) => axis.end(&last.page.margin_box()),
                    None => axis.start(&droppable.page.border_box),
                },
            } + margin_start(axis, margin);
            let cross_start = match siblings.first() {
                Some(first) => axis.cross_start(&first.page.border_box),
                None => {
                    axis.cross_start(&droppable.page.border_box) + margin_cross_start(axis, margin)
                }
            };
            let target = axis.point(main_start, cross_start);
            target - Point::new(original.x, original.y)
        }
    };

    slot - droppable.scroll_diff()
}

fn combine_offset(
    dragged: &DraggableDimension,
    dimensions: &DimensionMap,
    combine: &dropline_core::Combine,
) -> Point {
    let Some(target) = dimensions.draggables.get(&combine.draggable_id) else {
        return Point::ORIGIN;
    };
    let scroll = dimensions
        .droppables
        .get(&combine.droppable_id)
        .map_or(Point::ORIGIN, |d| d.scroll_diff());
    target.page.border_box.center() - dragged.page.border_box.center() - scroll
}

/// Length of the drop animation for a `distance` pixel trip.
///
/// Zero distance skips the animation entirely. Cancels run faster.
pub fn drop_duration(distance: f32, reason: DropReason, config: &DropAnimationConfig) -> Duration {
    if distance <= f32::EPSILON {
        return Duration::ZERO;
    }
    let min = config.min_drop_ms as f64;
    let max = config.max_drop_ms as f64;
    let ratio = if config.max_drop_at_distance > 0.0 {
        f64::from(distance / config.max_drop_at_distance).min(1.0)
    } else {
        1.0
    };
    let mut ms = min + (max - min) * ratio;
    if reason == DropReason::Cancel {
        ms *= f64::from(config.cancel_modifier);
    }
    Duration::from_micros((ms.max(0.0) * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use dropline_core::{Combine, DraggableLocation, DroppableId};

    fn board() -> DimensionMap {
        let mut map = DimensionMap::default();
        column(&mut map, "todo", 0.0, &["A", "B", "C"]);
        column(&mut map, "done", 200.0, &["X", "Y"]);
        column(&mut map, "empty", 400.0, &[]);
        map
    }

    fn at(droppable: &str, index: usize) -> Impact {
        Impact::at_location(DraggableLocation::new(droppable, index), Point::new(0.0, ITEM_HEIGHT))
    }

    #[test]
    fn no_op_returns_home() {
        let map = board();
        let critical = critical(&map, "B");
        assert_eq!(new_home_page_offset(&critical, &map, &Impact::no_op()), Point::ORIGIN);
        assert_eq!(new_home_page_offset(&critical, &map, &at("todo", 1)), Point::ORIGIN);
    }

    #[test]
    fn home_list_slots() {
        let map = board();
        let from_a = critical(&map, "A");
        assert_eq!(
            new_home_page_offset(&from_a, &map, &at("todo", 2)),
            Point::new(0.0, 80.0)
        );
        let from_c = critical(&map, "C");
        assert_eq!(
            new_home_page_offset(&from_c, &map, &at("todo", 0)),
            Point::new(0.0, -80.0)
        );
    }

    #[test]
    fn foreign_list_slots() {
        let map = board();
        let critical = critical(&map, "A");
        // Before Y (y = 40) in the column at x = 200.
        assert_eq!(
            new_home_page_offset(&critical, &map, &at("done", 1)),
            Point::new(200.0, 40.0)
        );
        // After Y.
        assert_eq!(
            new_home_page_offset(&critical, &map, &at("done", 2)),
            Point::new(200.0, 80.0)
        );
        // Empty column starts at its top edge.
        assert_eq!(
            new_home_page_offset(&critical, &map, &at("empty", 0)),
            Point::new(400.0, 0.0)
        );
    }

    #[test]
    fn combine_targets_sibling_centre() {
        let map = board();
        let critical = critical(&map, "A");
        let impact = Impact {
            combine: Some(Combine {
                draggable_id: "Y".into(),
                droppable_id: DroppableId::new("done"),
            }),
            ..Impact::no_op()
        };
        assert_eq!(new_home_page_offset(&critical, &map, &impact), Point::new(200.0, 40.0));
    }

    #[test]
    fn duration_scales_with_distance() {
        let config = DropAnimationConfig::default();
        assert_eq!(drop_duration(0.0, DropReason::Drop, &config), Duration::ZERO);

        let short = drop_duration(10.0, DropReason::Drop, &config);
        let long = drop_duration(5000.0, DropReason::Drop, &config);
        assert!(short < long);
        assert_eq!(long.as_millis(), u128::from(config.max_drop_ms));

        let cancel = drop_duration(5000.0, DropReason::Cancel, &config);
        assert!(cancel < long);
    }
}
