#![forbid(unsafe_code)]

//! Which droppable is the dragged item over?

use dropline_core::{DroppableDimension, Point};

use super::MovementContext;

/// The innermost droppable of the dragged item's type whose visible box
/// contains `page_center`.
///
/// Disabled droppables are still returned so the caller can collapse the
/// impact to a no-op instead of falling through to an outer droppable.
/// Ties on area resolve by id for determinism.
pub fn droppable_over<'a>(
    ctx: &MovementContext<'a>,
    page_center: Point,
) -> Option<&'a DroppableDimension> {
    let home = &ctx.critical.droppable;
    let hit = |droppable: &DroppableDimension| {
        droppable
            .visible_page_box()
            .filter(|rect| rect.contains(page_center))
    };

    if ctx.home_only {
        let droppable = ctx.dimensions.droppables.get(&home.id)?;
        return hit(droppable).map(|_| droppable);
    }

    ctx.dimensions
        .droppables
        .values()
        .filter(|droppable| droppable.type_id() == &home.type_id)
        .filter_map(|droppable| hit(droppable).map(|rect| (rect.area(), droppable)))
        .min_by(|(a_area, a), (b_area, b)| {
            a_area.total_cmp(b_area).then_with(|| a.id().cmp(b.id()))
        })
        .map(|(_, droppable)| droppable)
}
