#![forbid(unsafe_code)]

//! Combine impacts: dropping an item onto a sibling instead of between two.

use dropline_core::{Combine, DraggableDimension, DroppableDimension, Impact, Point};

use super::MovementContext;
use super::reorder::{Thresholds, visual_box};

/// Combine impact if `center` sits inside the central band of a sibling.
///
/// The band covers `combine_inner_fraction` of the sibling along the main
/// axis and its full extent across it. Siblings already displaced keep
/// their displacement so nothing jumps while hovering.
pub fn combine_impact(
    ctx: &MovementContext<'_>,
    dragged: &DraggableDimension,
    droppable: &DroppableDimension,
    center: Point,
) -> Option<Impact> {
    let axis = droppable.axis;
    let thresholds = Thresholds::new(ctx, droppable);
    let main = axis.main(center);
    let cross = axis.cross(center);

    let target = ctx
        .dimensions
        .draggables_in(droppable.id())
        .into_iter()
        .filter(|sibling| sibling.id() != dragged.id())
        .find(|sibling| {
            let rect = visual_box(ctx, droppable, sibling);
            let inset = thresholds.inset(&rect);
            main >= axis.start(&rect) + inset
                && main <= axis.end(&rect) - inset
                && cross >= axis.cross_start(&rect)
                && cross <= axis.cross_end(&rect)
        })?;

    let displaced = if ctx.previously_targeted(droppable) {
        ctx.previous.displaced.clone()
    } else {
        Vec::new()
    };

    Some(Impact {
        displaced,
        displaced_by: ctx.displaced_by(droppable),
        destination: None,
        combine: Some(Combine {
            draggable_id: target.id().clone(),
            droppable_id: droppable.id().clone(),
        }),
    })
}
