#![forbid(unsafe_code)]

//! Reorder impacts for continuous movement.
//!
//! Siblings are compared in the droppable's frozen (capture-time) frame. The
//! caller has already shifted the dragged centre by the droppable's scroll
//! change.
//!
//! # Thresholds
//!
//! Without combining, a sibling is crossed once the dragged item's leading
//! edge passes the sibling's midpoint. In combine-enabled droppables the
//! central band of every sibling is reserved for combining, so the dragged
//! centre has to clear the band before the sibling moves.

use dropline_core::{Axis, DraggableDimension, DroppableDimension, Impact, Point, Rect};

use super::MovementContext;

/// Insertion point for `center` in `droppable`.
pub fn reorder_impact(
    ctx: &MovementContext<'_>,
    dragged: &DraggableDimension,
    droppable: &DroppableDimension,
    center: Point,
) -> Impact {
    let siblings = ctx.dimensions.draggables_in(droppable.id());
    let displaced_by = ctx.displaced_by(droppable);
    let thresholds = Thresholds::new(ctx, droppable);

    let (index, displaced) = if ctx.is_home(droppable) {
        home(ctx, dragged, droppable, &siblings, center, &thresholds)
    } else {
        foreign(ctx, dragged, droppable, &siblings, center, &thresholds)
    };

    Impact {
        displaced: displaced
            .iter()
            .map(|sibling| ctx.displacement(sibling.id()))
            .collect(),
        displaced_by,
        destination: Some(ctx.location(droppable, index)),
        combine: None,
    }
}

/// Crossing rules for one droppable.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Thresholds {
    axis: Axis,
    /// Fraction of each sibling reserved for combining, if any.
    combine_fraction: Option<f32>,
}

impl Thresholds {
    pub(crate) fn new(ctx: &MovementContext<'_>, droppable: &DroppableDimension) -> Self {
        Self {
            axis: droppable.axis,
            combine_fraction: droppable
                .is_combine_enabled
                .then(|| ctx.config.combine_inner_fraction.clamp(0.0, 1.0)),
        }
    }

    /// Inset from each end of `rect` outside of which combining is not
    /// possible.
    pub(crate) fn inset(&self, rect: &Rect) -> f32 {
        let fraction = self.combine_fraction.unwrap_or(0.0);
        self.axis.size(rect) * (1.0 - fraction) / 2.0
    }

    /// Moving forward: has the dragged item passed `sibling`?
    fn passed_forward(&self, leading_end: f32, center: f32, sibling: &Rect) -> bool {
        match self.combine_fraction {
            Some(_) => center > self.axis.end(sibling) - self.inset(sibling),
            None => leading_end > self.axis.main(sibling.center()),
        }
    }

    /// Moving backward: has the dragged item passed `sibling`?
    fn passed_backward(&self, leading_start: f32, center: f32, sibling: &Rect) -> bool {
        match self.combine_fraction {
            Some(_) => center < self.axis.start(sibling) + self.inset(sibling),
            None => leading_start < self.axis.main(sibling.center()),
        }
    }
}

fn home<'a>(
    ctx: &MovementContext<'_>,
    dragged: &DraggableDimension,
    droppable: &DroppableDimension,
    siblings: &[&'a DraggableDimension],
    center: Point,
    thresholds: &Thresholds,
) -> (usize, Vec<&'a DraggableDimension>) {
    let axis = droppable.axis;
    let Some(origin) = siblings.iter().position(|s| s.id() == dragged.id()) else {
        // The dragged item is always published into its home list.
        return (ctx.critical.draggable.index.min(siblings.len()), Vec::new());
    };
    let original = dragged.page.border_box;
    let shift = axis.main(center) - axis.main(original.center());
    let main_center = axis.main(center);
    // Combine-enabled lists cross siblings where they are drawn.
    let sibling_box = |sibling: &DraggableDimension| {
        if droppable.is_combine_enabled {
            visual_box(ctx, droppable, sibling)
        } else {
            sibling.page.border_box
        }
    };

    if shift > 0.0 {
        let leading_end = axis.end(&original) + shift;
        let crossed = siblings
            .iter()
            .skip(origin + 1)
            .take_while(|s| thresholds.passed_forward(leading_end, main_center, &sibling_box(**s)))
            .count();
        let displaced = siblings[origin + 1..origin + 1 + crossed].to_vec();
        (origin + crossed, displaced)
    } else if shift < 0.0 {
        let leading_start = axis.start(&original) + shift;
        let crossed = siblings[..origin]
            .iter()
            .rev()
            .take_while(|s| thresholds.passed_backward(leading_start, main_center, &sibling_box(**s)))
            .count();
        let displaced = siblings[origin - crossed..origin].to_vec();
        (origin - crossed, displaced)
    } else {
        (origin, Vec::new())
    }
}

/// Foreign lists: every sibling at or after the insertion point is
/// displaced, so the displaced set is always a suffix of the list.
fn foreign<'a>(
    ctx: &MovementContext<'_>,
    dragged: &DraggableDimension,
    droppable: &DroppableDimension,
    siblings: &[&'a DraggableDimension],
    center: Point,
    thresholds: &Thresholds,
) -> (usize, Vec<&'a DraggableDimension>) {
    let axis = droppable.axis;
    let half = axis.size(&dragged.page.border_box) / 2.0;
    let main_center = axis.main(center);
    let leading_start = main_center - half;

    let insertion = siblings
        .iter()
        .position(|sibling| {
            let rect = visual_box(ctx, droppable, sibling);
            thresholds.passed_backward(leading_start, main_center, &rect)
        })
        .unwrap_or(siblings.len());

    (insertion, siblings[insertion..].to_vec())
}

/// Where a sibling is currently drawn, as far as this droppable's previous
/// impact is concerned.
///
/// In foreign lists a displaced sibling sits one gap further along the axis.
/// In the home list it closes the gap the dragged item left: backwards if it
/// started after the dragged item, forwards if before.
pub(crate) fn visual_box(
    ctx: &MovementContext<'_>,
    droppable: &DroppableDimension,
    sibling: &DraggableDimension,
) -> Rect {
    let rect = sibling.page.border_box;
    if !ctx.previously_targeted(droppable) || !ctx.previous.is_displaced(sibling.id()) {
        return rect;
    }
    let by = ctx.displaced_by(droppable);
    if ctx.is_home(droppable) && sibling.descriptor.index > ctx.critical.draggable.index {
        rect.shift(-by)
    } else {
        rect.shift(by)
    }
}
