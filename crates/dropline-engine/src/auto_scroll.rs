#![forbid(unsafe_code)]

//! Edge auto-scrolling during fluid drags.
//!
//! Each frame [`AutoScroller::tick`] looks at how close the dragged centre is
//! to the edges of the scroll container it is over, and of the window, and
//! produces at most one [`ScrollRequest`]. The drag context executes it
//! through the marshal (droppables) or the window callbacks.
//!
//! # Speed curve
//!
//! Inside the threshold band (`start_from_percentage` of the container size)
//! speed grows as `percentage ^ ease_exponent` up to `max_pixel_scroll`,
//! reached at `max_speed_at_percentage`. Early in a drag the speed is
//! dampened: 1 px per frame until `accelerate_at`, then eased up to full
//! speed at `stop_dampening_at`.

use std::time::Duration;

use dropline_core::{AutoScrollConfig, DroppableId, MovementMode, Point, Rect, ScrollDetails};
use tracing::trace;
use web_time::Instant;

use crate::state::DragState;

/// One scroll command for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollRequest {
    Droppable { id: DroppableId, change: Point },
    Window { change: Point },
}

/// Scroll speed (px per frame) for an item `distance` away from an edge of
/// a container `size` long. Never increases with distance.
pub fn speed_for(distance: f32, size: f32, config: &AutoScrollConfig) -> f32 {
    let start_from = size * config.start_from_percentage;
    let max_speed_at = size * config.max_speed_at_percentage;
    if distance >= start_from || start_from <= 0.0 {
        return 0.0;
    }
    if distance <= max_speed_at {
        return config.max_pixel_scroll;
    }
    let range = start_from - max_speed_at;
    let percentage = (start_from - distance) / range;
    (config.max_pixel_scroll * percentage.powf(config.ease_exponent)).ceil()
}

/// Apply start-of-drag dampening to `speed`.
pub fn dampen(speed: f32, elapsed: Duration, config: &AutoScrollConfig) -> f32 {
    if speed == 0.0 {
        return 0.0;
    }
    let accelerate_at = config.accelerate_at();
    let stop_at = config.stop_dampening_at();
    if elapsed < accelerate_at {
        return speed.min(1.0);
    }
    if elapsed >= stop_at || stop_at <= accelerate_at {
        return speed;
    }
    let progress = (elapsed - accelerate_at).as_secs_f32() / (stop_at - accelerate_at).as_secs_f32();
    (speed * progress * progress).ceil().clamp(1.0, speed)
}

/// Signed per-frame change that scrolls `container` toward the edge nearest
/// to `center`. Zero when `center` is outside or far from every edge.
pub fn change_for(center: Point, container: &Rect, config: &AutoScrollConfig) -> Point {
    if !container.contains(center) {
        return Point::ORIGIN;
    }
    let axis_change = |value: f32, start: f32, size: f32| -> f32 {
        let to_start = value - start;
        let to_end = start + size - value;
        if to_end < to_start {
            speed_for(to_end, size, config)
        } else {
            -speed_for(to_start, size, config)
        }
    };
    Point::new(
        axis_change(center.x, container.x, container.width),
        axis_change(center.y, container.y, container.height),
    )
}

fn dampened(change: Point, elapsed: Duration, config: &AutoScrollConfig) -> Point {
    change.map(|v| v.signum() * dampen(v.abs(), elapsed, config))
}

/// Clamp `change` to what `scroll` can still absorb.
fn usable(change: Point, scroll: &ScrollDetails) -> Option<Point> {
    let available = scroll.available(change);
    (!available.is_origin()).then_some(available)
}

/// Per-drag auto-scroll controller.
#[derive(Debug, Clone, Default)]
pub struct AutoScroller {
    config: AutoScrollConfig,
    started_at: Option<Instant>,
}

impl AutoScroller {
    #[must_use]
    pub fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            started_at: None,
        }
    }

    /// A drag lifted at `now`; dampening counts from here.
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    /// Forget the current drag.
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Compute this frame's scroll request.
    ///
    /// Only fluid drags in the `Dragging` phase scroll. A droppable that can
    /// still move in the requested direction wins over the window.
    pub fn tick(&mut self, state: &DragState, now: Instant) -> Option<ScrollRequest> {
        let DragState::Dragging(drag) = state else {
            return None;
        };
        if self.config.disabled || drag.mode != MovementMode::Fluid {
            return None;
        }
        let started = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started);
        let center = drag.current.page_center;

        let droppable = drag
            .impact
            .target_droppable()
            .and_then(|id| drag.dimensions.droppables.get(id))
            .and_then(|d| d.frame.map(|frame| (d.id(), frame)));
        if let Some((id, frame)) = droppable {
            let change = dampened(change_for(center, &frame.page, &self.config), elapsed, &self.config);
            if let Some(change) = usable(change, &frame.scroll) {
                trace!(target: "dropline.auto_scroll", droppable = %id, dx = change.x, dy = change.y, "scroll droppable");
                return Some(ScrollRequest::Droppable {
                    id: id.clone(),
                    change,
                });
            }
        }

        let change = dampened(
            change_for(center, &drag.viewport.frame, &self.config),
            elapsed,
            &self.config,
        );
        let change = usable(change, &drag.viewport.scroll)?;
        trace!(target: "dropline.auto_scroll", dx = change.x, dy = change.y, "scroll window");
        Some(ScrollRequest::Window { change })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Action, DragStore};
    use dropline_core::{
        Axis, BoxModel, Critical, DimensionMap, DragConfig, DraggableDescriptor, DraggableDimension,
        DraggableId, DroppableDescriptor, DroppableDimension, Viewport,
    };

    fn config() -> AutoScrollConfig {
        AutoScrollConfig::default()
    }

    #[test]
    fn speed_is_zero_outside_band() {
        let cfg = config();
        assert_eq!(speed_for(300.0, 1000.0, &cfg), 0.0);
        assert_eq!(speed_for(250.0, 1000.0, &cfg), 0.0);
    }

    #[test]
    fn speed_saturates_near_edge() {
        let cfg = config();
        assert_eq!(speed_for(50.0, 1000.0, &cfg), cfg.max_pixel_scroll);
        assert_eq!(speed_for(0.0, 1000.0, &cfg), cfg.max_pixel_scroll);
    }

    #[test]
    fn speed_never_increases_with_distance() {
        let cfg = config();
        let mut last = f32::INFINITY;
        for distance in 0..300 {
            let speed = speed_for(distance as f32, 1000.0, &cfg);
            assert!(speed <= last, "speed rose at {distance}: {speed} > {last}");
            last = speed;
        }
    }

    #[test]
    fn dampening_ramps_up() {
        let cfg = config();
        assert_eq!(dampen(28.0, Duration::from_millis(100), &cfg), 1.0);
        let mid = dampen(28.0, Duration::from_millis(800), &cfg);
        assert!(mid > 1.0 && mid < 28.0, "mid = {mid}");
        assert_eq!(dampen(28.0, Duration::from_millis(1500), &cfg), 28.0);
        assert_eq!(dampen(0.0, Duration::from_millis(1500), &cfg), 0.0);
    }

    #[test]
    fn change_points_toward_nearest_edge() {
        let cfg = config();
        let container = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let down = change_for(Point::new(500.0, 990.0), &container, &cfg);
        assert_eq!(down, Point::new(0.0, cfg.max_pixel_scroll));
        let up = change_for(Point::new(500.0, 10.0), &container, &cfg);
        assert_eq!(up, Point::new(0.0, -cfg.max_pixel_scroll));
        assert_eq!(change_for(Point::new(500.0, 500.0), &container, &cfg), Point::ORIGIN);
        assert_eq!(change_for(Point::new(-5.0, 500.0), &container, &cfg), Point::ORIGIN);
    }

    /// A fluid drag whose centre sits 10px above the window's bottom edge.
    fn dragging_near_window_bottom() -> DragState {
        let mut map = DimensionMap::default();
        map.insert_droppable(DroppableDimension::new(
            DroppableDescriptor::new("list", "DEFAULT"),
            Axis::Vertical,
            BoxModel::from_rect(Rect::new(350.0, 0.0, 100.0, 2000.0)),
            Point::ORIGIN,
        ));
        map.insert_draggable(DraggableDimension::new(
            DraggableDescriptor::new("a", 0, "list", "DEFAULT"),
            BoxModel::from_rect(Rect::new(350.0, 570.0, 100.0, 40.0)),
            Point::ORIGIN,
        ));
        let critical = Critical {
            draggable: map.draggables[&DraggableId::new("a")].descriptor.clone(),
            droppable: map.droppables[&DroppableId::new("list")].descriptor.clone(),
        };
        let mut store = DragStore::new(DragConfig::default());
        store
            .dispatch(Action::InitialPublish {
                critical,
                dimensions: map,
                viewport: Viewport::new(800.0, 600.0, Point::ORIGIN, Point::new(0.0, 1000.0)),
                client_selection: Point::new(400.0, 590.0),
                mode: MovementMode::Fluid,
                is_complete: true,
            })
            .unwrap();
        store.state().clone()
    }

    #[test]
    fn idle_state_yields_nothing() {
        let mut scroller = AutoScroller::new(config());
        assert_eq!(scroller.tick(&DragState::default(), Instant::now()), None);
    }

    #[test]
    fn dampening_counts_from_lift() {
        let state = dragging_near_window_bottom();
        let lifted = Instant::now();
        let later = lifted + Duration::from_millis(1500);

        let mut scroller = AutoScroller::new(config());
        scroller.start(lifted);
        assert_eq!(
            scroller.tick(&state, later),
            Some(ScrollRequest::Window {
                change: Point::new(0.0, config().max_pixel_scroll)
            })
        );

        // Unstamped, the first tick starts the clock.
        let mut unstamped = AutoScroller::new(config());
        assert_eq!(
            unstamped.tick(&state, later),
            Some(ScrollRequest::Window {
                change: Point::new(0.0, 1.0)
            })
        );
    }
}
