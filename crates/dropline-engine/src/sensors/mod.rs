#![forbid(unsafe_code)]

//! Built-in input sensors.
//!
//! A sensor turns raw [`InputEvent`]s into lock calls. The built-in ones
//! only use the public [`SensorApi`], so custom sensors (voice, gamepads,
//! scripted tests) can be written the same way.
//!
//! # State machines
//!
//! - [`PointerSensor`]: press, then move past the sloppy-click threshold to
//!   lift. Release drops; Escape cancels.
//! - [`TouchSensor`]: press and hold for the long-press delay to lift.
//!   Moving first means the user is scrolling, so the claim is abandoned.
//! - [`KeyboardSensor`]: Space lifts the focused item and drops it again.
//!   Arrows move it one slot at a time.
//!
//! Every sensor drops its handles as soon as the lock is revoked from
//! outside, so a stale handle is never used twice.

mod keyboard;
mod pointer;
mod touch;

use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;
use dropline_core::{DraggableId, Point};
use web_time::Instant;

use crate::context::SensorApi;

pub use keyboard::KeyboardSensor;
pub use pointer::PointerSensor;
pub use touch::TouchSensor;

bitflags! {
    /// Modifier keys held during a press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Escape,
    Enter,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Raw input, as the host received it.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        button: PointerButton,
        client: Point,
        modifiers: Modifiers,
        /// The press landed on an interactive element (input, button, ...).
        interactive: bool,
    },
    PointerMove {
        client: Point,
    },
    PointerUp {
        client: Point,
    },
    /// `focused` is the draggable that currently has keyboard focus.
    KeyDown {
        key: Key,
        focused: Option<DraggableId>,
    },
    TouchStart {
        client: Point,
        at: Instant,
        interactive: bool,
    },
    TouchMove {
        client: Point,
    },
    TouchEnd,
    TouchCancel,
    /// Pressure of a force-touch, `0.0..=1.0`.
    ForcePress {
        force: f32,
    },
    Resize,
    VisibilityHidden,
}

/// A source of drag input.
pub trait Sensor {
    /// Feed one event. Returns `true` when the sensor consumed it (the host
    /// should suppress its default behaviour).
    fn handle(&mut self, event: &InputEvent, api: &mut SensorApi<'_>) -> bool;

    /// Called once per frame; time-based sensors lift here.
    fn tick(&mut self, _now: Instant, _api: &mut SensorApi<'_>) {}

    /// Whether the sensor currently holds a lock.
    fn is_active(&self) -> bool;
}

/// Coarse sensor progress, used to pick a transition before touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Idle,
    Pending,
    Dragging,
}

/// Set by the lock's abort callback; checked before each event.
#[derive(Debug, Clone, Default)]
pub(crate) struct AbortSignal(Rc<Cell<bool>>);

impl AbortSignal {
    /// Fresh signal plus the callback that raises it.
    pub(crate) fn arm(&mut self) -> impl FnOnce() + 'static {
        self.0 = Rc::new(Cell::new(false));
        let flag = Rc::clone(&self.0);
        move || flag.set(true)
    }

    /// Whether the lock was revoked since the last `arm`.
    pub(crate) fn raised(&self) -> bool {
        self.0.get()
    }
}

/// Draggable under `client`, if pressing there may start a drag.
pub(crate) fn press_target(api: &SensorApi<'_>, client: Point, interactive: bool) -> Option<DraggableId> {
    let id = api.find_closest_draggable_id(client)?;
    let options = api.find_options_for_draggable(&id)?;
    if interactive && !options.can_drag_interactive_elements {
        return None;
    }
    api.can_get_lock(&id).then_some(id)
}

#[cfg(test)]
pub(crate) mod testing {
    use dropline_core::{
        Axis, BoxModel, DragConfig, DraggableDescriptor, DraggableDimension, DroppableDescriptor,
        DroppableDimension, Point, Rect, Viewport,
    };

    use crate::context::DragContext;
    use crate::registry::{
        DraggableEntry, DraggableOptions, DroppableCallbacks, DroppableEntry, WindowCallbacks,
    };

    pub(crate) struct Window;

    impl WindowCallbacks for Window {
        fn viewport(&self) -> Viewport {
            Viewport::new(800.0, 600.0, Point::ORIGIN, Point::ORIGIN)
        }

        fn scroll_by(&mut self, _change: Point) {}
    }

    struct Column(f32);

    impl DroppableCallbacks for Column {
        fn get_dimension(&mut self, window_scroll: Point) -> DroppableDimension {
            DroppableDimension::new(
                DroppableDescriptor::new("unset", "DEFAULT"),
                Axis::Vertical,
                BoxModel::from_rect(Rect::new(self.0, 0.0, 100.0, 200.0)),
                window_scroll,
            )
        }

        fn scroll(&mut self, _change: Point) {}
    }

    /// Two columns, `todo` = [a, b, c] at x 0 and `done` = [x] at x 200.
    /// Item `b` does not respect force press.
    pub(crate) fn board() -> DragContext {
        let mut ctx = DragContext::new(Window, DragConfig::default());
        for (id, x) in [("todo", 0.0), ("done", 200.0)] {
            ctx.register_droppable(DroppableEntry::new(
                DroppableDescriptor::new(id, "DEFAULT"),
                Column(x),
            ));
        }
        let items = [("a", 0, "todo", 0.0), ("b", 1, "todo", 0.0), ("c", 2, "todo", 0.0), ("x", 0, "done", 200.0)];
        for (id, index, list, x) in items {
            let top = index as f32 * 40.0;
            let entry = DraggableEntry::new(
                DraggableDescriptor::new(id, index, list, "DEFAULT"),
                move |scroll: Point| {
                    DraggableDimension::new(
                        DraggableDescriptor::new("unset", 0, "unset", "DEFAULT"),
                        BoxModel::from_rect(Rect::new(x, top, 100.0, 40.0)),
                        scroll,
                    )
                },
            );
            let entry = if id == "b" {
                entry.with_options(DraggableOptions {
                    should_respect_force_press: false,
                    ..DraggableOptions::default()
                })
            } else {
                entry
            };
            ctx.register_draggable(entry);
        }
        ctx
    }
}
