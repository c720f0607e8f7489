#![forbid(unsafe_code)]

use dropline_core::Point;
use tracing::trace;

use super::{AbortSignal, InputEvent, Key, PointerButton, Sensor, Stage, press_target};
use crate::context::SensorApi;
use crate::lock::{FluidDragActions, PreDragActions};

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Pending {
        actions: PreDragActions,
        origin: Point,
    },
    Dragging(FluidDragActions),
}

/// Mouse/pen sensor.
///
/// A press claims the lock. The drag only starts once the pointer has
/// travelled `sloppy_click_threshold` away, so plain clicks stay clicks.
#[derive(Debug, Default)]
pub struct PointerSensor {
    state: State,
    aborted: AbortSignal,
}

impl PointerSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&self) -> Stage {
        match self.state {
            State::Idle => Stage::Idle,
            State::Pending { .. } => Stage::Pending,
            State::Dragging(_) => Stage::Dragging,
        }
    }

    fn press(&mut self, client: Point, interactive: bool, api: &mut SensorApi<'_>) -> bool {
        let Some(id) = press_target(api, client, interactive) else {
            return false;
        };
        let on_abort = self.aborted.arm();
        let Some(actions) = api.try_get_lock(&id, on_abort) else {
            return false;
        };
        trace!(target: "dropline.lock", draggable = %id, "pointer press claimed lock");
        self.state = State::Pending {
            actions,
            origin: client,
        };
        // The press itself stays with the host (focus, text selection).
        false
    }

    fn moved(&mut self, client: Point, api: &mut SensorApi<'_>) -> bool {
        match std::mem::take(&mut self.state) {
            State::Pending { actions, origin } => {
                if origin.distance(client) < api.config().sloppy_click_threshold {
                    self.state = State::Pending { actions, origin };
                    return false;
                }
                let Some(drag) = actions.fluid_lift(api, origin) else {
                    return false;
                };
                drag.move_to(api, client);
                self.state = State::Dragging(drag);
                true
            }
            State::Dragging(drag) => {
                drag.move_to(api, client);
                self.state = State::Dragging(drag);
                true
            }
            State::Idle => false,
        }
    }

    /// End whatever is in flight. `cancel` picks cancel over drop.
    fn finish(&mut self, api: &mut SensorApi<'_>, cancel: bool) -> bool {
        match std::mem::take(&mut self.state) {
            State::Idle => false,
            State::Pending { actions, .. } => {
                actions.abort(api);
                false
            }
            State::Dragging(drag) if cancel => drag.cancel(api),
            State::Dragging(drag) => drag.drop(api),
        }
    }
}

impl Sensor for PointerSensor {
    fn handle(&mut self, event: &InputEvent, api: &mut SensorApi<'_>) -> bool {
        if self.aborted.raised() {
            self.state = State::Idle;
        }
        match (event, self.stage()) {
            (
                InputEvent::PointerDown {
                    button: PointerButton::Primary,
                    client,
                    modifiers,
                    interactive,
                },
                Stage::Idle,
            ) if modifiers.is_empty() => self.press(*client, *interactive, api),
            (InputEvent::PointerMove { client }, _) => self.moved(*client, api),
            (InputEvent::PointerUp { .. }, _) => self.finish(api, false),
            (InputEvent::KeyDown { key: Key::Escape, .. }, Stage::Dragging) => {
                self.finish(api, true)
            }
            // Any key while pending means the user is doing something else.
            (InputEvent::KeyDown { .. }, Stage::Pending) => self.finish(api, true),
            // Keys are swallowed during a drag.
            (InputEvent::KeyDown { .. }, Stage::Dragging) => true,
            (InputEvent::Resize | InputEvent::VisibilityHidden, _) => self.finish(api, true),
            _ => false,
        }
    }

    fn is_active(&self) -> bool {
        self.stage() != Stage::Idle
    }
}
