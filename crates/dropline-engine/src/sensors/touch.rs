#![forbid(unsafe_code)]

use dropline_core::Point;
use tracing::trace;
use web_time::Instant;

use super::{AbortSignal, InputEvent, Sensor, Stage, press_target};
use crate::context::SensorApi;
use crate::lock::{FluidDragActions, PreDragActions};

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Pending {
        actions: PreDragActions,
        origin: Point,
        since: Instant,
    },
    Dragging(FluidDragActions),
}

/// Touch sensor: long press to lift.
///
/// The press claims the lock and starts the long-press clock; the lift
/// happens on the first [`tick`](Sensor::tick) past `long_press_delay`. Any
/// movement before that hands the gesture back to the host as a scroll.
#[derive(Debug, Default)]
pub struct TouchSensor {
    state: State,
    aborted: AbortSignal,
}

impl TouchSensor {
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

    fn start(&mut self, client: Point, at: Instant, interactive: bool, api: &mut SensorApi<'_>) -> bool {
        let Some(id) = press_target(api, client, interactive) else {
            return false;
        };
        let on_abort = self.aborted.arm();
        let Some(actions) = api.try_get_lock(&id, on_abort) else {
            return false;
        };
        trace!(target: "dropline.lock", draggable = %id, "touch start claimed lock");
        self.state = State::Pending {
            actions,
            origin: client,
            since: at,
        };
        false
    }

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

    fn force_press(&mut self, force: f32, api: &mut SensorApi<'_>) -> bool {
        if force < api.config().force_press_threshold {
            return false;
        }
        let respects = match &self.state {
            State::Idle => return false,
            State::Pending { actions, .. } => actions.should_respect_force_press(api),
            State::Dragging(drag) => drag.should_respect_force_press(api),
        };
        if !respects {
            return false;
        }
        trace!(target: "dropline.lock", force, "force press ends the gesture");
        self.finish(api, true)
    }
}

impl Sensor for TouchSensor {
    fn handle(&mut self, event: &InputEvent, api: &mut SensorApi<'_>) -> bool {
        if self.aborted.raised() {
            self.state = State::Idle;
        }
        match (event, self.stage()) {
            (
                InputEvent::TouchStart {
                    client,
                    at,
                    interactive,
                },
                Stage::Idle,
            ) => self.start(*client, *at, *interactive, api),
            // Moving before the long press fires is a scroll.
            (InputEvent::TouchMove { .. }, Stage::Pending) => self.finish(api, true),
            (InputEvent::TouchMove { client }, Stage::Dragging) => match &self.state {
                State::Dragging(drag) => drag.move_to(api, *client),
                _ => false,
            },
            (InputEvent::TouchEnd, _) => self.finish(api, false),
            (InputEvent::TouchCancel | InputEvent::Resize | InputEvent::VisibilityHidden, _) => {
                self.finish(api, true)
            }
            (InputEvent::ForcePress { force }, _) => self.force_press(*force, api),
            _ => false,
        }
    }

    fn tick(&mut self, now: Instant, api: &mut SensorApi<'_>) {
        if self.aborted.raised() {
            self.state = State::Idle;
            return;
        }
        let State::Pending { since, .. } = &self.state else {
            return;
        };
        if now.saturating_duration_since(*since) < api.config().long_press_delay() {
            return;
        }
        if let State::Pending { actions, origin, .. } = std::mem::take(&mut self.state)
            && let Some(drag) = actions.fluid_lift(api, origin)
        {
            self.state = State::Dragging(drag);
        }
    }

    fn is_active(&self) -> bool {
        self.stage() != Stage::Idle
    }
}
