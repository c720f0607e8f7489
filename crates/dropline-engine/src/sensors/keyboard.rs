#![forbid(unsafe_code)]

use tracing::trace;

use super::{AbortSignal, InputEvent, Key, Sensor};
use crate::context::SensorApi;
use crate::lock::SnapDragActions;

/// Keyboard sensor: Space to lift and drop, arrows to move.
#[derive(Debug, Default)]
pub struct KeyboardSensor {
    drag: Option<SnapDragActions>,
    aborted: AbortSignal,
}

impl KeyboardSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lift(&mut self, focused: Option<&dropline_core::DraggableId>, api: &mut SensorApi<'_>) -> bool {
        let Some(id) = focused else {
            return false;
        };
        let on_abort = self.aborted.arm();
        let Some(actions) = api.try_get_lock(id, on_abort) else {
            return false;
        };
        self.drag = actions.snap_lift(api);
        trace!(target: "dropline.lock", draggable = %id, lifted = self.drag.is_some(), "keyboard lift");
        self.drag.is_some()
    }

    fn end(&mut self, api: &mut SensorApi<'_>, cancel: bool) -> bool {
        match self.drag.take() {
            Some(drag) if cancel => drag.cancel(api),
            Some(drag) => drag.drop(api),
            None => false,
        }
    }
}

impl Sensor for KeyboardSensor {
    fn handle(&mut self, event: &InputEvent, api: &mut SensorApi<'_>) -> bool {
        if self.aborted.raised() {
            self.drag = None;
        }
        let Some(drag) = self.drag.as_ref() else {
            return match event {
                InputEvent::KeyDown {
                    key: Key::Space,
                    focused,
                } => self.lift(focused.as_ref(), api),
                _ => false,
            };
        };
        match event {
            InputEvent::KeyDown { key, .. } => match key {
                Key::Space => self.end(api, false),
                Key::Escape => self.end(api, true),
                Key::ArrowUp => drag.move_up(api),
                Key::ArrowDown => drag.move_down(api),
                Key::ArrowLeft => drag.move_left(api),
                Key::ArrowRight => drag.move_right(api),
                // Focus must not leave the item mid-drag.
                Key::Tab | Key::Enter => true,
                Key::Other => false,
            },
            InputEvent::PointerDown { .. }
            | InputEvent::TouchStart { .. }
            | InputEvent::Resize
            | InputEvent::VisibilityHidden => self.end(api, true),
            _ => false,
        }
    }

    fn is_active(&self) -> bool {
        self.drag.is_some()
    }
}
