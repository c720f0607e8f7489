#![forbid(unsafe_code)]

//! Consumer lifecycle callbacks and screen-reader announcements.
//!
//! [`Responders`] is the single slot of consumer callbacks. The drag context
//! replaces it wholesale via `set_responders`, so the latest callbacks are
//! always the ones invoked.
//!
//! The publisher watches every state the store produces and fires:
//!
//! - `on_drag_start` once, when a drag first becomes visible.
//! - `on_drag_update` only when the destination or combine target changed.
//! - `on_drag_end` once, with the completed result, or with a cancel result
//!   when a live drag was flushed.
//!
//! Each of the three gets an [`Announce`] handle. If the callback does not
//! use it, a default message goes to the [`Announcer`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dropline_core::{
    BeforeCapture, Combine, DragStart, DragUpdate, DraggableLocation, DropReason, DropResult,
};
use tracing::{info, warn};

use crate::state::DragState;

// ---------------------------------------------------------------------------
// Announcements
// ---------------------------------------------------------------------------

/// Sink for screen-reader messages.
pub trait Announcer {
    fn announce(&mut self, message: &str);
}

/// Default sink: emits each message as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnnouncer;

impl Announcer for TracingAnnouncer {
    fn announce(&mut self, message: &str) {
        info!(target: "dropline.responders", text = message, "announce");
    }
}

impl<F> Announcer for F
where
    F: FnMut(&str),
{
    fn announce(&mut self, message: &str) {
        self(message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Open,
    Used,
    Expired,
}

#[derive(Debug)]
struct AnnounceSlot {
    state: SlotState,
    message: Option<String>,
}

/// One-shot announcement handle passed to responders.
///
/// Only the first call while the responder is running counts. Extra or late
/// calls are ignored with a warning under the `dropline.dev` target.
#[derive(Debug, Clone)]
pub struct Announce {
    slot: Rc<RefCell<AnnounceSlot>>,
}

impl Announce {
    fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(AnnounceSlot {
                state: SlotState::Open,
                message: None,
            })),
        }
    }

    /// Replace the default announcement with `message`.
    pub fn call(&self, message: impl Into<String>) {
        let mut slot = self.slot.borrow_mut();
        match slot.state {
            SlotState::Open => {
                slot.message = Some(message.into());
                slot.state = SlotState::Used;
            }
            SlotState::Used => {
                warn!(target: "dropline.dev", "announce was called more than once; only the first message is used");
            }
            SlotState::Expired => {
                warn!(target: "dropline.dev", "announce was called after the responder returned; announcements must be synchronous");
            }
        }
    }

    /// Close the handle and hand back the custom message, if any.
    fn expire(&self) -> Option<String> {
        let mut slot = self.slot.borrow_mut();
        slot.state = SlotState::Expired;
        slot.message.take()
    }
}

// ---------------------------------------------------------------------------
// Responders
// ---------------------------------------------------------------------------

type BeforeCaptureFn = Box<dyn FnMut(&BeforeCapture)>;
type BeforeDragStartFn = Box<dyn FnMut(&DragStart)>;
type DragStartFn = Box<dyn FnMut(&DragStart, &Announce)>;
type DragUpdateFn = Box<dyn FnMut(&DragUpdate, &Announce)>;
type DragEndFn = Box<dyn FnMut(&DropResult, &Announce)>;

/// Consumer callbacks. All optional.
#[derive(Default)]
pub struct Responders {
    before_capture: Option<BeforeCaptureFn>,
    before_drag_start: Option<BeforeDragStartFn>,
    drag_start: Option<DragStartFn>,
    drag_update: Option<DragUpdateFn>,
    drag_end: Option<DragEndFn>,
}

impl Responders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called before anything is measured.
    #[must_use]
    pub fn on_before_capture(mut self, f: impl FnMut(&BeforeCapture) + 'static) -> Self {
        self.before_capture = Some(Box::new(f));
        self
    }

    /// Called after measuring, right before the drag is published.
    #[must_use]
    pub fn on_before_drag_start(mut self, f: impl FnMut(&DragStart) + 'static) -> Self {
        self.before_drag_start = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drag_start(mut self, f: impl FnMut(&DragStart, &Announce) + 'static) -> Self {
        self.drag_start = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drag_update(mut self, f: impl FnMut(&DragUpdate, &Announce) + 'static) -> Self {
        self.drag_update = Some(Box::new(f));
        self
    }

    /// Required in practice: this is where the consumer applies the result.
    #[must_use]
    pub fn on_drag_end(mut self, f: impl FnMut(&DropResult, &Announce) + 'static) -> Self {
        self.drag_end = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Responders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responders")
            .field("before_capture", &self.before_capture.is_some())
            .field("before_drag_start", &self.before_drag_start.is_some())
            .field("drag_start", &self.drag_start.is_some())
            .field("drag_update", &self.drag_update.is_some())
            .field("drag_end", &self.drag_end.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Default messages
// ---------------------------------------------------------------------------

fn position(location: &DraggableLocation) -> usize {
    location.index + 1
}

fn combine_message(draggable: &str, combine: &Combine) -> String {
    format!(
        "The item {draggable} has been combined with {}",
        combine.draggable_id
    )
}

pub(crate) fn drag_start_message(start: &DragStart) -> String {
    format!(
        "You have lifted an item in position {}",
        position(&start.source)
    )
}

pub(crate) fn drag_update_message(update: &DragUpdate) -> String {
    if let Some(combine) = &update.combine {
        return combine_message(update.start.draggable_id.as_str(), combine);
    }
    let source = &update.start.source;
    match &update.destination {
        Some(dest) if dest.droppable_id == source.droppable_id => format!(
            "You have moved the item from position {} to position {}",
            position(source),
            position(dest)
        ),
        Some(dest) => format!(
            "You have moved the item from position {} in list {} to list {} in position {}",
            position(source),
            source.droppable_id,
            dest.droppable_id,
            position(dest)
        ),
        None => "You are over an area that cannot be dropped on".to_owned(),
    }
}

pub(crate) fn drag_end_message(result: &DropResult) -> String {
    let source = &result.source;
    if result.reason == DropReason::Cancel {
        return format!(
            "Movement cancelled. The item has returned to its starting position of {}",
            position(source)
        );
    }
    if let Some(combine) = &result.combine {
        return format!(
            "You have dropped the item. {}",
            combine_message(result.draggable_id.as_str(), combine)
        );
    }
    match &result.destination {
        Some(dest) if dest == source => format!(
            "You have dropped the item. It has remained in its starting position of {}",
            position(source)
        ),
        Some(dest) if dest.droppable_id == source.droppable_id => format!(
            "You have dropped the item. It has moved from position {} to {}",
            position(source),
            position(dest)
        ),
        Some(dest) => format!(
            "You have dropped the item. It has moved from position {} in list {} to list {} in position {}",
            position(source),
            source.droppable_id,
            dest.droppable_id,
            position(dest)
        ),
        None => format!(
            "The item has been dropped while not over a drop area. The item has returned to its starting position of {}",
            position(source)
        ),
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

type Watched = (Option<DraggableLocation>, Option<Combine>);

/// Turns state snapshots into responder calls.
pub(crate) struct Publisher {
    announcer: Box<dyn Announcer>,
    /// Start payload of the drag whose `on_drag_start` has fired.
    started: Option<DragStart>,
    last: Option<Watched>,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("started", &self.started)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl Publisher {
    pub(crate) fn new(announcer: Box<dyn Announcer>) -> Self {
        Self {
            announcer,
            started: None,
            last: None,
        }
    }

    pub(crate) fn set_announcer(&mut self, announcer: Box<dyn Announcer>) {
        self.announcer = announcer;
    }

    pub(crate) fn before_capture(&mut self, responders: &mut Responders, payload: &BeforeCapture) {
        if let Some(f) = responders.before_capture.as_mut() {
            f(payload);
        }
    }

    pub(crate) fn before_drag_start(&mut self, responders: &mut Responders, payload: &DragStart) {
        if let Some(f) = responders.before_drag_start.as_mut() {
            f(payload);
        }
    }

    fn announce_with(&mut self, default: String, call: impl FnOnce(&Announce)) {
        let announce = Announce::new();
        call(&announce);
        let message = announce.expire().unwrap_or(default);
        self.announcer.announce(&message);
    }

    /// React to the state the store just produced.
    pub(crate) fn observe(&mut self, responders: &mut Responders, state: &DragState) {
        match state {
            DragState::Idle { completed } => {
                let Some(start) = self.started.take() else {
                    return;
                };
                self.last = None;
                let result = completed
                    .as_ref()
                    .filter(|c| c.result.draggable_id == start.draggable_id)
                    .map_or_else(|| DropResult::cancelled(&start), |c| c.result.clone());
                let default = drag_end_message(&result);
                let callback = responders.drag_end.as_mut();
                self.announce_with(default, |announce| {
                    if let Some(f) = callback {
                        f(&result, announce);
                    }
                });
            }
            DragState::Collecting(drag) | DragState::Dragging(drag) => {
                let watched = (drag.impact.destination.clone(), drag.impact.combine.clone());
                if self.started.is_none() {
                    let start = drag.drag_start();
                    let default = drag_start_message(&start);
                    let callback = responders.drag_start.as_mut();
                    self.announce_with(default, |announce| {
                        if let Some(f) = callback {
                            f(&start, announce);
                        }
                    });
                    self.started = Some(start);
                    self.last = Some(watched);
                    return;
                }
                if self.last.as_ref() == Some(&watched) {
                    return;
                }
                self.last = Some(watched);
                let update = drag.drag_update();
                let default = drag_update_message(&update);
                let callback = responders.drag_update.as_mut();
                self.announce_with(default, |announce| {
                    if let Some(f) = callback {
                        f(&update, announce);
                    }
                });
            }
            DragState::DropPending { .. } | DragState::DropAnimating { .. } => {}
        }
    }
}
