//! End-to-end drag scenarios driven through the public sensor surface.
//!
//! Each test builds a small board of lists, feeds raw input through the
//! built-in sensors and checks what the consumer observes: responder calls,
//! announcements, scroll requests and the final drop result.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use dropline_core::{
    Axis, BoxModel, DragConfig, DragUpdate, DraggableDescriptor, DraggableDimension, DraggableId,
    DraggableLocation, DropReason, DropResult, DroppableDescriptor, DroppableDimension,
    DroppableId, Point, Rect, ScrollDetails, ScrollFrame, Viewport,
};
use dropline_engine::{
    Announce, DragContext, DraggableEntry, DroppableCallbacks, DroppableEntry, EngineError,
    InputEvent, Key, KeyboardSensor, Lock, Modifiers, Phase, PointerButton, PointerSensor,
    Responders, Sensor, WindowCallbacks,
};
use pretty_assertions::assert_eq;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use web_time::Instant;

type Shared<T> = Rc<RefCell<T>>;

const ITEM: f32 = 40.0;

// ── Host doubles ────────────────────────────────────────────────────────

struct Window {
    height: f32,
    max: Point,
    scroll: Rc<Cell<Point>>,
}

impl WindowCallbacks for Window {
    fn viewport(&self) -> Viewport {
        Viewport::new(800.0, self.height, self.scroll.get(), self.max)
    }

    fn scroll_by(&mut self, change: Point) {
        let now = self.scroll.get();
        self.scroll.set(Point::new(
            (now.x + change.x).clamp(0.0, self.max.x),
            (now.y + change.y).clamp(0.0, self.max.y),
        ));
    }
}

struct List {
    id: &'static str,
    rect: Rect,
    frame: Option<ScrollFrame>,
    scrolls: Shared<Vec<(String, Point)>>,
}

impl DroppableCallbacks for List {
    fn get_dimension(&mut self, window_scroll: Point) -> DroppableDimension {
        let dimension = DroppableDimension::new(
            DroppableDescriptor::new(self.id, "DEFAULT"),
            Axis::Vertical,
            BoxModel::from_rect(self.rect),
            window_scroll,
        );
        match self.frame {
            Some(frame) => dimension.with_frame(frame),
            None => dimension,
        }
    }

    fn scroll(&mut self, change: Point) {
        self.scrolls.borrow_mut().push((self.id.to_owned(), change));
    }
}

struct ListLayout {
    id: &'static str,
    rect: Rect,
    items: &'static [&'static str],
    frame: Option<ScrollFrame>,
}

impl ListLayout {
    fn new(id: &'static str, x: f32, items: &'static [&'static str]) -> Self {
        Self {
            id,
            rect: Rect::new(x, 0.0, 100.0, 200.0),
            items,
            frame: None,
        }
    }
}

/// What the consumer saw.
#[derive(Default)]
struct Seen {
    before_capture: Cell<u32>,
    before_drag_start: Cell<u32>,
    starts: Cell<u32>,
    updates: RefCell<Vec<DragUpdate>>,
    results: RefCell<Vec<DropResult>>,
}

struct Harness {
    ctx: DragContext,
    window_scroll: Rc<Cell<Point>>,
    scrolls: Shared<Vec<(String, Point)>>,
    announcements: Shared<Vec<String>>,
    lists: Shared<BTreeMap<DroppableId, Vec<&'static str>>>,
    seen: Rc<Seen>,
}

fn harness(window_height: f32, window_max: Point, layouts: Vec<ListLayout>) -> Harness {
    let window_scroll = Rc::new(Cell::new(Point::ORIGIN));
    let announcements: Shared<Vec<String>> = Rc::default();
    let log = Rc::clone(&announcements);
    let mut ctx = DragContext::new(
        Window {
            height: window_height,
            max: window_max,
            scroll: Rc::clone(&window_scroll),
        },
        DragConfig::default(),
    )
    .with_announcer(move |message: &str| log.borrow_mut().push(message.to_owned()));

    let scrolls: Shared<Vec<(String, Point)>> = Rc::default();
    let lists: Shared<BTreeMap<DroppableId, Vec<&'static str>>> = Rc::default();
    for layout in layouts {
        lists
            .borrow_mut()
            .insert(DroppableId::new(layout.id), layout.items.to_vec());
        ctx.register_droppable(DroppableEntry::new(
            DroppableDescriptor::new(layout.id, "DEFAULT"),
            List {
                id: layout.id,
                rect: layout.rect,
                frame: layout.frame,
                scrolls: Rc::clone(&scrolls),
            },
        ));
        let (x, list) = (layout.rect.x, layout.id);
        for (index, &id) in layout.items.iter().enumerate() {
            let top = index as f32 * ITEM;
            ctx.register_draggable(DraggableEntry::new(
                DraggableDescriptor::new(id, index, list, "DEFAULT"),
                move |scroll: Point| {
                    DraggableDimension::new(
                        DraggableDescriptor::new(id, index, list, "DEFAULT"),
                        BoxModel::from_rect(Rect::new(x, top, 100.0, ITEM)),
                        scroll,
                    )
                },
            ));
        }
    }

    let seen = Rc::new(Seen::default());
    let mut harness = Harness {
        ctx,
        window_scroll,
        scrolls,
        announcements,
        lists,
        seen,
    };
    harness.track();
    harness
}

/// `todo` = [a, b, c] at x 0, `done` = [x] at x 200.
fn kanban() -> Harness {
    harness(
        600.0,
        Point::ORIGIN,
        vec![
            ListLayout::new("todo", 0.0, &["a", "b", "c"]),
            ListLayout::new("done", 200.0, &["x"]),
        ],
    )
}

impl Harness {
    fn track(&mut self) {
        let (capture, before, start, update, end) = (
            Rc::clone(&self.seen),
            Rc::clone(&self.seen),
            Rc::clone(&self.seen),
            Rc::clone(&self.seen),
            Rc::clone(&self.seen),
        );
        let lists = Rc::clone(&self.lists);
        self.ctx.set_responders(
            Responders::new()
                .on_before_capture(move |_| capture.before_capture.set(capture.before_capture.get() + 1))
                .on_before_drag_start(move |_| {
                    before.before_drag_start.set(before.before_drag_start.get() + 1);
                })
                .on_drag_start(move |_, _| start.starts.set(start.starts.get() + 1))
                .on_drag_update(move |u, _| update.updates.borrow_mut().push(u.clone()))
                .on_drag_end(move |result, _| {
                    result.apply(&mut lists.borrow_mut());
                    end.results.borrow_mut().push(result.clone());
                }),
        );
    }

    fn send(&mut self, sensor: &mut impl Sensor, event: InputEvent) -> bool {
        sensor.handle(&event, &mut self.ctx.sensor_api())
    }

    fn frame(&mut self) {
        self.ctx.frame(Instant::now());
    }

    /// Finish the drop animation if there is one.
    fn land(&mut self) {
        if self.ctx.phase() == Phase::DropAnimating {
            assert!(self.ctx.drop_animation_finished());
        }
    }

    fn list(&self, id: &str) -> Vec<&'static str> {
        self.lists.borrow()[&DroppableId::new(id)].clone()
    }

    fn results(&self) -> Vec<DropResult> {
        self.seen.results.borrow().clone()
    }

    fn destination(&self) -> Option<DraggableLocation> {
        self.ctx.state().impact().and_then(|i| i.destination.clone())
    }
}

fn down(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerDown {
        button: PointerButton::Primary,
        client: Point::new(x, y),
        modifiers: Modifiers::empty(),
        interactive: false,
    }
}

fn to(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerMove {
        client: Point::new(x, y),
    }
}

fn up(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerUp {
        client: Point::new(x, y),
    }
}

fn key(key: Key, focused: Option<&str>) -> InputEvent {
    InputEvent::KeyDown {
        key,
        focused: focused.map(DraggableId::new),
    }
}

/// Press `a` and pull it just past the sloppy-click threshold.
fn lift_a(h: &mut Harness, pointer: &mut PointerSensor) {
    h.send(pointer, down(50.0, 20.0));
    assert!(h.send(pointer, to(50.0, 26.0)));
    assert!(h.ctx.state().is_dragging());
}

// ── Tracing capture ─────────────────────────────────────────────────────

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

#[derive(Clone, Default)]
struct DevWarnings(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for DevWarnings {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() == "dropline.dev" {
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            self.0.lock().unwrap().push(visitor.0);
        }
    }
}

// ── Reordering ──────────────────────────────────────────────────────────

#[test]
fn reorder_first_item_to_end() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();
    assert_eq!(h.ctx.phase(), Phase::Dragging);

    h.send(&mut pointer, to(50.0, 110.0));
    h.frame();
    assert_eq!(h.destination(), Some(DraggableLocation::new("todo", 2)));
    assert!(h.send(&mut pointer, up(50.0, 110.0)));
    h.land();

    assert_eq!(h.list("todo"), vec!["b", "c", "a"]);
    assert_eq!(h.list("done"), vec!["x"]);
    assert_eq!(
        *h.announcements.borrow(),
        vec![
            "You have lifted an item in position 1".to_owned(),
            "You have moved the item from position 1 to position 3".to_owned(),
            "You have dropped the item. It has moved from position 1 to 3".to_owned(),
        ]
    );
}

#[test]
fn keyboard_moves_item_between_lists() {
    let mut h = kanban();
    let mut keyboard = KeyboardSensor::new();
    assert!(h.send(&mut keyboard, key(Key::Space, Some("b"))));
    h.frame();
    assert!(h.send(&mut keyboard, key(Key::ArrowRight, None)));
    let destination = h.destination().expect("over a list");
    assert_eq!(destination.droppable_id, DroppableId::new("done"));
    assert!(h.send(&mut keyboard, key(Key::Space, None)));
    h.land();

    let result = &h.results()[0];
    assert_eq!(result.reason, DropReason::Drop);
    assert_eq!(result.source, DraggableLocation::new("todo", 1));
    assert_eq!(h.list("todo"), vec!["a", "c"]);
    assert_eq!(h.list("done").len(), 2);
    assert!(h.list("done").contains(&"b"));
}

#[test]
fn keyboard_moves_first_item_to_end() {
    let mut h = kanban();
    let mut keyboard = KeyboardSensor::new();
    assert!(h.send(&mut keyboard, key(Key::Space, Some("a"))));
    h.frame();
    assert_eq!(h.ctx.phase(), Phase::Dragging);

    assert!(h.send(&mut keyboard, key(Key::ArrowDown, None)));
    assert_eq!(h.destination(), Some(DraggableLocation::new("todo", 1)));
    assert!(h.send(&mut keyboard, key(Key::ArrowDown, None)));
    assert_eq!(h.destination(), Some(DraggableLocation::new("todo", 2)));
    assert!(h.send(&mut keyboard, key(Key::Space, None)));
    h.land();

    let result = &h.results()[0];
    assert_eq!(result.source, DraggableLocation::new("todo", 0));
    assert_eq!(result.destination, Some(DraggableLocation::new("todo", 2)));
    assert_eq!(h.list("todo"), vec!["b", "c", "a"]);
    assert_eq!(h.list("done"), vec!["x"]);
}

#[test]
fn disabled_destination_drops_nowhere() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();
    h.ctx
        .set_droppable_enabled(&DroppableId::new("done"), false)
        .expect("collected droppable");

    h.send(&mut pointer, to(250.0, 60.0));
    h.frame();
    assert_eq!(h.destination(), None);
    h.send(&mut pointer, up(250.0, 60.0));
    h.land();

    let result = &h.results()[0];
    assert_eq!(result.reason, DropReason::Drop);
    assert_eq!(result.destination, None);
    assert_eq!(h.list("todo"), vec!["a", "b", "c"]);
    assert_eq!(
        h.announcements.borrow().last().map(String::as_str),
        Some(
            "The item has been dropped while not over a drop area. The item has returned to its starting position of 1"
        )
    );
}

// ── Arbitration ─────────────────────────────────────────────────────────

#[test]
fn second_sensor_cannot_claim_a_held_lock() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    let mut keyboard = KeyboardSensor::new();

    h.send(&mut pointer, down(50.0, 20.0));
    assert!(matches!(h.ctx.lock(), Lock::PreDrag { ref draggable_id, .. } if draggable_id.as_str() == "a"));
    assert!(!h.send(&mut keyboard, key(Key::Space, Some("b"))));
    assert!(!keyboard.is_active());

    // A plain click gives the lock back.
    h.send(&mut pointer, up(50.0, 20.0));
    assert_eq!(h.ctx.lock(), Lock::Unclaimed);
    assert!(h.send(&mut keyboard, key(Key::Space, Some("b"))));
    assert_eq!(h.seen.starts.get(), 1);
}

#[test]
fn abort_cancels_and_a_new_drag_can_start() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();
    h.send(&mut pointer, to(50.0, 110.0));
    h.frame();

    h.ctx.abort();
    assert_eq!(h.ctx.phase(), Phase::Idle);
    assert_eq!(h.ctx.lock(), Lock::Unclaimed);
    assert_eq!(h.results()[0].reason, DropReason::Cancel);
    assert_eq!(h.list("todo"), vec!["a", "b", "c"]);
    // The pointer sensor noticed the revoked lock.
    assert!(!h.send(&mut pointer, to(50.0, 130.0)));
    assert!(!pointer.is_active());

    let mut keyboard = KeyboardSensor::new();
    assert!(h.send(&mut keyboard, key(Key::Space, Some("b"))));
    h.frame();
    assert!(h.send(&mut keyboard, key(Key::ArrowUp, None)));
    assert!(h.send(&mut keyboard, key(Key::Space, None)));
    h.land();

    assert_eq!(h.results().len(), 2);
    assert_eq!(h.results()[1].destination, Some(DraggableLocation::new("todo", 0)));
    assert_eq!(h.list("todo"), vec!["b", "a", "c"]);
}

#[test]
fn drop_while_collecting_waits_for_the_publish() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    h.send(&mut pointer, down(50.0, 20.0));
    h.send(&mut pointer, to(50.0, 60.0));
    assert_eq!(h.ctx.phase(), Phase::Collecting);

    h.send(&mut pointer, up(50.0, 60.0));
    assert_eq!(h.ctx.phase(), Phase::DropPending);
    assert!(h.results().is_empty());
    assert!(!h.ctx.sensor_api().can_get_lock(&DraggableId::new("b")));

    h.frame();
    h.land();
    assert_eq!(h.ctx.phase(), Phase::Idle);
    let result = &h.results()[0];
    assert_eq!(result.reason, DropReason::Drop);
    // The queued move was discarded by the drop.
    assert_eq!(result.destination, Some(DraggableLocation::new("todo", 0)));
}

#[test]
fn unmounting_the_dragged_item_cancels() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();

    let warnings = DevWarnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    tracing::subscriber::with_default(subscriber, || {
        h.ctx.unregister_draggable(&DraggableId::new("a"));
    });

    assert_eq!(h.ctx.phase(), Phase::Idle);
    assert_eq!(h.results()[0].reason, DropReason::Cancel);
    assert_eq!(
        h.ctx.take_error(),
        Some(EngineError::CriticalUnmounted(DraggableId::new("a")))
    );
    assert_eq!(
        *warnings.0.lock().unwrap(),
        vec!["the dragged item was unmounted during a drag".to_owned()]
    );
}

#[test]
fn error_boundary_aborts_the_drag() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();

    let outcome = h
        .ctx
        .with_error_boundary(|_| Err::<(), _>(io::Error::other("layout failed")));
    assert!(outcome.is_err());
    assert_eq!(h.ctx.phase(), Phase::Idle);
    assert!(matches!(h.ctx.take_error(), Some(EngineError::External(msg)) if msg == "layout failed"));
    assert_eq!(h.results()[0].reason, DropReason::Cancel);

    // Nothing to abort any more.
    assert!(!h.ctx.report_error(&io::Error::other("late")));
}

// ── Responders ──────────────────────────────────────────────────────────

#[test]
fn responders_fire_once_per_transition() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();
    for y in [30.0, 35.0, 70.0, 75.0, 110.0, 112.0] {
        h.send(&mut pointer, to(50.0, y));
        h.frame();
    }
    h.send(&mut pointer, up(50.0, 112.0));
    h.land();
    // Landing again is a no-op.
    h.frame();

    assert_eq!(h.seen.before_capture.get(), 1);
    assert_eq!(h.seen.before_drag_start.get(), 1);
    assert_eq!(h.seen.starts.get(), 1);
    let indices: Vec<_> = h
        .seen
        .updates
        .borrow()
        .iter()
        .map(|u| u.destination.as_ref().map(|d| d.index))
        .collect();
    assert_eq!(indices, vec![Some(1), Some(2)]);
    assert_eq!(h.results().len(), 1);
}

#[test]
fn moves_between_frames_are_coalesced() {
    let mut h = kanban();
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    h.frame();

    for y in [60.0, 70.0, 90.0, 110.0] {
        assert!(h.send(&mut pointer, to(50.0, y)));
    }
    // Nothing is applied until the frame runs.
    assert_eq!(h.destination(), Some(DraggableLocation::new("todo", 0)));
    h.frame();
    assert_eq!(h.destination(), Some(DraggableLocation::new("todo", 2)));
    assert_eq!(h.seen.updates.borrow().len(), 1);
}

#[test]
fn custom_announcement_replaces_default_and_misuse_warns() {
    let mut h = kanban();
    let late: Shared<Option<Announce>> = Rc::default();
    let keep = Rc::clone(&late);
    h.ctx.set_responders(Responders::new().on_drag_start(move |_, announce| {
        announce.call("Picked up");
        announce.call("Picked up twice");
        *keep.borrow_mut() = Some(announce.clone());
    }));

    let warnings = DevWarnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    tracing::subscriber::with_default(subscriber, || {
        let mut keyboard = KeyboardSensor::new();
        h.send(&mut keyboard, key(Key::Space, Some("a")));
        if let Some(announce) = late.borrow().as_ref() {
            announce.call("Too late");
        }
    });

    assert_eq!(*h.announcements.borrow(), vec!["Picked up".to_owned()]);
    assert_eq!(
        *warnings.0.lock().unwrap(),
        vec![
            "announce was called more than once; only the first message is used".to_owned(),
            "announce was called after the responder returned; announcements must be synchronous"
                .to_owned(),
        ]
    );
}

// ── Auto-scroll ─────────────────────────────────────────────────────────

#[test]
fn scrollable_droppable_wins_over_window() {
    let mut list = ListLayout::new("list", 0.0, &["a", "b"]);
    list.rect = Rect::new(0.0, 0.0, 100.0, 1000.0);
    list.frame = Some(ScrollFrame {
        page: Rect::new(0.0, 0.0, 100.0, 300.0),
        scroll: ScrollDetails::new(Point::ORIGIN, Point::new(0.0, 700.0)),
        should_clip: true,
    });
    let mut h = harness(320.0, Point::new(0.0, 1000.0), vec![list]);
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);
    // The only list is the home list, so collection is already complete.
    assert_eq!(h.ctx.phase(), Phase::Dragging);

    h.send(&mut pointer, to(50.0, 280.0));
    h.frame();

    let scrolls = h.scrolls.borrow().clone();
    assert_eq!(scrolls.len(), 1);
    let (id, change) = &scrolls[0];
    assert_eq!(id, "list");
    assert!(change.y > 0.0 && change.x == 0.0, "change = {change:?}");
    assert_eq!(h.window_scroll.get(), Point::ORIGIN);

    let frame = h.ctx.state().drag().unwrap().dimensions.droppables[&DroppableId::new("list")]
        .frame
        .unwrap();
    assert_eq!(frame.scroll.current, *change);
}

#[test]
fn window_scrolls_when_no_droppable_can() {
    let mut list = ListLayout::new("list", 0.0, &["a", "b"]);
    list.rect = Rect::new(0.0, 0.0, 100.0, 1000.0);
    let mut h = harness(320.0, Point::new(0.0, 1000.0), vec![list]);
    let mut pointer = PointerSensor::new();
    lift_a(&mut h, &mut pointer);

    h.send(&mut pointer, to(50.0, 300.0));
    h.frame();

    assert!(h.scrolls.borrow().is_empty());
    let scrolled = h.window_scroll.get();
    assert!(scrolled.y > 0.0, "window did not scroll");
    let viewport = h.ctx.state().drag().unwrap().viewport;
    assert_eq!(viewport.scroll.current, scrolled);
}
