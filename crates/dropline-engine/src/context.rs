#![forbid(unsafe_code)]

//! The drag context: one engine instance per drag-and-drop area.
//!
//! [`DragContext`] owns the store, the registry, the marshals, the frame
//! scheduler, the auto-scroller and the responder slot. Hosts mount and
//! unmount elements through it and call [`DragContext::frame`] once per
//! animation frame. Sensors reach it only through [`SensorApi`].
//!
//! # Errors
//!
//! Contract violations (a second lift, an impossible transition) and
//! unmounting the dragged item abort the active drag and are kept for
//! [`DragContext::take_error`]. Host failures
//! while a drag is live go through [`DragContext::report_error`] or
//! [`DragContext::with_error_boundary`]: the drag is flushed, the lock is
//! revoked and one `error` event is emitted. Nothing is retried.

use std::error::Error;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use dropline_core::{
    BeforeCapture, DragConfig, DragStart, DraggableId, DroppableId, DropReason, MovementMode,
    Point, SensorConfig,
};
use tracing::{debug, error, warn};
use web_time::Instant;

use crate::auto_scroll::{AutoScroller, ScrollRequest};
use crate::error::{EngineError, StateError};
use crate::lock::{Lock, LockCapabilities, LockId, LockMarshal, PreDragActions};
use crate::marshal::{DimensionMarshal, RegistryChange};
use crate::registry::{DraggableEntry, DraggableOptions, DroppableEntry, Registry, WindowCallbacks};
use crate::responders::{Announcer, Publisher, Responders, TracingAnnouncer};
use crate::scheduler::FrameScheduler;
use crate::state::{Action, DragState, DragStore, DragTransition, Phase};

/// One engine instance.
pub struct DragContext {
    config: DragConfig,
    store: DragStore,
    registry: Registry,
    window: Box<dyn WindowCallbacks>,
    marshal: DimensionMarshal,
    locks: LockMarshal,
    scheduler: FrameScheduler,
    auto_scroller: AutoScroller,
    responders: Responders,
    publisher: Publisher,
    last_error: Option<EngineError>,
}

impl fmt::Debug for DragContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragContext")
            .field("phase", &self.store.phase())
            .field("lock", &self.locks.snapshot())
            .field("marshal", &self.marshal)
            .field("scheduler", &self.scheduler)
            .field("responders", &self.responders)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl DragContext {
    /// Create an idle context driving `window`.
    pub fn new(window: impl WindowCallbacks + 'static, config: DragConfig) -> Self {
        Self {
            store: DragStore::new(config.clone()),
            auto_scroller: AutoScroller::new(config.auto_scroll.clone()),
            config,
            registry: Registry::new(),
            window: Box::new(window),
            marshal: DimensionMarshal::new(),
            locks: LockMarshal::default(),
            scheduler: FrameScheduler::new(),
            responders: Responders::new(),
            publisher: Publisher::new(Box::new(TracingAnnouncer)),
            last_error: None,
        }
    }

    /// Route announcements to `announcer` instead of the tracing sink.
    #[must_use]
    pub fn with_announcer(mut self, announcer: impl Announcer + 'static) -> Self {
        self.publisher.set_announcer(Box::new(announcer));
        self
    }

    /// Replace the consumer callbacks. Takes effect for the next event.
    pub fn set_responders(&mut self, responders: Responders) {
        self.responders = responders;
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        self.store.state()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.store.phase()
    }

    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Snapshot of the input lock.
    #[must_use]
    pub fn lock(&self) -> Lock {
        self.locks.snapshot()
    }

    /// Borrow the context as sensors see it.
    pub fn sensor_api(&mut self) -> SensorApi<'_> {
        SensorApi { ctx: self }
    }

    // -----------------------------------------------------------------------
    // Mount lifecycle
    // -----------------------------------------------------------------------

    /// Mount a draggable, or replace the entry registered under its id.
    pub fn register_draggable(&mut self, entry: DraggableEntry) {
        let descriptor = entry.descriptor.clone();
        self.registry.insert_draggable(entry);
        self.marshal.draggable_changed(&descriptor);
    }

    /// Unmount a draggable. Unmounting the dragged item ends the drag.
    pub fn unregister_draggable(&mut self, id: &DraggableId) {
        let Some(entry) = self.registry.remove_draggable(id) else {
            return;
        };
        if self.marshal.draggable_removed(&entry.descriptor) == RegistryChange::CriticalRemoved {
            warn!(target: "dropline.dev", draggable = %id, "the dragged item was unmounted during a drag");
            self.critical_unmounted();
        }
    }

    /// Mount a droppable, or replace the entry registered under its id.
    pub fn register_droppable(&mut self, entry: DroppableEntry) {
        let descriptor = entry.descriptor.clone();
        self.registry.insert_droppable(entry);
        self.marshal.droppable_changed(&descriptor);
    }

    /// Unmount a droppable. Unmounting the home of the dragged item ends the
    /// drag.
    pub fn unregister_droppable(&mut self, id: &DroppableId) {
        let Some(entry) = self.registry.remove_droppable(id) else {
            return;
        };
        if self.marshal.droppable_removed(&entry.descriptor) == RegistryChange::CriticalRemoved {
            warn!(target: "dropline.dev", droppable = %id, "the home droppable was unmounted during a drag");
            self.critical_unmounted();
        }
    }

    fn critical_unmounted(&mut self) {
        let dragged = self.store.state().drag().map(|drag| drag.draggable_id().clone());
        // A finished drop only has to land; anything earlier is abandoned.
        if let DragState::DropAnimating { completed, .. } = self.store.state() {
            let completed = completed.clone();
            if self.dispatch(Action::CompleteDrop { completed }).is_ok() {
                return;
            }
        }
        self.abort();
        if let Some(id) = dragged {
            self.last_error = Some(EngineError::CriticalUnmounted(id));
        }
    }

    /// Enable or disable a droppable mid-drag.
    pub fn set_droppable_enabled(&mut self, id: &DroppableId, is_enabled: bool) -> Result<(), EngineError> {
        self.update_droppable(
            id,
            Action::UpdateDroppableIsEnabled {
                id: id.clone(),
                is_enabled,
            },
        )
    }

    /// Enable or disable combining for a droppable mid-drag.
    pub fn set_droppable_combine_enabled(
        &mut self,
        id: &DroppableId,
        is_combine_enabled: bool,
    ) -> Result<(), EngineError> {
        self.update_droppable(
            id,
            Action::UpdateDroppableIsCombineEnabled {
                id: id.clone(),
                is_combine_enabled,
            },
        )
    }

    /// The host scrolled a droppable to `offset` by itself.
    pub fn droppable_scrolled(&mut self, id: &DroppableId, offset: Point) -> Result<(), EngineError> {
        self.update_droppable(
            id,
            Action::UpdateDroppableScroll {
                id: id.clone(),
                offset,
            },
        )
    }

    /// Droppables that are not part of the live drag pick up their flags on
    /// the next measurement, so only collected ones are forwarded.
    fn update_droppable(&mut self, id: &DroppableId, action: Action) -> Result<(), EngineError> {
        let collected = self
            .store
            .state()
            .drag()
            .is_some_and(|drag| drag.dimensions.droppables.contains_key(id));
        if !collected || !self.store.state().is_dragging() {
            return Ok(());
        }
        self.dispatch_or_fail(action).map(|_| ())
    }

    /// The window scrolled to `offset`. Applied on the next frame.
    pub fn window_scrolled(&mut self, offset: Point) {
        if self.store.state().is_dragging() {
            self.scheduler.schedule_window_scroll(offset);
        }
    }

    /// Scroll a collected droppable by up to `change`. Returns the new
    /// offset when anything moved.
    pub fn scroll_droppable(&mut self, id: &DroppableId, change: Point) -> Option<Point> {
        if !self.store.state().is_dragging() {
            return None;
        }
        let scroll = self.store.state().drag()?.dimensions.droppables.get(id)?.frame?.scroll;
        let offset = self
            .marshal
            .scroll_droppable(&mut self.registry, id, &scroll, change)?;
        self.dispatch_or_fail(Action::UpdateDroppableScroll {
            id: id.clone(),
            offset,
        })
        .ok()?;
        Some(offset)
    }

    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    /// Run one animation frame.
    ///
    /// In order: the latest window scroll, the latest pointer position,
    /// deferred collection, batched registry changes, then auto-scroll.
    pub fn frame(&mut self, now: Instant) {
        let work = self.scheduler.drain();
        if self.store.state().is_dragging() {
            if let Some(scroll) = work.pending_window_scroll
                && self.dispatch_or_fail(Action::MoveByWindowScroll { scroll }).is_err()
            {
                return;
            }
            if let Some(client) = work.pending_move
                && self.dispatch_or_fail(Action::Move { client }).is_err()
            {
                return;
            }
        }

        if matches!(self.phase(), Phase::Collecting | Phase::DropPending) {
            let published = if self.marshal.is_collecting() {
                self.marshal
                    .collect_remaining(&mut self.registry, &*self.window)
            } else {
                None
            };
            let published = published.unwrap_or_default();
            if self
                .dispatch_or_fail(Action::PublishWhileDragging(published))
                .is_err()
            {
                return;
            }
        }

        if self.phase() == Phase::Dragging
            && let Some(published) = self
                .marshal
                .publish_pending(&mut self.registry, &*self.window)
            && self
                .dispatch_or_fail(Action::PublishWhileDragging(published))
                .is_err()
        {
            return;
        }

        if let Some(request) = self.auto_scroller.tick(self.store.state(), now) {
            self.execute_scroll(request);
        }
    }

    fn execute_scroll(&mut self, request: ScrollRequest) {
        match request {
            ScrollRequest::Droppable { id, change } => {
                self.scroll_droppable(&id, change);
            }
            ScrollRequest::Window { change } => {
                self.window.scroll_by(change);
                let scroll = self.window.viewport().scroll.current;
                if let Err(err) = self.dispatch_or_fail(Action::MoveByWindowScroll { scroll }) {
                    debug!(target: "dropline.auto_scroll", error = %err, "window auto-scroll rejected");
                }
            }
        }
    }

    /// The host finished animating the dropped item into place.
    pub fn drop_animation_finished(&mut self) -> bool {
        if self.phase() != Phase::DropAnimating {
            warn!(target: "dropline.dev", phase = %self.phase(), "drop_animation_finished called without a drop animation");
            return false;
        }
        self.dispatch_or_fail(Action::DropAnimationFinished).is_ok()
    }

    // -----------------------------------------------------------------------
    // Aborts and errors
    // -----------------------------------------------------------------------

    /// Revoke the lock and flush any drag. Safe to call at any time.
    pub fn abort(&mut self) {
        let revoked = self.locks.abort();
        let phase = self.phase();
        if phase != Phase::Idle {
            // Flush is accepted from every phase.
            let _ = self.dispatch(Action::Flush);
        }
        self.scheduler.clear();
        if revoked.is_some() || phase != Phase::Idle {
            debug!(target: "dropline.lock", lock = ?revoked.map(LockId::get), from = %phase, "drag aborted");
        }
    }

    /// A host failure happened. Aborts the active drag, if any.
    ///
    /// Returns `true` when a drag or lock was abandoned because of it.
    pub fn report_error(&mut self, err: &dyn Error) -> bool {
        if !self.locks.is_claimed() && self.phase() == Phase::Idle {
            return false;
        }
        error!(target: "dropline.lock", error = %err, phase = %self.phase(), "aborting drag after an error");
        self.abort();
        self.last_error = Some(EngineError::External(err.to_string()));
        true
    }

    /// Run `f`, aborting the drag when it fails or panics.
    ///
    /// The error is returned unchanged and a panic keeps unwinding after the
    /// drag has been cleaned up.
    pub fn with_error_boundary<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: Error,
    {
        match catch_unwind(AssertUnwindSafe(|| f(&mut *self))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                self.report_error(&err);
                Err(err)
            }
            Err(payload) => {
                error!(target: "dropline.lock", phase = %self.phase(), "aborting drag after a panic");
                self.abort();
                self.last_error = Some(EngineError::External("panic while a drag was active".to_owned()));
                resume_unwind(payload)
            }
        }
    }

    /// The last error that aborted a drag.
    pub fn take_error(&mut self) -> Option<EngineError> {
        self.last_error.take()
    }

    fn fail(&mut self, err: EngineError) {
        error!(target: "dropline.lock", error = %err, phase = %self.phase(), "contract violation; aborting drag");
        self.abort();
        self.last_error = Some(err);
    }

    fn dispatch(&mut self, action: Action) -> Result<DragTransition, StateError> {
        let transition = self.store.dispatch(action)?;
        self.publisher
            .observe(&mut self.responders, self.store.state());
        if transition.to == Phase::Idle {
            self.marshal.stop(&mut self.registry);
            self.auto_scroller.stop();
            self.scheduler.clear();
        }
        Ok(transition)
    }

    fn dispatch_or_fail(&mut self, action: Action) -> Result<DragTransition, EngineError> {
        self.dispatch(action).map_err(|err| {
            let err = EngineError::from(err);
            self.fail(err.clone());
            err
        })
    }

    // -----------------------------------------------------------------------
    // Lock plumbing
    // -----------------------------------------------------------------------

    fn can_get_lock(&self, id: &DraggableId) -> bool {
        if self.locks.is_claimed() {
            return false;
        }
        let Some(entry) = self.registry.draggable(id) else {
            return false;
        };
        if !entry.options.is_enabled {
            return false;
        }
        match self.store.state() {
            DragState::Idle { .. } => true,
            DragState::DropAnimating { completed, .. } => {
                completed.result.reason == DropReason::Drop && &completed.critical.draggable.id != id
            }
            _ => false,
        }
    }

    fn stale(&self, lock: LockId, operation: &'static str) -> bool {
        warn!(target: "dropline.dev", lock = %lock, operation, "ignored call on an inactive lock");
        false
    }

    pub(crate) fn lock_capabilities(&self, lock: LockId) -> LockCapabilities {
        self.locks.capabilities_of(lock)
    }

    pub(crate) fn lock_respects_force_press(&self, lock: LockId) -> bool {
        if self.locks.capabilities_of(lock).is_empty() {
            return false;
        }
        self.locks
            .draggable_id()
            .and_then(|id| self.registry.draggable(id))
            .is_none_or(|entry| entry.options.should_respect_force_press)
    }

    pub(crate) fn lift(&mut self, lock: LockId, mode: MovementMode, client: Option<Point>) -> bool {
        if self.locks.capabilities_of(lock).is_empty() {
            return self.stale(lock, "lift");
        }
        if let Err(err) = self.locks.promote(lock, mode) {
            self.fail(err.into());
            return false;
        }
        let Some(draggable_id) = self.locks.draggable_id().cloned() else {
            return false;
        };

        // A new lift lands the previous item right away.
        if let DragState::DropAnimating { completed, .. } = self.store.state() {
            let completed = completed.clone();
            if self.dispatch_or_fail(Action::CompleteDrop { completed }).is_err() {
                return false;
            }
        }

        self.publisher.before_capture(
            &mut self.responders,
            &BeforeCapture {
                draggable_id: draggable_id.clone(),
                mode,
            },
        );
        let initial = match self
            .marshal
            .start(&mut self.registry, &*self.window, &draggable_id)
        {
            Ok(initial) => initial,
            Err(err) => {
                self.fail(err);
                return false;
            }
        };
        let start = DragStart::from_critical(&initial.critical, mode);
        self.publisher.before_drag_start(&mut self.responders, &start);

        let client_selection = client.unwrap_or_else(|| {
            initial
                .dimensions
                .draggables
                .get(&draggable_id)
                .map_or(Point::ORIGIN, |d| d.client.border_box.center())
        });
        let lifted = self.dispatch_or_fail(Action::InitialPublish {
            critical: initial.critical,
            dimensions: initial.dimensions,
            viewport: initial.viewport,
            client_selection,
            mode,
            is_complete: initial.is_complete,
        });
        if lifted.is_ok() {
            self.auto_scroller.start(Instant::now());
            debug!(target: "dropline.lock", lock = %lock, draggable = %draggable_id, mode = ?mode, "lifted");
        }
        lifted.is_ok()
    }

    pub(crate) fn abort_pre_drag(&mut self, lock: LockId) {
        if !self
            .locks
            .capabilities_of(lock)
            .contains(LockCapabilities::ABORT)
        {
            self.stale(lock, "abort");
            return;
        }
        self.locks.release();
        debug!(target: "dropline.lock", lock = %lock, "pre-drag released");
    }

    pub(crate) fn lock_move(&mut self, lock: LockId, client: Point) -> bool {
        if !self
            .locks
            .capabilities_of(lock)
            .contains(LockCapabilities::MOVE)
        {
            return self.stale(lock, "move");
        }
        if !self.store.state().is_dragging() {
            return false;
        }
        self.scheduler.schedule_move(client);
        true
    }

    pub(crate) fn lock_drop(&mut self, lock: LockId, reason: DropReason) -> bool {
        if !self
            .locks
            .capabilities_of(lock)
            .contains(LockCapabilities::ending(reason))
        {
            let operation = match reason {
                DropReason::Drop => "drop",
                DropReason::Cancel => "cancel",
            };
            return self.stale(lock, operation);
        }
        self.scheduler.cancel_move();
        if self.dispatch_or_fail(Action::Drop { reason }).is_err() {
            return false;
        }
        self.locks.release();
        debug!(target: "dropline.lock", lock = %lock, reason = ?reason, phase = %self.phase(), "released after drop");
        true
    }

    pub(crate) fn lock_snap(&mut self, lock: LockId, capability: LockCapabilities, action: Action) -> bool {
        if !self.locks.capabilities_of(lock).contains(capability) {
            return self.stale(lock, "snap move");
        }
        if self.phase() != Phase::Dragging {
            return false;
        }
        self.dispatch_or_fail(action).is_ok()
    }
}

/// What a sensor may do with the context.
pub struct SensorApi<'a> {
    ctx: &'a mut DragContext,
}

impl fmt::Debug for SensorApi<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorApi")
            .field("lock", &self.ctx.locks.snapshot())
            .finish()
    }
}

impl SensorApi<'_> {
    /// Claim the lock for `draggable_id`.
    ///
    /// `on_abort` runs if the lock is later revoked from outside the sensor.
    /// Returns `None` whenever the lock cannot be taken right now.
    pub fn try_get_lock(
        &mut self,
        draggable_id: &DraggableId,
        on_abort: impl FnOnce() + 'static,
    ) -> Option<PreDragActions> {
        if !self.ctx.can_get_lock(draggable_id) {
            debug!(target: "dropline.lock", draggable = %draggable_id, "lock unavailable");
            return None;
        }
        let lock = self.ctx.locks.claim(draggable_id.clone(), Box::new(on_abort));
        debug!(target: "dropline.lock", lock = %lock, draggable = %draggable_id, "claimed");
        Some(PreDragActions::new(lock))
    }

    #[must_use]
    pub fn can_get_lock(&self, draggable_id: &DraggableId) -> bool {
        self.ctx.can_get_lock(draggable_id)
    }

    #[must_use]
    pub fn is_lock_claimed(&self) -> bool {
        self.ctx.locks.is_claimed()
    }

    /// Give up whatever lock is held, cancelling a live drag first.
    pub fn try_release_lock(&mut self) {
        let Some(lock) = self.ctx.locks.snapshot().id() else {
            return;
        };
        if self.ctx.store.state().is_dragging() {
            self.ctx.lock_drop(lock, DropReason::Cancel);
        }
        self.ctx.locks.release();
    }

    /// Topmost enabled draggable under `client`.
    pub fn find_closest_draggable_id(&self, client: Point) -> Option<DraggableId> {
        let window_scroll = self.ctx.window.viewport().scroll.current;
        self.ctx.registry.hit_test(client, window_scroll)
    }

    pub fn find_options_for_draggable(&self, draggable_id: &DraggableId) -> Option<DraggableOptions> {
        self.ctx
            .registry
            .draggable(draggable_id)
            .map(|entry| entry.options)
    }

    #[must_use]
    pub fn config(&self) -> &SensorConfig {
        &self.ctx.config.sensors
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.ctx.phase()
    }

    pub(crate) fn context(&self) -> &DragContext {
        self.ctx
    }

    pub(crate) fn context_mut(&mut self) -> &mut DragContext {
        self.ctx
    }
}
