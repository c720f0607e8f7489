#![forbid(unsafe_code)]

//! Drag lifecycle state machine.
//!
//! [`DragStore`] owns the only [`DragState`]. Every change goes through
//! [`DragStore::dispatch`], which either returns a [`DragTransition`] record
//! or rejects the action and leaves the state untouched.
//!
//! ```text
//!            InitialPublish(complete)
//!   Idle ──────────────────────────────► Dragging ◄─┐ Move / scroll / publish
//!    │  InitialPublish(partial)             │  └────┘
//!    └──────────► Collecting ───publish────►│
//!                     │ Drop                │ Drop
//!                     ▼                     ▼
//!                DropPending ──publish──► DropAnimating ──finished──► Idle
//!                                           (or straight to Idle when
//!                                            nothing has to travel)
//! ```
//!
//! `Flush` returns to `Idle` from anywhere.

use std::fmt;
use std::time::Duration;

use dropline_core::{
    Critical, DimensionMap, DragConfig, DragStart, DragUpdate, DraggableDimension, DraggableId,
    DraggableLocation, DropReason, DropResult, DroppableDimension, DroppableId, Impact,
    MovementMode, Point, Viewport,
};
use tracing::{debug, debug_span};

use crate::error::StateError;
use crate::movement::keyboard::{self, Step};
use crate::movement::placement::{drop_duration, new_home_page_offset};
use crate::movement::{self, MovementContext};

// ---------------------------------------------------------------------------
// Phases and positions
// ---------------------------------------------------------------------------

/// Coarse lifecycle phase, used in transition records and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Collecting,
    Dragging,
    DropPending,
    DropAnimating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where the dragged item is, in the three coordinate spaces the engine
/// cares about.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragPositions {
    /// Pointer (or synthetic selection point) in client space.
    pub client_selection: Point,
    /// How far the item has been moved from its original client position.
    pub client_offset: Point,
    /// Border-box centre in page space.
    pub page_center: Point,
}

/// Everything a live drag carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DraggingState {
    pub critical: Critical,
    pub mode: MovementMode,
    pub dimensions: DimensionMap,
    pub viewport: Viewport,
    pub initial: DragPositions,
    pub current: DragPositions,
    pub impact: Impact,
}

impl DraggingState {
    fn new(
        critical: Critical,
        mut dimensions: DimensionMap,
        viewport: Viewport,
        client_selection: Point,
        mode: MovementMode,
    ) -> Result<Self, StateError> {
        let home = dimensions
            .droppables
            .get(&critical.droppable.id)
            .ok_or_else(|| StateError::MissingDroppable(critical.droppable.id.clone()))?;
        let home_axis = home.axis;
        let dragged = dimensions
            .draggables
            .get(&critical.draggable.id)
            .ok_or_else(|| StateError::MissingDraggable(critical.draggable.id.clone()))?;
        if dragged.descriptor.type_id != home.descriptor.type_id {
            return Err(StateError::TypeMismatch {
                expected: dragged.descriptor.type_id.clone(),
                found: home.descriptor.type_id.clone(),
            });
        }
        let page_center = dragged.page.border_box.center();
        let displaced_by = home_axis.point(dragged.displace_along(home_axis), 0.0);

        dimensions.normalize_indices();
        let mut critical = critical;
        if let Some(dragged) = dimensions.draggables.get(&critical.draggable.id) {
            critical.draggable.index = dragged.descriptor.index;
        }

        let initial = DragPositions {
            client_selection,
            client_offset: Point::ORIGIN,
            page_center,
        };
        Ok(Self {
            impact: Impact::at_location(critical.source(), displaced_by),
            critical,
            mode,
            dimensions,
            viewport,
            initial,
            current: initial,
        })
    }

    /// Payload for `on_drag_start`.
    pub fn drag_start(&self) -> DragStart {
        DragStart::from_critical(&self.critical, self.mode)
    }

    /// Payload for `on_drag_update`.
    pub fn drag_update(&self) -> DragUpdate {
        DragUpdate {
            start: self.drag_start(),
            destination: self.impact.destination.clone(),
            combine: self.impact.combine.clone(),
        }
    }

    /// Id of the dragged item.
    pub fn draggable_id(&self) -> &DraggableId {
        &self.critical.draggable.id
    }

    fn movement_context<'a>(
        &'a self,
        config: &'a dropline_core::MovementConfig,
        home_only: bool,
        animate_new: bool,
    ) -> MovementContext<'a> {
        MovementContext {
            critical: &self.critical,
            dimensions: &self.dimensions,
            previous: &self.impact,
            config,
            home_only,
            animate_new,
        }
    }

    /// Re-derive the page centre from the client offset and window scroll.
    fn sync_page_center(&mut self) {
        self.current.page_center =
            self.initial.page_center + self.current.client_offset + self.viewport.scroll.diff();
    }

    /// Place a snap-moving item exactly in the slot its impact describes.
    fn snap_to_impact(&mut self) {
        let page_offset = new_home_page_offset(&self.critical, &self.dimensions, &self.impact);
        self.current.client_offset = page_offset - self.viewport.scroll.diff();
        self.current.client_selection = self.initial.client_selection + self.current.client_offset;
        self.current.page_center = self.initial.page_center + page_offset;
    }

    /// Recompute the impact after geometry changed under a still item.
    fn refresh(&mut self, config: &DragConfig, home_only: bool, animate_new: bool) {
        match self.mode {
            MovementMode::Fluid => {
                self.sync_page_center();
                let impact = movement::fluid_impact(
                    &self.movement_context(&config.movement, home_only, animate_new),
                    self.current.page_center,
                );
                self.impact = impact;
            }
            MovementMode::Snap => {
                let impact = movement::recompute(
                    &self.movement_context(&config.movement, home_only, animate_new),
                    self.current.page_center,
                    true,
                );
                self.impact = impact;
                self.snap_to_impact();
            }
        }
    }

    fn apply_published(&mut self, published: Published) -> Result<(), StateError> {
        if published.removals.contains(&self.critical.draggable.id) {
            return Err(StateError::MissingDraggable(self.critical.draggable.id.clone()));
        }
        if published
            .droppable_removals
            .contains(&self.critical.droppable.id)
        {
            return Err(StateError::MissingDroppable(self.critical.droppable.id.clone()));
        }

        for id in &published.removals {
            self.dimensions.draggables.remove(id);
        }
        for id in &published.droppable_removals {
            self.dimensions.droppables.remove(id);
            self.dimensions
                .draggables
                .retain(|_, d| &d.descriptor.droppable_id != id);
        }
        for droppable in published.droppables {
            self.dimensions.insert_droppable(droppable);
        }
        for draggable in published.additions {
            if draggable.id() != &self.critical.draggable.id {
                self.dimensions.insert_draggable(draggable);
            }
        }
        self.dimensions.normalize_indices();
        if let Some(dragged) = self.dimensions.draggables.get(&self.critical.draggable.id) {
            self.critical.draggable.index = dragged.descriptor.index;
        }
        Ok(())
    }
}

/// A finished drag, kept around until the next drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDrag {
    pub critical: Critical,
    pub result: DropResult,
    pub impact: Impact,
}

/// The one authoritative drag state.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle {
        completed: Option<CompletedDrag>,
    },
    /// Lifted; only the home droppable has been measured so far.
    Collecting(Box<DraggingState>),
    Dragging(Box<DraggingState>),
    /// Dropped while collecting: waits for the outstanding publish.
    DropPending {
        drag: Box<DraggingState>,
        reason: DropReason,
    },
    /// The result is final; the item is travelling to its new home.
    DropAnimating {
        drag: Box<DraggingState>,
        completed: CompletedDrag,
        new_home_client_offset: Point,
        duration: Duration,
    },
}

impl Default for DragState {
    fn default() -> Self {
        Self::Idle { completed: None }
    }
}

impl DragState {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle { .. } => Phase::Idle,
            Self::Collecting(_) => Phase::Collecting,
            Self::Dragging(_) => Phase::Dragging,
            Self::DropPending { .. } => Phase::DropPending,
            Self::DropAnimating { .. } => Phase::DropAnimating,
        }
    }

    /// The live drag, in any non-idle phase.
    pub fn drag(&self) -> Option<&DraggingState> {
        match self {
            Self::Idle { .. } => None,
            Self::Collecting(drag) | Self::Dragging(drag) => Some(drag),
            Self::DropPending { drag, .. } | Self::DropAnimating { drag, .. } => Some(drag),
        }
    }

    /// The completed drag while animating or after landing.
    pub fn completed(&self) -> Option<&CompletedDrag> {
        match self {
            Self::Idle { completed } => completed.as_ref(),
            Self::DropAnimating { completed, .. } => Some(completed),
            _ => None,
        }
    }

    /// The current impact, if a drag is live.
    pub fn impact(&self) -> Option<&Impact> {
        self.drag().map(|drag| &drag.impact)
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Collecting(_) | Self::Dragging(_))
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Dimension delta published mid-drag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Published {
    /// New or re-measured draggables.
    pub additions: Vec<DraggableDimension>,
    pub removals: Vec<DraggableId>,
    /// New or re-measured droppables.
    pub droppables: Vec<DroppableDimension>,
    pub droppable_removals: Vec<DroppableId>,
}

impl Published {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
            && self.removals.is_empty()
            && self.droppables.is_empty()
            && self.droppable_removals.is_empty()
    }
}

/// Everything the reducer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    InitialPublish {
        critical: Critical,
        dimensions: DimensionMap,
        viewport: Viewport,
        client_selection: Point,
        mode: MovementMode,
        is_complete: bool,
    },
    PublishWhileDragging(Published),
    Move {
        client: Point,
    },
    MoveByWindowScroll {
        scroll: Point,
    },
    UpdateDroppableScroll {
        id: DroppableId,
        offset: Point,
    },
    UpdateDroppableIsEnabled {
        id: DroppableId,
        is_enabled: bool,
    },
    UpdateDroppableIsCombineEnabled {
        id: DroppableId,
        is_combine_enabled: bool,
    },
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveTo {
        location: DraggableLocation,
    },
    Drop {
        reason: DropReason,
    },
    DropAnimate {
        completed: CompletedDrag,
        new_home_client_offset: Point,
        duration: Duration,
    },
    CompleteDrop {
        completed: CompletedDrag,
    },
    DropAnimationFinished,
    Flush,
}

/// Fieldless mirror of [`Action`] for logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    InitialPublish,
    PublishWhileDragging,
    Move,
    MoveByWindowScroll,
    UpdateDroppableScroll,
    UpdateDroppableIsEnabled,
    UpdateDroppableIsCombineEnabled,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveTo,
    Drop,
    DropAnimate,
    CompleteDrop,
    DropAnimationFinished,
    Flush,
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::InitialPublish { .. } => ActionKind::InitialPublish,
            Self::PublishWhileDragging(_) => ActionKind::PublishWhileDragging,
            Self::Move { .. } => ActionKind::Move,
            Self::MoveByWindowScroll { .. } => ActionKind::MoveByWindowScroll,
            Self::UpdateDroppableScroll { .. } => ActionKind::UpdateDroppableScroll,
            Self::UpdateDroppableIsEnabled { .. } => ActionKind::UpdateDroppableIsEnabled,
            Self::UpdateDroppableIsCombineEnabled { .. } => {
                ActionKind::UpdateDroppableIsCombineEnabled
            }
            Self::MoveUp => ActionKind::MoveUp,
            Self::MoveDown => ActionKind::MoveDown,
            Self::MoveLeft => ActionKind::MoveLeft,
            Self::MoveRight => ActionKind::MoveRight,
            Self::MoveTo { .. } => ActionKind::MoveTo,
            Self::Drop { .. } => ActionKind::Drop,
            Self::DropAnimate { .. } => ActionKind::DropAnimate,
            Self::CompleteDrop { .. } => ActionKind::CompleteDrop,
            Self::DropAnimationFinished => ActionKind::DropAnimationFinished,
            Self::Flush => ActionKind::Flush,
        }
    }
}

/// Record of one accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: Phase,
    pub to: Phase,
    pub action: ActionKind,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Owner of the drag state and its reducer.
#[derive(Debug, Clone, Default)]
pub struct DragStore {
    state: DragState,
    config: DragConfig,
    next_transition_id: u64,
}

impl DragStore {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            state: DragState::default(),
            config,
            next_transition_id: 1,
        }
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Apply `action`. On error the state is left exactly as it was.
    pub fn dispatch(&mut self, action: Action) -> Result<DragTransition, StateError> {
        let kind = action.kind();
        let from = self.state.phase();
        let _span = debug_span!("dropline.state.dispatch", action = ?kind, from = %from).entered();

        let state = std::mem::take(&mut self.state);
        match reduce(&self.config, state, action) {
            Ok(next) => {
                self.state = next;
                let transition = DragTransition {
                    transition_id: self.next_transition_id.max(1),
                    from,
                    to: self.state.phase(),
                    action: kind,
                };
                self.next_transition_id = transition.transition_id + 1;
                debug!(
                    target: "dropline.state",
                    transition_id = transition.transition_id,
                    from = %transition.from,
                    to = %transition.to,
                    action = ?kind,
                    "transition"
                );
                Ok(transition)
            }
            Err((previous, err)) => {
                self.state = previous;
                debug!(target: "dropline.state", error = %err, "action rejected");
                Err(err)
            }
        }
    }
}

type Reduced = Result<DragState, (DragState, StateError)>;

fn invalid(state: DragState, action: ActionKind) -> Reduced {
    let phase = state.phase();
    Err((state, StateError::InvalidTransition { action, phase }))
}

fn reduce(config: &DragConfig, state: DragState, action: Action) -> Reduced {
    let kind = action.kind();
    match (state, action) {
        (_, Action::Flush) => Ok(DragState::default()),

        (
            DragState::Idle { completed },
            Action::InitialPublish {
                critical,
                dimensions,
                viewport,
                client_selection,
                mode,
                is_complete,
            },
        ) => match DraggingState::new(critical, dimensions, viewport, client_selection, mode) {
            Ok(drag) if is_complete => Ok(DragState::Dragging(Box::new(drag))),
            Ok(drag) => Ok(DragState::Collecting(Box::new(drag))),
            Err(err) => Err((DragState::Idle { completed }, err)),
        },

        (DragState::Collecting(drag), Action::PublishWhileDragging(published)) => {
            publish(config, drag, published, true)
        }
        (DragState::Dragging(drag), Action::PublishWhileDragging(published)) => {
            publish(config, drag, published, false)
        }

        (DragState::DropPending { mut drag, reason }, Action::PublishWhileDragging(published)) => {
            let snapshot = drag.clone();
            if let Err(err) = drag.apply_published(published) {
                return Err((DragState::DropPending { drag: snapshot, reason }, err));
            }
            drag.refresh(config, false, false);
            Ok(finish_drop(config, drag, reason))
        }

        (DragState::Collecting(mut drag), Action::Move { client }) => {
            move_fluid(config, &mut drag, client, true);
            Ok(DragState::Collecting(drag))
        }
        (DragState::Dragging(mut drag), Action::Move { client }) => {
            move_fluid(config, &mut drag, client, false);
            Ok(DragState::Dragging(drag))
        }

        (DragState::Collecting(mut drag), Action::MoveByWindowScroll { scroll }) => {
            drag.viewport = drag.viewport.with_scroll(scroll);
            drag.refresh(config, true, true);
            Ok(DragState::Collecting(drag))
        }
        (DragState::Dragging(mut drag), Action::MoveByWindowScroll { scroll }) => {
            drag.viewport = drag.viewport.with_scroll(scroll);
            drag.refresh(config, false, true);
            Ok(DragState::Dragging(drag))
        }

        (
            state @ (DragState::Collecting(_) | DragState::Dragging(_)),
            action @ (Action::UpdateDroppableScroll { .. }
            | Action::UpdateDroppableIsEnabled { .. }
            | Action::UpdateDroppableIsCombineEnabled { .. }),
        ) => update_droppable(config, state, action),

        (
            DragState::Dragging(mut drag),
            action @ (Action::MoveUp | Action::MoveDown | Action::MoveLeft | Action::MoveRight),
        ) => {
            move_snap(config, &mut drag, &action);
            Ok(DragState::Dragging(drag))
        }

        (DragState::Dragging(mut drag), Action::MoveTo { location }) => {
            let Some(droppable) = drag.dimensions.droppables.get(&location.droppable_id) else {
                return Err((
                    DragState::Dragging(drag),
                    StateError::MissingDroppable(location.droppable_id),
                ));
            };
            if droppable.type_id() != &drag.critical.droppable.type_id {
                let err = StateError::TypeMismatch {
                    expected: drag.critical.droppable.type_id.clone(),
                    found: droppable.type_id().clone(),
                };
                return Err((DragState::Dragging(drag), err));
            }
            let impact = if droppable.is_enabled {
                keyboard::impact_for_index(
                    &drag.movement_context(&config.movement, false, true),
                    droppable,
                    location.index,
                )
            } else {
                Impact::no_op()
            };
            drag.impact = impact;
            if drag.mode == MovementMode::Snap {
                drag.snap_to_impact();
            }
            Ok(DragState::Dragging(drag))
        }

        (DragState::Collecting(drag), Action::Drop { reason }) => {
            Ok(DragState::DropPending { drag, reason })
        }
        (DragState::Dragging(drag), Action::Drop { reason }) => Ok(finish_drop(config, drag, reason)),

        (
            DragState::Dragging(drag) | DragState::DropPending { drag, .. },
            Action::DropAnimate {
                completed,
                new_home_client_offset,
                duration,
            },
        ) => Ok(DragState::DropAnimating {
            drag,
            completed,
            new_home_client_offset,
            duration,
        }),

        (
            DragState::Dragging(_) | DragState::DropPending { .. } | DragState::DropAnimating { .. },
            Action::CompleteDrop { completed },
        ) => Ok(DragState::Idle {
            completed: Some(completed),
        }),

        (DragState::DropAnimating { completed, .. }, Action::DropAnimationFinished) => {
            Ok(DragState::Idle {
                completed: Some(completed),
            })
        }

        (state, _) => invalid(state, kind),
    }
}

/// Apply a dimension delta; collection is complete afterwards.
fn publish(
    config: &DragConfig,
    mut drag: Box<DraggingState>,
    published: Published,
    collecting: bool,
) -> Reduced {
    let snapshot = drag.clone();
    if let Err(err) = drag.apply_published(published) {
        return Err((rewrap(snapshot, collecting), err));
    }
    drag.refresh(config, false, false);
    Ok(DragState::Dragging(drag))
}

fn move_fluid(config: &DragConfig, drag: &mut DraggingState, client: Point, home_only: bool) {
    drag.current.client_selection = client;
    drag.current.client_offset = client - drag.initial.client_selection;
    drag.sync_page_center();
    let impact = movement::fluid_impact(
        &drag.movement_context(&config.movement, home_only, true),
        drag.current.page_center,
    );
    drag.impact = impact;
}

fn move_snap(config: &DragConfig, drag: &mut DraggingState, action: &Action) {
    let current = drag
        .impact
        .target_droppable()
        .unwrap_or(&drag.critical.droppable.id);
    let Some(axis) = drag.dimensions.droppables.get(current).map(|d| d.axis) else {
        return;
    };
    let vertical = axis == dropline_core::Axis::Vertical;
    let (main_axis, step) = match action {
        Action::MoveUp => (vertical, Step::Backward),
        Action::MoveDown => (vertical, Step::Forward),
        Action::MoveLeft => (!vertical, Step::Backward),
        _ => (!vertical, Step::Forward),
    };

    let ctx = drag.movement_context(&config.movement, false, true);
    let next = if main_axis {
        keyboard::move_on_main_axis(&ctx, step)
    } else {
        keyboard::move_on_cross_axis(&ctx, drag.current.page_center, step)
    };
    if let Some(impact) = next {
        drag.impact = impact;
        drag.snap_to_impact();
    }
}

fn update_droppable(config: &DragConfig, state: DragState, action: Action) -> Reduced {
    let kind = action.kind();
    let (mut drag, collecting) = match state {
        DragState::Collecting(drag) => (drag, true),
        DragState::Dragging(drag) => (drag, false),
        other => return invalid(other, kind),
    };
    let id = match &action {
        Action::UpdateDroppableScroll { id, .. }
        | Action::UpdateDroppableIsEnabled { id, .. }
        | Action::UpdateDroppableIsCombineEnabled { id, .. } => id.clone(),
        _ => return invalid(rewrap(drag, collecting), kind),
    };
    if !drag.dimensions.droppables.contains_key(&id) {
        return Err((rewrap(drag, collecting), StateError::MissingDroppable(id)));
    }
    let Some(droppable) = drag.dimensions.droppables.get_mut(&id) else {
        return Ok(rewrap(drag, collecting));
    };
    match action {
        Action::UpdateDroppableScroll { offset, .. } => {
            if let Some(frame) = droppable.frame.as_mut() {
                frame.scroll = frame.scroll.with_current(offset);
            }
        }
        Action::UpdateDroppableIsEnabled { is_enabled, .. } => droppable.is_enabled = is_enabled,
        Action::UpdateDroppableIsCombineEnabled {
            is_combine_enabled, ..
        } => droppable.is_combine_enabled = is_combine_enabled,
        _ => {}
    }
    drag.refresh(config, collecting, true);
    Ok(rewrap(drag, collecting))
}

fn rewrap(drag: Box<DraggingState>, collecting: bool) -> DragState {
    if collecting {
        DragState::Collecting(drag)
    } else {
        DragState::Dragging(drag)
    }
}

/// Compute the final result and decide whether the item has to travel.
fn finish_drop(config: &DragConfig, drag: Box<DraggingState>, reason: DropReason) -> DragState {
    let impact = match reason {
        DropReason::Drop => drag.impact.clone(),
        DropReason::Cancel => Impact::no_op(),
    };
    let start = drag.drag_start();
    let result = DropResult {
        draggable_id: start.draggable_id,
        type_id: start.type_id,
        source: start.source,
        destination: impact
            .combine
            .is_none()
            .then(|| impact.destination.clone())
            .flatten(),
        combine: impact.combine.clone(),
        reason,
        mode: drag.mode,
    };
    let page_offset = new_home_page_offset(&drag.critical, &drag.dimensions, &impact);
    let new_home_client_offset = page_offset - drag.viewport.scroll.diff();
    let distance = drag.current.client_offset.distance(new_home_client_offset);
    let duration = drop_duration(distance, reason, &config.drop_animation);

    let completed = CompletedDrag {
        critical: drag.critical.clone(),
        result,
        impact,
    };
    if duration.is_zero() {
        DragState::Idle {
            completed: Some(completed),
        }
    } else {
        DragState::DropAnimating {
            drag,
            completed,
            new_home_client_offset,
            duration,
        }
    }
}
