#![forbid(unsafe_code)]

//! Input arbitration: at most one sensor drives the engine at a time.
//!
//! A sensor first claims a lock for a draggable ([`PreDragActions`]), then
//! promotes it to a fluid or snap drag. Every handle carries only its
//! [`LockId`]; each call is validated against the live lock, so a handle
//! kept around after its drag ended degrades to a warning instead of
//! touching a newer drag.
//!
//! # Lifecycle
//!
//! ```text
//! Unclaimed ──try_get_lock──► PreDrag ──fluid_lift / snap_lift──► Dragging
//!     ▲                          │                                   │
//!     └──────── abort ───────────┴──────── drop / cancel / abort ────┘
//! ```

use std::fmt;

use bitflags::bitflags;
use dropline_core::{DraggableId, DraggableLocation, DropReason, MovementMode, Point};

use crate::context::SensorApi;
use crate::error::LockError;
use crate::state::Action;

/// Identifies one claim. Never reused within a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockId(u64);

impl LockId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock#{}", self.0)
    }
}

bitflags! {
    /// What a lock in a given state may do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LockCapabilities: u16 {
        const IS_ACTIVE                  = 1 << 0;
        const SHOULD_RESPECT_FORCE_PRESS = 1 << 1;
        const FLUID_LIFT                 = 1 << 2;
        const SNAP_LIFT                  = 1 << 3;
        const ABORT                      = 1 << 4;
        const MOVE                       = 1 << 5;
        const MOVE_UP                    = 1 << 6;
        const MOVE_DOWN                  = 1 << 7;
        const MOVE_LEFT                  = 1 << 8;
        const MOVE_RIGHT                 = 1 << 9;
        const MOVE_TO                    = 1 << 10;
        const DROP                       = 1 << 11;
        const CANCEL                     = 1 << 12;
    }
}

impl LockCapabilities {
    /// Capabilities of a claimed, not yet lifted lock.
    pub const PRE_DRAG: Self = Self::IS_ACTIVE
        .union(Self::SHOULD_RESPECT_FORCE_PRESS)
        .union(Self::FLUID_LIFT)
        .union(Self::SNAP_LIFT)
        .union(Self::ABORT);

    /// Capabilities of a fluid drag.
    pub const FLUID: Self = Self::IS_ACTIVE
        .union(Self::MOVE)
        .union(Self::DROP)
        .union(Self::CANCEL);

    /// Capabilities of a snap drag.
    pub const SNAP: Self = Self::IS_ACTIVE
        .union(Self::MOVE_UP)
        .union(Self::MOVE_DOWN)
        .union(Self::MOVE_LEFT)
        .union(Self::MOVE_RIGHT)
        .union(Self::MOVE_TO)
        .union(Self::DROP)
        .union(Self::CANCEL);

    /// Capability needed to end a drag for `reason`.
    #[must_use]
    pub const fn ending(reason: DropReason) -> Self {
        match reason {
            DropReason::Drop => Self::DROP,
            DropReason::Cancel => Self::CANCEL,
        }
    }
}

/// Snapshot of the current lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    Unclaimed,
    PreDrag {
        id: LockId,
        draggable_id: DraggableId,
    },
    Dragging {
        id: LockId,
        draggable_id: DraggableId,
        mode: MovementMode,
    },
}

impl Lock {
    #[must_use]
    pub fn capabilities(&self) -> LockCapabilities {
        match self {
            Self::Unclaimed => LockCapabilities::empty(),
            Self::PreDrag { .. } => LockCapabilities::PRE_DRAG,
            Self::Dragging {
                mode: MovementMode::Fluid,
                ..
            } => LockCapabilities::FLUID,
            Self::Dragging {
                mode: MovementMode::Snap,
                ..
            } => LockCapabilities::SNAP,
        }
    }

    pub fn id(&self) -> Option<LockId> {
        match self {
            Self::Unclaimed => None,
            Self::PreDrag { id, .. } | Self::Dragging { id, .. } => Some(*id),
        }
    }
}

// ---------------------------------------------------------------------------
// Lock bookkeeping
// ---------------------------------------------------------------------------

struct ClaimedLock {
    id: LockId,
    draggable_id: DraggableId,
    mode: Option<MovementMode>,
    on_abort: Option<Box<dyn FnOnce()>>,
}

/// Owner of the single live claim.
#[derive(Default)]
pub(crate) struct LockMarshal {
    next_id: u64,
    claimed: Option<ClaimedLock>,
}

impl fmt::Debug for LockMarshal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockMarshal")
            .field("next_id", &self.next_id)
            .field("lock", &self.snapshot())
            .finish()
    }
}

impl LockMarshal {
    pub(crate) fn is_claimed(&self) -> bool {
        self.claimed.is_some()
    }

    pub(crate) fn snapshot(&self) -> Lock {
        match &self.claimed {
            None => Lock::Unclaimed,
            Some(ClaimedLock {
                id,
                draggable_id,
                mode: None,
                ..
            }) => Lock::PreDrag {
                id: *id,
                draggable_id: draggable_id.clone(),
            },
            Some(ClaimedLock {
                id,
                draggable_id,
                mode: Some(mode),
                ..
            }) => Lock::Dragging {
                id: *id,
                draggable_id: draggable_id.clone(),
                mode: *mode,
            },
        }
    }

    /// Capabilities of `id`, empty when it is not the live lock.
    pub(crate) fn capabilities_of(&self, id: LockId) -> LockCapabilities {
        let lock = self.snapshot();
        if lock.id() == Some(id) {
            lock.capabilities()
        } else {
            LockCapabilities::empty()
        }
    }

    pub(crate) fn claim(&mut self, draggable_id: DraggableId, on_abort: Box<dyn FnOnce()>) -> LockId {
        self.next_id += 1;
        let id = LockId(self.next_id);
        self.claimed = Some(ClaimedLock {
            id,
            draggable_id,
            mode: None,
            on_abort: Some(on_abort),
        });
        id
    }

    pub(crate) fn draggable_id(&self) -> Option<&DraggableId> {
        self.claimed.as_ref().map(|c| &c.draggable_id)
    }

    /// Mark `id` as lifted.
    pub(crate) fn promote(&mut self, id: LockId, mode: MovementMode) -> Result<(), LockError> {
        match self.claimed.as_mut() {
            Some(claimed) if claimed.id == id => match claimed.mode {
                Some(_) => Err(LockError::AlreadyLifted { lock: id }),
                None => {
                    claimed.mode = Some(mode);
                    Ok(())
                }
            },
            _ => Err(LockError::NotLifted { lock: id }),
        }
    }

    /// Give the lock up without notifying its holder.
    pub(crate) fn release(&mut self) -> Option<LockId> {
        self.claimed.take().map(|c| c.id)
    }

    /// Revoke the lock and notify its holder.
    pub(crate) fn abort(&mut self) -> Option<LockId> {
        let mut claimed = self.claimed.take()?;
        if let Some(on_abort) = claimed.on_abort.take() {
            on_abort();
        }
        Some(claimed.id)
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// A claimed lock that has not lifted yet.
#[derive(Debug, PartialEq, Eq)]
pub struct PreDragActions {
    lock: LockId,
}

impl PreDragActions {
    pub(crate) fn new(lock: LockId) -> Self {
        Self { lock }
    }

    #[must_use]
    pub fn lock_id(&self) -> LockId {
        self.lock
    }

    pub fn is_active(&self, api: &SensorApi<'_>) -> bool {
        api.context()
            .lock_capabilities(self.lock)
            .contains(LockCapabilities::IS_ACTIVE)
    }

    /// Whether a force press on this draggable should cancel the drag.
    pub fn should_respect_force_press(&self, api: &SensorApi<'_>) -> bool {
        api.context().lock_respects_force_press(self.lock)
    }

    /// Start a pointer-driven drag at `client`.
    pub fn fluid_lift(self, api: &mut SensorApi<'_>, client: Point) -> Option<FluidDragActions> {
        api.context_mut()
            .lift(self.lock, MovementMode::Fluid, Some(client))
            .then_some(FluidDragActions { lock: self.lock })
    }

    /// Start a keyboard-driven drag.
    pub fn snap_lift(self, api: &mut SensorApi<'_>) -> Option<SnapDragActions> {
        api.context_mut()
            .lift(self.lock, MovementMode::Snap, None)
            .then_some(SnapDragActions { lock: self.lock })
    }

    /// Give up before lifting.
    pub fn abort(self, api: &mut SensorApi<'_>) {
        api.context_mut().abort_pre_drag(self.lock);
    }
}

/// A live pointer-driven drag.
#[derive(Debug, PartialEq, Eq)]
pub struct FluidDragActions {
    lock: LockId,
}

impl FluidDragActions {
    #[must_use]
    pub fn lock_id(&self) -> LockId {
        self.lock
    }

    pub fn is_active(&self, api: &SensorApi<'_>) -> bool {
        api.context()
            .lock_capabilities(self.lock)
            .contains(LockCapabilities::IS_ACTIVE)
    }

    /// Whether a force press should cancel this drag.
    pub fn should_respect_force_press(&self, api: &SensorApi<'_>) -> bool {
        api.context().lock_respects_force_press(self.lock)
    }

    /// Move the selection point. Coalesced until the next frame.
    pub fn move_to(&self, api: &mut SensorApi<'_>, client: Point) -> bool {
        api.context_mut().lock_move(self.lock, client)
    }

    pub fn drop(self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut().lock_drop(self.lock, DropReason::Drop)
    }

    pub fn cancel(self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut().lock_drop(self.lock, DropReason::Cancel)
    }
}

/// A live keyboard-driven (or programmatic) drag.
#[derive(Debug, PartialEq, Eq)]
pub struct SnapDragActions {
    lock: LockId,
}

impl SnapDragActions {
    #[must_use]
    pub fn lock_id(&self) -> LockId {
        self.lock
    }

    pub fn is_active(&self, api: &SensorApi<'_>) -> bool {
        api.context()
            .lock_capabilities(self.lock)
            .contains(LockCapabilities::IS_ACTIVE)
    }

    pub fn move_up(&self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut()
            .lock_snap(self.lock, LockCapabilities::MOVE_UP, Action::MoveUp)
    }

    pub fn move_down(&self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut()
            .lock_snap(self.lock, LockCapabilities::MOVE_DOWN, Action::MoveDown)
    }

    pub fn move_left(&self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut()
            .lock_snap(self.lock, LockCapabilities::MOVE_LEFT, Action::MoveLeft)
    }

    pub fn move_right(&self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut()
            .lock_snap(self.lock, LockCapabilities::MOVE_RIGHT, Action::MoveRight)
    }

    /// Place the item at an explicit location.
    pub fn move_to(&self, api: &mut SensorApi<'_>, location: DraggableLocation) -> bool {
        api.context_mut()
            .lock_snap(self.lock, LockCapabilities::MOVE_TO, Action::MoveTo { location })
    }

    pub fn drop(self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut().lock_drop(self.lock, DropReason::Drop)
    }

    pub fn cancel(self, api: &mut SensorApi<'_>) -> bool {
        api.context_mut().lock_drop(self.lock, DropReason::Cancel)
    }
}

/// Either kind of live drag.
#[derive(Debug, PartialEq, Eq)]
pub enum DragActions {
    Fluid(FluidDragActions),
    Snap(SnapDragActions),
}

impl DragActions {
    #[must_use]
    pub fn lock_id(&self) -> LockId {
        match self {
            Self::Fluid(actions) => actions.lock_id(),
            Self::Snap(actions) => actions.lock_id(),
        }
    }

    pub fn drop(self, api: &mut SensorApi<'_>) -> bool {
        match self {
            Self::Fluid(actions) => actions.drop(api),
            Self::Snap(actions) => actions.drop(api),
        }
    }

    pub fn cancel(self, api: &mut SensorApi<'_>) -> bool {
        match self {
            Self::Fluid(actions) => actions.cancel(api),
            Self::Snap(actions) => actions.cancel(api),
        }
    }
}
