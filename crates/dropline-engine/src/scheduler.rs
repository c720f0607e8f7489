#![forbid(unsafe_code)]

//! Frame-paced coalescing for high-frequency drag input.
//!
//! Pointers report positions far more often than the screen refreshes.
//! [`FrameScheduler`] keeps at most one pending position and one pending
//! window scroll offset; the drag context drains them once per frame.
//!
//! # Design
//!
//! "Latest wins": scheduling a value while one is pending replaces it.
//! Intermediate values are dropped, never queued. Nothing here knows about
//! real frame timing; the host decides when a frame happens by calling
//! [`DragContext::frame`](crate::DragContext::frame).
//!
//! ```
//! use dropline_core::Point;
//! use dropline_engine::FrameScheduler;
//!
//! let mut scheduler = FrameScheduler::new();
//! scheduler.schedule_move(Point::new(10.0, 10.0));
//! scheduler.schedule_move(Point::new(20.0, 20.0));
//!
//! let frame = scheduler.drain();
//! assert_eq!(frame.pending_move, Some(Point::new(20.0, 20.0)));
//! assert!(scheduler.drain().is_empty());
//! ```

use dropline_core::Point;

/// Everything that was pending when a frame was drained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameWork {
    pub pending_move: Option<Point>,
    pub pending_window_scroll: Option<Point>,
}

impl FrameWork {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_move.is_none() && self.pending_window_scroll.is_none()
    }
}

/// Cooperative "one pending tick" scheduler.
///
/// `FrameScheduler` is not thread-safe. It should be used from the single
/// event processing thread that owns the drag context.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: FrameWork,
    frames: u64,
    coalesced: u64,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest client position. Returns `true` if it superseded an
    /// earlier pending position.
    pub fn schedule_move(&mut self, client: Point) -> bool {
        let replaced = self.pending.pending_move.replace(client).is_some();
        if replaced {
            self.coalesced += 1;
        }
        replaced
    }

    /// Record the latest window scroll offset.
    pub fn schedule_window_scroll(&mut self, offset: Point) -> bool {
        let replaced = self.pending.pending_window_scroll.replace(offset).is_some();
        if replaced {
            self.coalesced += 1;
        }
        replaced
    }

    /// Drop a pending move without applying it.
    pub fn cancel_move(&mut self) -> Option<Point> {
        self.pending.pending_move.take()
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.pending = FrameWork::default();
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take everything pending for this frame.
    pub fn drain(&mut self) -> FrameWork {
        self.frames += 1;
        std::mem::take(&mut self.pending)
    }

    /// Frames drained so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Values dropped because a newer one arrived in the same frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
