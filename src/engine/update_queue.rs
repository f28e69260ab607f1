//! Update queue - batched state transitions.
//!
//! Updates dispatched before a render are appended to a queue and replayed,
//! in submission order, exactly once by the next render pass that reaches the
//! owner of the queue.
//!
//! # Batching
//!
//! ```text
//! set(1); update(|n| n + 1); set(10); update(|n| n * 2);
//!
//! pending: [Replace(1), Apply(+1), Replace(10), Apply(*2)]
//! process(base=0) -> 1 -> 2 -> 10 -> 20
//! ```
//!
//! The pending list is taken (left empty) before processing starts. Anything
//! enqueued while the batch is being replayed lands in a fresh batch for the
//! next pass.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::lanes::{Lane, Lanes};

// =============================================================================
// Update
// =============================================================================

/// What an update does to the state it is applied to.
pub enum Action<S> {
    /// Replace the state with this value.
    Replace(S),
    /// Compute the next state from the previous one.
    Apply(Rc<dyn Fn(&S) -> S>),
}

impl<S: Clone> Clone for Action<S> {
    fn clone(&self) -> Self {
        match self {
            Action::Replace(value) => Action::Replace(value.clone()),
            Action::Apply(f) => Action::Apply(f.clone()),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Action::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

impl<S> Action<S> {
    /// Apply this action to `state`.
    #[inline]
    pub fn reduce(&self, state: &S) -> S
    where
        S: Clone,
    {
        match self {
            Action::Replace(value) => value.clone(),
            Action::Apply(f) => f(state),
        }
    }
}

/// One pending state transition.
#[derive(Debug, Clone)]
pub struct Update<S> {
    pub action: Action<S>,
    pub lane: Lane,
}

/// Create an update for `action` at `lane`.
pub fn create_update<S>(action: Action<S>, lane: Lane) -> Update<S> {
    Update { action, lane }
}

// =============================================================================
// Queue
// =============================================================================

/// Pending updates for one state cell (or for a root).
pub struct UpdateQueue<S> {
    pending: Vec<Update<S>>,
}

/// A queue shared between the current and work-in-progress hook records and
/// every dispatcher handed out for it.
pub type SharedQueue<S> = Rc<RefCell<UpdateQueue<S>>>;

impl<S> UpdateQueue<S> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Create an empty queue ready to share.
    pub fn shared() -> SharedQueue<S> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Append an update. O(1), arrival order preserved.
    pub fn enqueue(&mut self, update: Update<S>) {
        self.pending.push(update);
    }

    /// Take the whole pending batch, leaving the queue empty.
    pub fn take_pending(&mut self) -> Vec<Update<S>> {
        std::mem::take(&mut self.pending)
    }

    /// Put a batch taken by [`take_pending`](Self::take_pending) back in front
    /// of anything enqueued since.
    pub fn restore(&mut self, mut batch: Vec<Update<S>>) {
        if batch.is_empty() {
            return;
        }
        batch.append(&mut self.pending);
        self.pending = batch;
    }

    /// Lanes of every pending update.
    pub fn pending_lanes(&self) -> Lanes {
        self.pending
            .iter()
            .fold(Lanes::empty(), |lanes, update| lanes | update.lane)
    }

    /// Whether anything is waiting.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of pending updates.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for UpdateQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

// =============================================================================
// Processing
// =============================================================================

/// Replay `pending` over `base_state`, in order, exactly once each.
///
/// Only [`Lanes::SYNC`] exists, so every update in the batch belongs to the
/// render lane.
pub fn process_update_queue<S: Clone>(base_state: S, pending: &[Update<S>], render_lane: Lane) -> S {
    debug_assert!(
        pending.iter().all(|update| render_lane.contains(update.lane)),
        "update lane outside the render lane"
    );
    pending
        .iter()
        .fold(base_state, |state, update| update.action.reduce(&state))
}
