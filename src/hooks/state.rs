//! State cells and their dispatchers.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::engine::fiber::FiberId;
use crate::engine::lanes::request_update_lane;
use crate::engine::update_queue::{Action, SharedQueue, create_update};
use crate::error::Result;
use crate::root::Scheduler;

use super::effect::Dep;

// =============================================================================
// State Hook
// =============================================================================

/// The record a state hook keeps between renders.
///
/// The queue and dispatcher are created on mount and carried over to every
/// later record unchanged.
pub(crate) struct StateHook<S> {
    pub value: S,
    pub queue: SharedQueue<S>,
    pub dispatch: Dispatch<S>,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Setter for one state cell.
///
/// Cheap to clone. Every clone refers to the same cell, and the dispatcher
/// stays the same object across renders, so it is safe to capture in
/// effects and compares equal to itself as a dependency.
pub struct Dispatch<S> {
    inner: Rc<DispatchInner<S>>,
}

struct DispatchInner<S> {
    fiber: FiberId,
    queue: SharedQueue<S>,
    scheduler: Weak<dyn Scheduler>,
}

impl<S: 'static> Dispatch<S> {
    pub(crate) fn new(fiber: FiberId, queue: SharedQueue<S>, scheduler: Weak<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(DispatchInner {
                fiber,
                queue,
                scheduler,
            }),
        }
    }

    /// Replace the state.
    pub fn set(&self, value: S) -> Result<()> {
        self.dispatch(Action::Replace(value))
    }

    /// Compute the next state from the previous one.
    pub fn update(&self, f: impl Fn(&S) -> S + 'static) -> Result<()> {
        self.dispatch(Action::Apply(Rc::new(f)))
    }

    fn dispatch(&self, action: Action<S>) -> Result<()> {
        let lane = request_update_lane();
        self.inner
            .queue
            .borrow_mut()
            .enqueue(create_update(action, lane));

        match self.inner.scheduler.upgrade() {
            Some(scheduler) => scheduler.schedule_update_on_fiber(self.inner.fiber, lane),
            None => {
                trace!(fiber = ?self.inner.fiber, "dispatch after root was dropped");
                Ok(())
            }
        }
    }

    /// Whether both dispatchers drive the same state cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn identity(&self) -> Dep {
        Dep::shared(&self.inner)
    }
}

impl<S> Clone for Dispatch<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> fmt::Debug for Dispatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("fiber", &self.inner.fiber)
            .field("pending", &self.inner.queue.try_borrow().map(|q| q.len()).ok())
            .finish()
    }
}
