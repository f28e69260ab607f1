//! Hooks - component-local state and effects.
//!
//! A component receives a [`Hooks`] context for the duration of one render.
//! Hook calls are matched to the previous render's records purely by call
//! order, so a component must call the same hooks in the same order every
//! time it renders. Breaking that is reported as
//! [`ReconcileError::HookMismatch`] or [`ReconcileError::HookTypeMismatch`].
//!
//! # Mount vs update
//!
//! ```text
//! first render (no committed fiber)     later renders
//! ---------------------------------     --------------------------------
//! use_state   -> new cell + queue       -> next record, drain its queue
//! use_effect  -> always scheduled       -> scheduled only if deps changed
//! ```
//!
//! # Example
//!
//! ```
//! use spark_fiber::{deps, Child, Element, Hooks, Result};
//!
//! fn counter(hooks: &mut Hooks<'_>) -> Result<Child> {
//!     let (count, set_count) = hooks.use_state(0)?;
//!     hooks.use_effect(
//!         move || {
//!             if count == 0 {
//!                 let _ = set_count.set(1);
//!             }
//!             None
//!         },
//!         deps![count],
//!     )?;
//!     Ok(Element::host("span").child(count).into())
//! }
//! ```
//!
//! Effect records are internal. Components only see [`Cleanup`] and [`Dep`]:
//!
//! ```compile_fail
//! use spark_fiber::hooks::Effect;
//! ```

mod effect;
mod state;

pub use effect::{Cleanup, Dep};
pub use state::Dispatch;

pub(crate) use effect::{Effect, EffectCallback, EffectInstance};

use std::any::{Any, type_name};
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::engine::fiber::FiberId;
use crate::engine::lanes::Lane;
use crate::engine::update_queue::{UpdateQueue, process_update_queue};
use crate::error::{ReconcileError, Result};
use crate::root::Scheduler;
use crate::types::{FiberFlags, HookFlags};

use effect::are_deps_equal;
use state::StateHook;

/// Undo action recorded while rendering, run if the pass aborts.
pub(crate) type Rollback = Box<dyn FnOnce()>;

// =============================================================================
// Hook Records
// =============================================================================

/// One hook call-site's record for one render.
#[derive(Clone)]
pub(crate) enum Hook {
    State {
        cell: Rc<dyn Any>,
        type_name: &'static str,
    },
    Effect(Rc<Effect>),
}

impl Hook {
    fn kind_name(&self) -> &'static str {
        match self {
            Hook::State { type_name, .. } => type_name,
            Hook::Effect(_) => "effect",
        }
    }
}

// =============================================================================
// Render Context
// =============================================================================

/// Which set of hook implementations is active.
enum Dispatcher {
    Mount,
    Update { previous: Vec<Hook> },
}

/// Hook context for one component render.
pub struct Hooks<'a> {
    fiber: FiberId,
    component: &'static str,
    lane: Lane,
    scheduler: Weak<dyn Scheduler>,
    dispatcher: Dispatcher,
    hooks: Vec<Hook>,
    effects: Vec<Rc<Effect>>,
    flags: FiberFlags,
    rollback: &'a mut Vec<Rollback>,
}

/// What a finished component render leaves on its fiber.
pub(crate) struct HookOutcome {
    pub hooks: Vec<Hook>,
    pub effects: Vec<Rc<Effect>>,
    pub flags: FiberFlags,
}

impl<'a> Hooks<'a> {
    /// Context for rendering `fiber`. `previous` is the hook list of its
    /// committed counterpart; `None` selects the mount implementations.
    pub(crate) fn new(
        fiber: FiberId,
        component: &'static str,
        previous: Option<Vec<Hook>>,
        lane: Lane,
        scheduler: Weak<dyn Scheduler>,
        rollback: &'a mut Vec<Rollback>,
    ) -> Self {
        let dispatcher = match previous {
            Some(previous) => Dispatcher::Update { previous },
            None => Dispatcher::Mount,
        };
        Self {
            fiber,
            component,
            lane,
            scheduler,
            dispatcher,
            hooks: Vec::new(),
            effects: Vec::new(),
            flags: FiberFlags::empty(),
            rollback,
        }
    }

    /// Name of the component being rendered.
    pub fn component_name(&self) -> &'static str {
        self.component
    }

    /// Whether this is the component's first render.
    pub fn is_mount(&self) -> bool {
        matches!(self.dispatcher, Dispatcher::Mount)
    }

    /// Check the call count and hand the records back to the fiber.
    ///
    /// The outcome is returned even when the count is wrong, so the caller
    /// can keep the fiber consistent before reporting the error.
    pub(crate) fn finish(self) -> (HookOutcome, Result<()>) {
        let check = match &self.dispatcher {
            Dispatcher::Update { previous } if self.hooks.len() < previous.len() => {
                Err(ReconcileError::HookMismatch {
                    component: self.component,
                    expected: previous.len(),
                    actual: self.hooks.len(),
                })
            }
            _ => Ok(()),
        };
        let outcome = HookOutcome {
            hooks: self.hooks,
            effects: self.effects,
            flags: self.flags,
        };
        (outcome, check)
    }

    /// The previous record at the current position, or a mismatch error.
    fn previous_hook(&self) -> Result<Option<Hook>> {
        let Dispatcher::Update { previous } = &self.dispatcher else {
            return Ok(None);
        };
        let position = self.hooks.len();
        match previous.get(position) {
            Some(hook) => Ok(Some(hook.clone())),
            None => Err(ReconcileError::HookMismatch {
                component: self.component,
                expected: previous.len(),
                actual: position + 1,
            }),
        }
    }

    fn type_mismatch(&self, previous: &Hook, found: &'static str) -> ReconcileError {
        ReconcileError::HookTypeMismatch {
            component: self.component,
            position: self.hooks.len(),
            expected: previous.kind_name(),
            found,
        }
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// A state cell, initialized with `initial` on the first render.
    ///
    /// Returns the current value and a [`Dispatch`] whose identity is stable
    /// for the component's lifetime.
    pub fn use_state<S: Clone + 'static>(&mut self, initial: S) -> Result<(S, Dispatch<S>)> {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state), with a lazy initializer that only
    /// runs on the first render.
    pub fn use_state_with<S, F>(&mut self, init: F) -> Result<(S, Dispatch<S>)>
    where
        S: Clone + 'static,
        F: FnOnce() -> S,
    {
        let record = match self.previous_hook()? {
            None => self.mount_state(init()),
            Some(previous) => self.update_state::<S>(&previous)?,
        };
        let result = (record.value.clone(), record.dispatch.clone());
        self.hooks.push(Hook::State {
            cell: record,
            type_name: type_name::<S>(),
        });
        Ok(result)
    }

    fn mount_state<S: Clone + 'static>(&self, value: S) -> Rc<StateHook<S>> {
        let queue = UpdateQueue::shared();
        let dispatch = Dispatch::new(self.fiber, queue.clone(), self.scheduler.clone());
        Rc::new(StateHook {
            value,
            queue,
            dispatch,
        })
    }

    fn update_state<S: Clone + 'static>(&mut self, previous: &Hook) -> Result<Rc<StateHook<S>>> {
        let Hook::State { cell, .. } = previous else {
            return Err(self.type_mismatch(previous, type_name::<S>()));
        };
        let Some(prev) = cell.downcast_ref::<StateHook<S>>() else {
            return Err(self.type_mismatch(previous, type_name::<S>()));
        };

        let batch = prev.queue.borrow_mut().take_pending();
        let value = process_update_queue(prev.value.clone(), &batch, self.lane);
        if !batch.is_empty() {
            let queue = prev.queue.clone();
            self.rollback
                .push(Box::new(move || queue.borrow_mut().restore(batch)));
        }

        Ok(Rc::new(StateHook {
            value,
            queue: prev.queue.clone(),
            dispatch: prev.dispatch.clone(),
        }))
    }

    // -------------------------------------------------------------------------
    // Effects
    // -------------------------------------------------------------------------

    /// A passive effect, run after the commit that renders it.
    ///
    /// With `deps` of `None` it runs after every commit. With a list it runs
    /// on mount and whenever an entry differs from the previous render; an
    /// empty list (`deps![]`) runs it once. A cleanup returned by the body
    /// runs before the next run and when the component unmounts.
    pub fn use_effect<F>(&mut self, create: F, deps: Option<Vec<Dep>>) -> Result<()>
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let create: EffectCallback = Box::new(create);
        let effect = match self.previous_hook()? {
            None => {
                self.flags |= FiberFlags::PASSIVE_EFFECT;
                Effect::new(
                    HookFlags::PASSIVE | HookFlags::HAS_EFFECT,
                    create,
                    Rc::new(EffectInstance::default()),
                    deps,
                )
            }
            Some(previous) => {
                let Hook::Effect(prev) = &previous else {
                    return Err(self.type_mismatch(&previous, "effect"));
                };
                let unchanged = match (&deps, &prev.deps) {
                    (Some(next), Some(prev_deps)) => {
                        if next.len() != prev_deps.len() {
                            warn!(
                                component = self.component,
                                previous = prev_deps.len(),
                                next = next.len(),
                                "effect dependency list changed length between renders"
                            );
                        }
                        are_deps_equal(next, prev_deps)
                    }
                    _ => false,
                };
                if unchanged {
                    Effect::new(HookFlags::PASSIVE, create, prev.instance().clone(), deps)
                } else {
                    self.flags |= FiberFlags::PASSIVE_EFFECT;
                    Effect::new(
                        HookFlags::PASSIVE | HookFlags::HAS_EFFECT,
                        create,
                        prev.instance().clone(),
                        deps,
                    )
                }
            }
        };

        let effect = Rc::new(effect);
        self.effects.push(effect.clone());
        self.hooks.push(Hook::Effect(effect));
        Ok(())
    }
}
