//! Root - the entry point that owns a tree and drives its renders.
//!
//! A [`Root`] binds a host adapter and a container instance to one fiber
//! tree. [`Root::render`] and every [`Dispatch`](crate::Dispatch) call go
//! through the same driver:
//!
//! ```text
//! schedule_update_on_fiber(lane)
//!   pending_lanes |= lane
//!   already driving?  -> return, the running drive picks it up
//!   loop while pending_lanes != empty:
//!       render pass  (abort: roll back, discard work in progress)
//!       commit       (host already touched on failure: poison the root)
//!       flush passive effects   (may schedule more lanes)
//! ```
//!
//! Everything is single-threaded. Work scheduled while a pass runs (from a
//! render, an effect, or a cleanup) is deferred to the next pass of the
//! running drive, bounded by
//! [`ReconcilerConfig::max_nested_updates`](crate::ReconcilerConfig).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use crate::commit::{CommitFailure, CommitStats, PendingPassiveEffects, commit_root};
use crate::config::ReconcilerConfig;
use crate::element::Child;
use crate::engine::arena::FiberArena;
use crate::engine::fiber::{Fiber, FiberId};
use crate::engine::lanes::{Lane, Lanes, NO_LANES, get_highest_priority_lane, merge_lanes, request_update_lane};
use crate::engine::update_queue::{Action, SharedQueue, UpdateQueue, create_update};
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::reconciler::RenderPass;
use crate::reconciler::work_loop::render_root;

// =============================================================================
// Scheduler
// =============================================================================

/// Where dispatchers send their updates.
pub(crate) trait Scheduler {
    fn schedule_update_on_fiber(&self, fiber: FiberId, lane: Lane) -> Result<()>;
}

// =============================================================================
// Root
// =============================================================================

/// A mounted tree bound to a host container.
///
/// Dropping the root drops the tree without running effect cleanups; call
/// [`unmount`](Self::unmount) first for an orderly teardown.
pub struct Root<H: HostConfig> {
    shared: Rc<RootShared<H>>,
}

struct RootShared<H: HostConfig> {
    state: RefCell<RootState<H>>,
    container: H::Instance,
    root_fiber: FiberId,
    /// Pending element updates for the root fiber.
    root_queue: SharedQueue<Child>,
    pending_lanes: Cell<Lanes>,
    executing: Cell<bool>,
    /// Set when a commit failed after mutating the host tree.
    poisoned: Cell<bool>,
    config: ReconcilerConfig,
    /// Handed to dispatchers; never keeps the root alive.
    this: Weak<dyn Scheduler>,
}

struct RootState<H: HostConfig> {
    host: H,
    arena: FiberArena<H::Instance>,
    last_commit: CommitStats,
}

/// Create a root rendering into `container` with the default configuration.
pub fn create_root<H: HostConfig>(host: H, container: H::Instance) -> Root<H> {
    create_root_with_config(host, container, ReconcilerConfig::default())
}

/// Create a root rendering into `container`.
pub fn create_root_with_config<H: HostConfig>(host: H, container: H::Instance, config: ReconcilerConfig) -> Root<H> {
    let mut arena = FiberArena::new();
    let root_fiber = arena.allocate_current(Fiber::host_root());
    debug!(?container, ?config, "create root");

    let shared = Rc::new_cyclic(|this: &Weak<RootShared<H>>| {
        let this: Weak<dyn Scheduler> = this.clone();
        RootShared {
            state: RefCell::new(RootState {
                host,
                arena,
                last_commit: CommitStats::default(),
            }),
            container,
            root_fiber,
            root_queue: UpdateQueue::shared(),
            pending_lanes: Cell::new(NO_LANES),
            executing: Cell::new(false),
            poisoned: Cell::new(false),
            config,
            this,
        }
    });
    Root { shared }
}

impl<H: HostConfig> Root<H> {
    /// Render `element` into the container, replacing whatever the previous
    /// call rendered.
    ///
    /// Runs the render, the commit, and the resulting passive effects before
    /// returning. Called from inside a render or effect of this root, the
    /// update is queued and rendered right after the current pass instead.
    pub fn render(&self, element: impl Into<Child>) -> Result<()> {
        self.update_container(element.into())
    }

    /// Render nothing, running every cleanup and removing every host node.
    pub fn unmount(&self) -> Result<()> {
        self.update_container(Child::Empty)
    }

    fn update_container(&self, element: Child) -> Result<()> {
        let lane = request_update_lane();
        self.shared
            .root_queue
            .borrow_mut()
            .enqueue(create_update(Action::Replace(element), lane));
        self.shared
            .schedule_update_on_fiber(self.shared.root_fiber, lane)
    }

    /// The container this root renders into.
    pub fn container(&self) -> &H::Instance {
        &self.shared.container
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.shared.config
    }

    /// Whether a render, commit, or effect flush is in progress.
    pub fn is_rendering(&self) -> bool {
        self.shared.executing.get()
    }

    /// Whether a failed commit left the host tree out of step with the
    /// fibers. A poisoned root rejects every further render and update.
    pub fn is_poisoned(&self) -> bool {
        self.shared.poisoned.get()
    }

    /// Read access to the host adapter.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> Result<R> {
        let state = self
            .shared
            .state
            .try_borrow()
            .map_err(|_| ReconcileError::RootBusy { operation: "with_host" })?;
        Ok(f(&state.host))
    }

    /// Write access to the host adapter.
    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> Result<R> {
        let mut state = self
            .shared
            .state
            .try_borrow_mut()
            .map_err(|_| ReconcileError::RootBusy {
                operation: "with_host_mut",
            })?;
        Ok(f(&mut state.host))
    }

    /// Counters from the most recent successful commit.
    pub fn last_commit(&self) -> Result<CommitStats> {
        self.shared
            .state
            .try_borrow()
            .map(|state| state.last_commit)
            .map_err(|_| ReconcileError::RootBusy { operation: "last_commit" })
    }

    /// Number of live fibers, the root fiber included.
    pub fn fiber_count(&self) -> Result<usize> {
        self.shared
            .state
            .try_borrow()
            .map(|state| state.arena.len())
            .map_err(|_| ReconcileError::RootBusy { operation: "fiber_count" })
    }
}

// =============================================================================
// Work Driver
// =============================================================================

/// Marks the root as executing for as long as it is alive.
struct ExecutionGuard<'a>(&'a Cell<bool>);

impl<'a> ExecutionGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<H: HostConfig> Scheduler for RootShared<H> {
    fn schedule_update_on_fiber(&self, fiber: FiberId, lane: Lane) -> Result<()> {
        if self.poisoned.get() {
            return Err(ReconcileError::RootPoisoned);
        }

        // Liveness can only be checked while the tree is not borrowed; inside
        // a pass the fiber is either live or the update is harmless.
        if let Ok(state) = self.state.try_borrow() {
            if !state.arena.is_live(fiber) {
                warn!(?fiber, "update scheduled on an unmounted component; ignoring");
                return Ok(());
            }
        }

        self.pending_lanes
            .set(merge_lanes(self.pending_lanes.get(), lane));

        if self.executing.get() {
            debug!(?fiber, ?lane, "update deferred to the next pass");
            return Ok(());
        }
        self.perform_sync_work_on_root()
    }
}

impl<H: HostConfig> RootShared<H> {
    /// Run passes until no lane is pending.
    fn perform_sync_work_on_root(&self) -> Result<()> {
        let _guard = ExecutionGuard::enter(&self.executing);
        let limit = self.config.max_nested_updates;
        let mut passes = 0;

        loop {
            let lanes = self.pending_lanes.get();
            if lanes.is_empty() {
                return Ok(());
            }
            if passes >= limit {
                self.pending_lanes.set(NO_LANES);
                warn!(limit, "nested update limit reached; dropping pending lanes");
                return Err(ReconcileError::NestedUpdateLimit { limit });
            }
            passes += 1;

            let lane = get_highest_priority_lane(lanes);
            self.pending_lanes.set(lanes.difference(lane));

            let passive = self.render_and_commit(lane)?;
            passive.flush();
        }
    }

    fn render_and_commit(&self, lane: Lane) -> Result<PendingPassiveEffects> {
        let mut state = self
            .state
            .try_borrow_mut()
            .map_err(|_| ReconcileError::RootBusy { operation: "render" })?;
        let RootState {
            host,
            arena,
            last_commit,
        } = &mut *state;

        let mut pass = RenderPass {
            arena,
            host,
            config: &self.config,
            root_queue: &self.root_queue,
            scheduler: self.this.clone(),
            lane,
            rollback: Vec::new(),
            stats: CommitStats::default(),
        };

        let committed = render_root(&mut pass, self.root_fiber)
            .map_err(CommitFailure::from)
            .and_then(|finished| {
                commit_root(
                    &mut *pass.arena,
                    &mut *pass.host,
                    &self.container,
                    finished,
                    self.config.unmount_cleanup,
                    &mut pass.stats,
                )
            });

        match committed {
            Ok(passive) => {
                *last_commit = pass.stats;
                Ok(passive)
            }
            Err(CommitFailure { error: err, host_mutated }) => {
                pass.roll_back();
                let reclaimed = pass.arena.discard_work_in_progress();
                if host_mutated {
                    self.poisoned.set(true);
                    self.pending_lanes.set(NO_LANES);
                    error!(error = %err, reclaimed, "commit failed after host mutations; root poisoned");
                } else {
                    warn!(error = %err, reclaimed, "render pass aborted; committed tree kept");
                }
                Err(err)
            }
        }
    }
}
