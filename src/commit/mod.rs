//! Commit phase - apply a finished render to the host.
//!
//! ```text
//! commit_root(finished)
//!   ├─ mutation walk (post-order, only into subtrees with commit flags)
//!   │    PLACEMENT       insert_before / append_child
//!   │    UPDATE          commit_update / commit_text_update
//!   │    CHILD_DELETION  cleanups, remove_child per top-level host node
//!   │    PASSIVE_EFFECT  collect effects that must run
//!   ├─ swap buffers: the finished tree becomes current
//!   └─ reclaim deleted fibers
//! ```
//!
//! The collected passive effects are returned to the caller, which flushes
//! them once the root is no longer borrowed. A failed commit reports whether
//! any host call had already succeeded; past that point the host tree no
//! longer matches either fiber tree.

mod deletion;
mod mutation;
mod passive;

pub(crate) use passive::PendingPassiveEffects;

use tracing::debug;

use crate::config::UnmountCleanup;
use crate::engine::arena::FiberArena;
use crate::engine::fiber::FiberId;
use crate::error::ReconcileError;
use crate::host::HostConfig;
use crate::types::FiberFlags;

// =============================================================================
// Stats
// =============================================================================

/// Counters for one render and commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Fibers created fresh by the render.
    pub created: usize,
    /// Committed fibers reused by the render.
    pub reused: usize,
    /// Placements applied (inserts and moves).
    pub placements: usize,
    /// Host updates applied.
    pub updates: usize,
    /// Subtrees deleted.
    pub deletions: usize,
    /// `remove_child` calls issued.
    pub host_removals: usize,
}

// =============================================================================
// Commit Pass
// =============================================================================

pub(crate) struct CommitPass<'a, H: HostConfig> {
    pub arena: &'a mut FiberArena<H::Instance>,
    pub host: &'a mut H,
    pub container: &'a H::Instance,
    pub unmount_cleanup: UnmountCleanup,
    pub passive: PendingPassiveEffects,
    /// Fibers of deleted subtrees, reclaimed once the commit succeeds.
    pub released: Vec<FiberId>,
    pub stats: &'a mut CommitStats,
    /// Set once any host mutation has been applied.
    pub host_mutated: bool,
}

/// Why a commit stopped.
#[derive(Debug)]
pub(crate) struct CommitFailure {
    pub error: ReconcileError,
    /// The host tree was changed before the failure.
    pub host_mutated: bool,
}

impl From<ReconcileError> for CommitFailure {
    fn from(error: ReconcileError) -> Self {
        Self {
            error,
            host_mutated: false,
        }
    }
}

/// Commit the finished work-in-progress tree rooted at `finished`.
///
/// On error the buffers are not swapped and nothing is reclaimed.
pub(crate) fn commit_root<H: HostConfig>(
    arena: &mut FiberArena<H::Instance>,
    host: &mut H,
    container: &H::Instance,
    finished: FiberId,
    unmount_cleanup: UnmountCleanup,
    stats: &mut CommitStats,
) -> Result<PendingPassiveEffects, CommitFailure> {
    let root = arena.wip(finished);
    let pending = root.flags | root.subtree_flags;

    let mut pass = CommitPass {
        arena,
        host,
        container,
        unmount_cleanup,
        passive: PendingPassiveEffects::default(),
        released: Vec::new(),
        stats,
        host_mutated: false,
    };

    if pending.intersects(FiberFlags::COMMIT_MASK) {
        if let Err(error) = mutation::commit_mutation_effects(&mut pass, finished) {
            return Err(CommitFailure {
                error,
                host_mutated: pass.host_mutated,
            });
        }
    } else {
        debug!("commit without mutations");
    }

    let CommitPass {
        arena,
        passive,
        released,
        stats,
        ..
    } = pass;

    arena.swap_buffers();
    for fiber in &released {
        arena.release(*fiber);
    }

    debug!(
        placements = stats.placements,
        updates = stats.updates,
        deletions = stats.deletions,
        reclaimed = released.len(),
        live = arena.len(),
        "commit complete"
    );
    Ok(passive)
}
