//! Render phase.
//!
//! One render pass builds the work-in-progress tree from the root down
//! (`begin_work`) and finishes nodes from the leaves up (`complete_work`),
//! driven by a single loop in `work_loop`. Nothing here touches attached
//! host nodes. Completion creates detached host instances and the commit
//! phase attaches them.

pub(crate) mod begin_work;
pub(crate) mod child_fibers;
pub(crate) mod complete_work;
pub(crate) mod work_loop;

use std::rc::Weak;

use crate::commit::CommitStats;
use crate::config::ReconcilerConfig;
use crate::element::Child;
use crate::engine::arena::FiberArena;
use crate::engine::lanes::Lane;
use crate::engine::update_queue::SharedQueue;
use crate::hooks::Rollback;
use crate::host::HostConfig;
use crate::root::Scheduler;

/// Everything one render pass works with.
pub(crate) struct RenderPass<'a, H: HostConfig> {
    pub arena: &'a mut FiberArena<H::Instance>,
    pub host: &'a mut H,
    pub config: &'a ReconcilerConfig,
    pub root_queue: &'a SharedQueue<Child>,
    pub scheduler: Weak<dyn Scheduler>,
    pub lane: Lane,
    /// Undo log for drained update batches, replayed if the pass aborts.
    pub rollback: Vec<Rollback>,
    pub stats: CommitStats,
}

impl<H: HostConfig> RenderPass<'_, H> {
    /// Put every drained update batch back, newest first.
    pub fn roll_back(&mut self) {
        while let Some(undo) = self.rollback.pop() {
            undo();
        }
    }
}
