//! Work loop - drives one render pass over the whole tree.
//!
//! ```text
//! perform_unit_of_work(f):
//!     child = begin_work(f)
//!     child ? descend : complete f, then its siblings, climbing until a
//!                       sibling is found or the root completes
//! ```
//!
//! There is no time-slicing: the loop runs until the tree is complete or a
//! unit of work fails.

use tracing::{debug, trace};

use crate::element::Props;
use crate::engine::fiber::FiberId;
use crate::error::Result;
use crate::host::HostConfig;

use super::RenderPass;
use super::begin_work::begin_work;
use super::complete_work::complete_work;

/// Render the tree below committed root `root`. Returns the finished
/// work-in-progress root.
pub(crate) fn render_root<H: HostConfig>(pass: &mut RenderPass<'_, H>, root: FiberId) -> Result<FiberId> {
    debug!(lane = ?pass.lane, "render pass start");
    let wip_root = pass.arena.create_work_in_progress(root, Props::Root);

    let mut next = Some(wip_root);
    while let Some(fiber) = next {
        next = perform_unit_of_work(pass, fiber)?;
    }

    debug!(
        created = pass.stats.created,
        reused = pass.stats.reused,
        "render pass complete"
    );
    Ok(wip_root)
}

fn perform_unit_of_work<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<Option<FiberId>> {
    trace!(?fiber, tag = ?pass.arena.wip(fiber).tag, "begin");
    let next = begin_work(pass, fiber)?;

    let wip = pass.arena.wip_mut(fiber);
    wip.memoized_props = Some(wip.pending_props.clone());

    match next {
        Some(child) => Ok(Some(child)),
        None => complete_unit_of_work(pass, fiber),
    }
}

fn complete_unit_of_work<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<Option<FiberId>> {
    let mut node = fiber;
    loop {
        trace!(fiber = ?node, "complete");
        complete_work(pass, node)?;

        let wip = pass.arena.wip(node);
        if let Some(sibling) = wip.sibling {
            return Ok(Some(sibling));
        }
        match wip.parent {
            Some(parent) => node = parent,
            None => return Ok(None),
        }
    }
}
