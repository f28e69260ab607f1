//! Subtree deletion.
//!
//! A deleted subtree still lives in the committed buffer. Walking it:
//!
//! - components hand their effects over for cleanup
//! - host nodes are recorded, but only the top-level ones (a host node
//!   inside another host node of the subtree leaves with its ancestor)
//! - every fiber is queued for reclamation
//!
//! Then each recorded host node gets one `remove_child` call.

use tracing::{debug, warn};

use crate::config::UnmountCleanup;
use crate::engine::arena::{Buffer, FiberArena};
use crate::engine::fiber::FiberId;
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::WorkTag;

use super::CommitPass;
use super::mutation::get_host_parent;

pub(super) fn commit_deletion<H: HostConfig>(pass: &mut CommitPass<'_, H>, child_to_delete: FiberId) -> Result<()> {
    let mut host_children: Vec<FiberId> = Vec::new();

    let subtree = nested_fibers(pass.arena, child_to_delete);
    for &fiber in &subtree {
        let node = pass.arena.committed(fiber);
        match node.tag {
            WorkTag::HostComponent | WorkTag::HostText => {
                if is_top_level_host(pass.arena, child_to_delete, fiber) {
                    host_children.push(fiber);
                }
            }
            WorkTag::FunctionComponent => {
                let effects = node.effects.clone();
                match pass.unmount_cleanup {
                    UnmountCleanup::BeforeHostRemoval => {
                        for effect in &effects {
                            effect.run_destroy();
                        }
                    }
                    UnmountCleanup::Deferred => pass.passive.unmount.extend(effects),
                }
            }
            WorkTag::HostRoot => {}
        }
    }

    if !host_children.is_empty() {
        match get_host_parent::<H>(pass.arena, pass.container, child_to_delete, Buffer::Current) {
            Some(parent) => {
                for fiber in &host_children {
                    let Some(instance) = pass.arena.committed(*fiber).state_node.clone() else {
                        continue;
                    };
                    pass.host
                        .remove_child(&parent, &instance)
                        .map_err(|e| ReconcileError::host("remove_child", e))?;
                    pass.host_mutated = true;
                    pass.stats.host_removals += 1;
                }
            }
            None => warn!(fiber = ?child_to_delete, "no host parent found for deletion"),
        }
    }

    debug!(fiber = ?child_to_delete, fibers = subtree.len(), "deleted subtree");
    pass.stats.deletions += 1;
    pass.released.extend(subtree);
    Ok(())
}

/// Every fiber of the committed subtree at `root`, parents before children.
fn nested_fibers<I>(arena: &FiberArena<I>, root: FiberId) -> Vec<FiberId> {
    let mut out = Vec::new();
    let mut node = root;
    loop {
        out.push(node);
        if let Some(child) = arena.committed(node).child {
            node = child;
            continue;
        }
        if node == root {
            return out;
        }
        loop {
            let current = arena.committed(node);
            if let Some(sibling) = current.sibling {
                node = sibling;
                break;
            }
            match current.parent {
                Some(parent) if parent != root => node = parent,
                _ => return out,
            }
        }
    }
}

/// Whether host fiber `fiber` has no host ancestor inside the subtree at
/// `root`. Only those need their own `remove_child` call.
fn is_top_level_host<I>(arena: &FiberArena<I>, root: FiberId, fiber: FiberId) -> bool {
    let mut node = fiber;
    while node != root {
        let Some(parent) = arena.committed(node).parent else {
            return true;
        };
        if arena.committed(parent).tag.is_host() {
            return false;
        }
        node = parent;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use crate::engine::fiber::Fiber;

    /// Link `children` under `parent` in the committed buffer.
    fn link(arena: &mut FiberArena<u32>, parent: FiberId, children: &[FiberId]) {
        arena.committed_mut(parent).child = children.first().copied();
        for (i, &child) in children.iter().enumerate() {
            let fiber = arena.committed_mut(child);
            fiber.parent = Some(parent);
            fiber.sibling = children.get(i + 1).copied();
        }
    }

    fn node(arena: &mut FiberArena<u32>, tag: WorkTag) -> FiberId {
        arena.allocate_current(Fiber::new(tag, Props::Root, None))
    }

    #[test]
    fn test_top_level_hosts_through_components() {
        // App > [Inner > div1 > span, div2]
        let mut arena = FiberArena::new();
        let app = node(&mut arena, WorkTag::FunctionComponent);
        let inner = node(&mut arena, WorkTag::FunctionComponent);
        let div1 = node(&mut arena, WorkTag::HostComponent);
        let span = node(&mut arena, WorkTag::HostComponent);
        let div2 = node(&mut arena, WorkTag::HostComponent);
        link(&mut arena, app, &[inner, div2]);
        link(&mut arena, inner, &[div1]);
        link(&mut arena, div1, &[span]);

        let order = nested_fibers(&arena, app);
        assert_eq!(order, vec![app, inner, div1, span, div2]);

        let top: Vec<_> = order
            .iter()
            .copied()
            .filter(|&f| arena.committed(f).tag.is_host() && is_top_level_host(&arena, app, f))
            .collect();
        assert_eq!(top, vec![div1, div2]);
    }

    #[test]
    fn test_host_root_of_deletion_is_top_level() {
        let mut arena = FiberArena::new();
        let div = node(&mut arena, WorkTag::HostComponent);
        let text = node(&mut arena, WorkTag::HostText);
        link(&mut arena, div, &[text]);

        assert!(is_top_level_host(&arena, div, div));
        assert!(!is_top_level_host(&arena, div, text));
        assert_eq!(nested_fibers(&arena, div), vec![div, text]);
    }
}
