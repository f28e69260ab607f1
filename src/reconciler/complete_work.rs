//! Complete work - the bottom-up half of a unit of work.
//!
//! Host fibers that are new get their detached host instance here, with all
//! completed host descendants already appended. Host fibers that were
//! committed before only get an `UPDATE` flag when their props changed.
//! Every fiber ORs its children's flags into its own `subtree_flags`.

use tracing::trace;

use crate::element::{ElementType, HostProps};
use crate::engine::arena::FiberArena;
use crate::engine::fiber::FiberId;
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::{FiberFlags, WorkTag};

use super::RenderPass;

pub(crate) fn complete_work<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<()> {
    let wip = pass.arena.wip(fiber);
    match wip.tag {
        WorkTag::HostComponent => {
            if pass.arena.current(fiber).is_some() && wip.state_node.is_some() {
                mark_update_if_changed(pass.arena, fiber);
            } else {
                let tag = match &wip.element_type {
                    Some(ElementType::Host(tag)) => tag.clone(),
                    other => unreachable!("{fiber:?} is a host component with type {other:?}"),
                };
                let props = wip.pending_props.clone();
                let empty = HostProps::default();
                let instance = pass
                    .host
                    .create_instance(&tag, props.as_host().unwrap_or(&empty))
                    .map_err(|e| ReconcileError::host("create_instance", e))?;
                trace!(?fiber, %tag, ?instance, "created instance");
                append_all_children(pass, &instance, fiber)?;
                pass.arena.wip_mut(fiber).state_node = Some(instance);
            }
        }
        WorkTag::HostText => {
            if pass.arena.current(fiber).is_some() && wip.state_node.is_some() {
                mark_update_if_changed(pass.arena, fiber);
            } else {
                let props = wip.pending_props.clone();
                let instance = pass
                    .host
                    .create_text_instance(props.as_text().unwrap_or_default())
                    .map_err(|e| ReconcileError::host("create_text_instance", e))?;
                pass.arena.wip_mut(fiber).state_node = Some(instance);
            }
        }
        WorkTag::HostRoot | WorkTag::FunctionComponent => {}
    }

    bubble_properties(pass.arena, fiber);
    Ok(())
}

fn mark_update_if_changed<I>(arena: &mut FiberArena<I>, fiber: FiberId) {
    let changed = match arena.current(fiber).and_then(|c| c.memoized_props.as_ref()) {
        Some(old) => old.host_changed(&arena.wip(fiber).pending_props),
        None => true,
    };
    if changed {
        arena.wip_mut(fiber).flags |= FiberFlags::UPDATE;
    }
}

/// Append the top-level host descendants of `fiber` to `parent`.
///
/// Component fibers are transparent: the walk descends through them to the
/// host nodes they rendered, but never below a host node.
fn append_all_children<H: HostConfig>(
    pass: &mut RenderPass<'_, H>,
    parent: &H::Instance,
    fiber: FiberId,
) -> Result<()> {
    let mut node = pass.arena.wip(fiber).child;

    while let Some(id) = node {
        let current = pass.arena.wip(id);
        if current.tag.is_host() {
            if let Some(child) = current.state_node.clone() {
                pass.host
                    .append_initial_child(parent, &child)
                    .map_err(|e| ReconcileError::host("append_initial_child", e))?;
            }
        } else if let Some(child) = current.child {
            node = Some(child);
            continue;
        }

        if id == fiber {
            return Ok(());
        }

        let mut up = id;
        loop {
            let f = pass.arena.wip(up);
            if let Some(sibling) = f.sibling {
                node = Some(sibling);
                break;
            }
            match f.parent {
                Some(next) if next != fiber => up = next,
                _ => return Ok(()),
            }
        }
    }
    Ok(())
}

/// Collect children's flags into `subtree_flags` and fix their parent link.
fn bubble_properties<I>(arena: &mut FiberArena<I>, fiber: FiberId) {
    let mut subtree = FiberFlags::empty();
    let mut child = arena.wip(fiber).child;
    while let Some(id) = child {
        let c = arena.wip_mut(id);
        subtree |= c.subtree_flags | c.flags;
        c.parent = Some(fiber);
        child = c.sibling;
    }
    arena.wip_mut(fiber).subtree_flags |= subtree;
}
