//! Mutation walk, placement, and host updates.

use tracing::{trace, warn};

use crate::engine::arena::{Buffer, FiberArena};
use crate::engine::fiber::FiberId;
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::{FiberFlags, WorkTag};

use super::CommitPass;
use super::deletion::commit_deletion;

// =============================================================================
// Walk
// =============================================================================

/// Visit every fiber that may carry commit flags, children before parents.
///
/// Subtrees whose `subtree_flags` have nothing to commit are skipped.
pub(super) fn commit_mutation_effects<H: HostConfig>(pass: &mut CommitPass<'_, H>, finished: FiberId) -> Result<()> {
    let mut next = Some(finished);
    while let Some(fiber) = next {
        let wip = pass.arena.wip(fiber);
        let (child, subtree_flags) = (wip.child, wip.subtree_flags);
        next = match child {
            Some(child) if subtree_flags.intersects(FiberFlags::COMMIT_MASK) => Some(child),
            _ => commit_upward(pass, fiber)?,
        };
    }
    Ok(())
}

/// Commit `fiber` and climb until a sibling to descend into turns up.
fn commit_upward<H: HostConfig>(pass: &mut CommitPass<'_, H>, mut fiber: FiberId) -> Result<Option<FiberId>> {
    loop {
        commit_mutation_effects_on_fiber(pass, fiber)?;
        let wip = pass.arena.wip(fiber);
        if let Some(sibling) = wip.sibling {
            return Ok(Some(sibling));
        }
        match wip.parent {
            Some(parent) => fiber = parent,
            None => return Ok(None),
        }
    }
}

fn commit_mutation_effects_on_fiber<H: HostConfig>(pass: &mut CommitPass<'_, H>, fiber: FiberId) -> Result<()> {
    let flags = pass.arena.wip(fiber).flags;

    if flags.contains(FiberFlags::PLACEMENT) {
        commit_placement(pass, fiber)?;
        pass.arena.wip_mut(fiber).flags.remove(FiberFlags::PLACEMENT);
        pass.stats.placements += 1;
    }

    if flags.contains(FiberFlags::UPDATE) {
        commit_update(pass, fiber)?;
        pass.arena.wip_mut(fiber).flags.remove(FiberFlags::UPDATE);
        pass.stats.updates += 1;
    }

    if flags.contains(FiberFlags::CHILD_DELETION) {
        let deletions = std::mem::take(&mut pass.arena.wip_mut(fiber).deletions);
        for child in deletions {
            commit_deletion(pass, child)?;
        }
        pass.arena.wip_mut(fiber).flags.remove(FiberFlags::CHILD_DELETION);
    }

    if flags.contains(FiberFlags::PASSIVE_EFFECT) {
        let wip = pass.arena.wip(fiber);
        pass.passive
            .update
            .extend(wip.effects.iter().filter(|e| e.should_fire()).cloned());
        pass.arena.wip_mut(fiber).flags.remove(FiberFlags::PASSIVE_EFFECT);
    }

    Ok(())
}

// =============================================================================
// Update
// =============================================================================

fn commit_update<H: HostConfig>(pass: &mut CommitPass<'_, H>, fiber: FiberId) -> Result<()> {
    let wip = pass.arena.wip(fiber);
    let Some(instance) = wip.state_node.clone() else {
        return Ok(());
    };
    let new_props = wip.pending_props.clone();
    let old_props = pass
        .arena
        .current(fiber)
        .and_then(|current| current.memoized_props.clone());

    match wip.tag {
        WorkTag::HostText => {
            let old = old_props.as_ref().and_then(|p| p.as_text()).unwrap_or_default();
            let new = new_props.as_text().unwrap_or_default();
            trace!(?fiber, old, new, "commit text update");
            pass.host
                .commit_text_update(&instance, old, new)
                .map_err(|e| ReconcileError::host("commit_text_update", e))?;
            pass.host_mutated = true;
            Ok(())
        }
        WorkTag::HostComponent => {
            let (Some(old), Some(new)) = (old_props.as_ref().and_then(|p| p.as_host()), new_props.as_host()) else {
                return Ok(());
            };
            trace!(?fiber, "commit update");
            pass.host
                .commit_update(&instance, old, new)
                .map_err(|e| ReconcileError::host("commit_update", e))?;
            pass.host_mutated = true;
            Ok(())
        }
        WorkTag::HostRoot | WorkTag::FunctionComponent => Ok(()),
    }
}

// =============================================================================
// Placement
// =============================================================================

/// Host instance a fiber's host nodes attach to: the nearest host component
/// ancestor, or the container when the nearest host parent is the root.
pub(super) fn get_host_parent<H: HostConfig>(
    arena: &FiberArena<H::Instance>,
    container: &H::Instance,
    fiber: FiberId,
    buffer: Buffer,
) -> Option<H::Instance> {
    let mut parent = arena.get(fiber, buffer)?.parent;
    while let Some(id) = parent {
        let node = arena.get(id, buffer)?;
        match node.tag {
            WorkTag::HostComponent => return node.state_node.clone(),
            WorkTag::HostRoot => return Some(container.clone()),
            WorkTag::HostText | WorkTag::FunctionComponent => parent = node.parent,
        }
    }
    None
}

/// First host instance after `fiber` that is already in place.
///
/// Walks right through siblings, down into component subtrees, and up
/// through component parents, but never past a host parent. Candidates
/// that are themselves about to be placed are not stable anchors and are
/// skipped.
fn get_host_sibling<I: Clone>(arena: &FiberArena<I>, fiber: FiberId) -> Option<I> {
    let mut node = fiber;

    'find_sibling: loop {
        let sibling = loop {
            let current = arena.wip(node);
            if let Some(sibling) = current.sibling {
                break sibling;
            }
            match current.parent {
                Some(parent) if !arena.wip(parent).tag.is_host_parent() => node = parent,
                _ => return None,
            }
        };
        node = sibling;

        while !arena.wip(node).tag.is_host() {
            let current = arena.wip(node);
            if current.flags.contains(FiberFlags::PLACEMENT) {
                continue 'find_sibling;
            }
            match current.child {
                Some(child) => node = child,
                None => continue 'find_sibling,
            }
        }

        let candidate = arena.wip(node);
        if !candidate.flags.contains(FiberFlags::PLACEMENT) {
            return candidate.state_node.clone();
        }
    }
}

fn commit_placement<H: HostConfig>(pass: &mut CommitPass<'_, H>, fiber: FiberId) -> Result<()> {
    let Some(parent) = get_host_parent::<H>(pass.arena, pass.container, fiber, Buffer::WorkInProgress) else {
        warn!(?fiber, "no host parent found for placement");
        return Ok(());
    };
    let before = get_host_sibling(pass.arena, fiber);
    trace!(?fiber, ?parent, ?before, "placement");
    insert_or_append_placement_node(pass, fiber, &parent, before.as_ref())
}

/// Place the host nodes of `fiber`. A component places each of its
/// top-level host descendants, all before the same anchor.
fn insert_or_append_placement_node<H: HostConfig>(
    pass: &mut CommitPass<'_, H>,
    fiber: FiberId,
    parent: &H::Instance,
    before: Option<&H::Instance>,
) -> Result<()> {
    let wip = pass.arena.wip(fiber);
    if wip.tag.is_host() {
        let Some(instance) = wip.state_node.clone() else {
            return Ok(());
        };
        match before {
            Some(before) => pass
                .host
                .insert_before(parent, &instance, before)
                .map_err(|e| ReconcileError::host("insert_before", e))?,
            None => pass
                .host
                .append_child(parent, &instance)
                .map_err(|e| ReconcileError::host("append_child", e))?,
        }
        pass.host_mutated = true;
        return Ok(());
    }

    let mut child = wip.child;
    while let Some(id) = child {
        insert_or_append_placement_node(pass, id, parent, before)?;
        child = pass.arena.wip(id).sibling;
    }
    Ok(())
}
