//! Begin work - the top-down half of a unit of work.
//!
//! Computes a fiber's new children and reconciles them. Returns the first
//! child to descend into, or `None` when the fiber is a leaf.

use tracing::trace;

use crate::element::{Child, Props};
use crate::engine::fiber::{FiberId, MemoizedState};
use crate::engine::update_queue::process_update_queue;
use crate::error::Result;
use crate::hooks::Hooks;
use crate::host::HostConfig;
use crate::types::WorkTag;

use super::RenderPass;
use super::child_fibers::ChildReconciler;

pub(crate) fn begin_work<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<Option<FiberId>> {
    match pass.arena.wip(fiber).tag {
        WorkTag::HostRoot => update_host_root(pass, fiber),
        WorkTag::HostComponent => update_host_component(pass, fiber),
        WorkTag::HostText => Ok(None),
        WorkTag::FunctionComponent => update_function_component(pass, fiber),
    }
}

/// Replay the root's pending element updates and reconcile the result.
fn update_host_root<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<Option<FiberId>> {
    let base = match &pass.arena.wip(fiber).memoized_state {
        MemoizedState::Root(element) => element.clone(),
        _ => Child::Empty,
    };

    let batch = pass.root_queue.borrow_mut().take_pending();
    let next = process_update_queue(base, &batch, pass.lane);
    if !batch.is_empty() {
        let queue = pass.root_queue.clone();
        pass.rollback
            .push(Box::new(move || queue.borrow_mut().restore(batch)));
    }

    pass.arena.wip_mut(fiber).memoized_state = MemoizedState::Root(next.clone());
    reconcile_children(pass, fiber, &next);
    Ok(pass.arena.wip(fiber).child)
}

fn update_host_component<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<Option<FiberId>> {
    let props = pass.arena.wip(fiber).pending_props.clone();
    let empty = Child::Empty;
    let children = props.as_host().map_or(&empty, |p| &p.children);
    reconcile_children(pass, fiber, children);
    Ok(pass.arena.wip(fiber).child)
}

fn update_function_component<H: HostConfig>(
    pass: &mut RenderPass<'_, H>,
    fiber: FiberId,
) -> Result<Option<FiberId>> {
    let children = render_with_hooks(pass, fiber)?;
    reconcile_children(pass, fiber, &children);
    Ok(pass.arena.wip(fiber).child)
}

/// Invoke a component under a fresh hook context.
///
/// The hook list and effects are stored on the fiber even when rendering
/// fails, so the fiber never holds a half-built state.
fn render_with_hooks<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId) -> Result<Child> {
    let Props::Component(component) = pass.arena.wip(fiber).pending_props.clone() else {
        unreachable!("{fiber:?} is a function component without component props");
    };
    let previous = pass.arena.current(fiber).map(|current| current.hooks().to_vec());
    trace!(?fiber, component = component.name(), mount = previous.is_none(), "render component");

    let mut hooks = Hooks::new(
        fiber,
        component.name(),
        previous,
        pass.lane,
        pass.scheduler.clone(),
        &mut pass.rollback,
    );
    let rendered = component.render(&mut hooks);
    let (outcome, check) = hooks.finish();

    let wip = pass.arena.wip_mut(fiber);
    wip.memoized_state = MemoizedState::Hooks(outcome.hooks);
    wip.effects = outcome.effects;
    wip.flags |= outcome.flags;

    let children = rendered?;
    check?;
    Ok(children)
}

/// Reconcile `children` against the committed children of `fiber`.
pub(crate) fn reconcile_children<H: HostConfig>(pass: &mut RenderPass<'_, H>, fiber: FiberId, children: &Child) {
    let (track, current_first) = match pass.arena.current(fiber) {
        Some(current) => (true, current.child),
        None => (false, None),
    };
    let first = ChildReconciler::new(
        pass.arena,
        track,
        pass.config.warn_on_unsupported_children,
        &mut pass.stats,
    )
    .reconcile_child_fibers(fiber, current_first, children);
    pass.arena.wip_mut(fiber).child = first;
}
