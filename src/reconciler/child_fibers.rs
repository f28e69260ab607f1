//! Child reconciliation - the diff engine.
//!
//! Given the committed children of a fiber and the new child description,
//! produce the work-in-progress children, reusing committed fibers where
//! key and type allow and flagging what the commit phase must do.
//!
//! # Moves in lists
//!
//! Reused children keep their old index. Walking the new list left to right,
//! the largest old index seen so far (`last_placed_index`) is the rightmost
//! stable point. A reused child whose old index is smaller sits to the left
//! of something that stayed put, so it has to move:
//!
//! ```text
//! old: [A0, B1, C2]      new: [C, B, A]
//!
//! C  old 2 >= 0  stays, last_placed_index = 2
//! B  old 1 <  2  PLACEMENT
//! A  old 0 <  2  PLACEMENT
//! ```

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::commit::CommitStats;
use crate::element::{Child, Element, Key, Props};
use crate::engine::arena::FiberArena;
use crate::engine::fiber::{Fiber, FiberId};
use crate::types::{FiberFlags, WorkTag};

/// How a committed child is found again in a new list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ChildKey {
    Key(Key),
    Index(usize),
}

pub(crate) struct ChildReconciler<'r, I> {
    arena: &'r mut FiberArena<I>,
    /// False while mounting a subtree whose parent has no committed fiber.
    /// Nothing is placed or deleted individually then; the subtree is
    /// placed as a whole by its nearest tracked ancestor.
    track_side_effects: bool,
    warn_unsupported: bool,
    stats: &'r mut CommitStats,
}

impl<'r, I: Clone> ChildReconciler<'r, I> {
    pub fn new(
        arena: &'r mut FiberArena<I>,
        track_side_effects: bool,
        warn_unsupported: bool,
        stats: &'r mut CommitStats,
    ) -> Self {
        Self {
            arena,
            track_side_effects,
            warn_unsupported: warn_unsupported && cfg!(debug_assertions),
            stats,
        }
    }

    /// Reconcile `new_child` against the committed children starting at
    /// `current_first`. Returns the first work-in-progress child.
    pub fn reconcile_child_fibers(
        &mut self,
        parent: FiberId,
        current_first: Option<FiberId>,
        new_child: &Child,
    ) -> Option<FiberId> {
        match new_child {
            Child::Element(element) => {
                let fiber = self.reconcile_single_element(parent, current_first, element);
                Some(self.place_single_child(fiber))
            }
            Child::Text(content) => {
                let fiber = self.reconcile_single_text_node(parent, current_first, content);
                Some(self.place_single_child(fiber))
            }
            Child::List(children) => self.reconcile_children_array(parent, current_first, children),
            Child::Empty => {
                self.delete_remaining_children(parent, current_first);
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Fiber creation and reuse
    // -------------------------------------------------------------------------

    /// Reuse committed fiber `id` for new props.
    fn use_fiber(&mut self, id: FiberId, props: Props) -> FiberId {
        let wip = self.arena.create_work_in_progress(id, props);
        let fiber = self.arena.wip_mut(wip);
        fiber.index = 0;
        fiber.sibling = None;
        self.stats.reused += 1;
        wip
    }

    fn create_from_element(&mut self, element: &Element) -> FiberId {
        self.stats.created += 1;
        self.arena.allocate(Fiber::from_element(element))
    }

    fn create_text(&mut self, content: &Rc<str>) -> FiberId {
        self.stats.created += 1;
        self.arena.allocate(Fiber::text(content.clone()))
    }

    // -------------------------------------------------------------------------
    // Deletion bookkeeping
    // -------------------------------------------------------------------------

    fn delete_child(&mut self, parent: FiberId, child: FiberId) {
        if !self.track_side_effects {
            return;
        }
        let fiber = self.arena.wip_mut(parent);
        fiber.deletions.push(child);
        fiber.flags |= FiberFlags::CHILD_DELETION;
    }

    /// Delete `first` and every committed sibling after it.
    fn delete_remaining_children(&mut self, parent: FiberId, first: Option<FiberId>) {
        if !self.track_side_effects {
            return;
        }
        let mut current = first;
        while let Some(id) = current {
            self.delete_child(parent, id);
            current = self.arena.committed(id).sibling;
        }
    }

    // -------------------------------------------------------------------------
    // Single child
    // -------------------------------------------------------------------------

    fn reconcile_single_element(
        &mut self,
        parent: FiberId,
        current_first: Option<FiberId>,
        element: &Element,
    ) -> FiberId {
        let mut current = current_first;
        while let Some(id) = current {
            let fiber = self.arena.committed(id);
            let sibling = fiber.sibling;

            if fiber.key == element.key {
                if fiber.matches_type(element) {
                    let existing = self.use_fiber(id, element.props.clone());
                    self.arena.wip_mut(existing).parent = Some(parent);
                    self.delete_remaining_children(parent, sibling);
                    return existing;
                }
                // Same key, different type: nothing further can match.
                self.delete_remaining_children(parent, Some(id));
                break;
            }

            self.delete_child(parent, id);
            current = sibling;
        }

        let fiber = self.create_from_element(element);
        self.arena.wip_mut(fiber).parent = Some(parent);
        fiber
    }

    fn reconcile_single_text_node(
        &mut self,
        parent: FiberId,
        current_first: Option<FiberId>,
        content: &Rc<str>,
    ) -> FiberId {
        let mut current = current_first;
        while let Some(id) = current {
            let fiber = self.arena.committed(id);
            let sibling = fiber.sibling;

            if fiber.tag == WorkTag::HostText {
                let existing = self.use_fiber(id, Props::Text(content.clone()));
                self.arena.wip_mut(existing).parent = Some(parent);
                self.delete_remaining_children(parent, sibling);
                return existing;
            }

            self.delete_child(parent, id);
            current = sibling;
        }

        let fiber = self.create_text(content);
        self.arena.wip_mut(fiber).parent = Some(parent);
        fiber
    }

    /// Flag a freshly created single child for insertion.
    fn place_single_child(&mut self, id: FiberId) -> FiberId {
        if self.track_side_effects && self.arena.current(id).is_none() {
            self.arena.wip_mut(id).flags |= FiberFlags::PLACEMENT;
        }
        id
    }

    // -------------------------------------------------------------------------
    // Lists
    // -------------------------------------------------------------------------

    fn reconcile_children_array(
        &mut self,
        parent: FiberId,
        current_first: Option<FiberId>,
        children: &[Child],
    ) -> Option<FiberId> {
        // Committed children by key (or index). Only the first of a
        // duplicated key can be matched; the rest are left over. The sibling
        // order keeps leftover deletion deterministic.
        let mut existing: HashMap<ChildKey, FiberId> = HashMap::new();
        let mut old_order = Vec::new();
        let mut current = current_first;
        while let Some(id) = current {
            let fiber = self.arena.committed(id);
            let key = match &fiber.key {
                Some(key) => ChildKey::Key(key.clone()),
                None => ChildKey::Index(fiber.index),
            };
            existing.entry(key).or_insert(id);
            old_order.push(id);
            current = fiber.sibling;
        }
        let mut reused: HashSet<FiberId> = HashSet::new();

        let mut last_placed_index = 0;
        let mut first_new: Option<FiberId> = None;
        let mut last_new: Option<FiberId> = None;
        let mut seen_keys: HashSet<Key> = HashSet::new();

        for (index, child) in children.iter().enumerate() {
            if let Child::Element(Element { key: Some(key), .. }) = child {
                if !seen_keys.insert(key.clone()) && self.warn_unsupported {
                    warn!(key = &**key, "duplicate key among siblings; the later child is created fresh");
                }
            }

            let Some(new_fiber) = self.update_from_map(&mut existing, index, child) else {
                continue;
            };

            let fiber = self.arena.wip_mut(new_fiber);
            fiber.index = index;
            fiber.parent = Some(parent);

            match last_new {
                Some(last) => self.arena.wip_mut(last).sibling = Some(new_fiber),
                None => first_new = Some(new_fiber),
            }
            last_new = Some(new_fiber);

            if !self.track_side_effects {
                continue;
            }

            let old_index = self.arena.current(new_fiber).map(|c| c.index);
            if old_index.is_some() {
                reused.insert(new_fiber);
            }
            match old_index {
                Some(old_index) if old_index < last_placed_index => {
                    trace!(fiber = ?new_fiber, old_index, index, "move");
                    self.arena.wip_mut(new_fiber).flags |= FiberFlags::PLACEMENT;
                }
                Some(old_index) => last_placed_index = old_index,
                None => self.arena.wip_mut(new_fiber).flags |= FiberFlags::PLACEMENT,
            }
        }

        for id in old_order {
            if !reused.contains(&id) {
                self.delete_child(parent, id);
            }
        }

        first_new
    }

    /// Find a reusable committed fiber for `child` and consume it from the
    /// map, or create a new one.
    fn update_from_map(
        &mut self,
        existing: &mut HashMap<ChildKey, FiberId>,
        index: usize,
        child: &Child,
    ) -> Option<FiberId> {
        match child {
            Child::Text(content) => {
                let key = ChildKey::Index(index);
                if let Some(&before) = existing.get(&key) {
                    if self.arena.committed(before).tag == WorkTag::HostText {
                        existing.remove(&key);
                        return Some(self.use_fiber(before, Props::Text(content.clone())));
                    }
                }
                Some(self.create_text(content))
            }
            Child::Element(element) => {
                let key = match &element.key {
                    Some(key) => ChildKey::Key(key.clone()),
                    None => ChildKey::Index(index),
                };
                if let Some(&before) = existing.get(&key) {
                    if self.arena.committed(before).matches_type(element) {
                        existing.remove(&key);
                        return Some(self.use_fiber(before, element.props.clone()));
                    }
                }
                Some(self.create_from_element(element))
            }
            Child::List(_) => {
                if self.warn_unsupported {
                    warn!(index, "nested child lists are not supported; rendering nothing in their place");
                }
                None
            }
            Child::Empty => None,
        }
    }
}
