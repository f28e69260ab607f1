//! Fiber - one unit of work and of persistent tree state.
//!
//! Fibers live in a [`FiberArena`](super::arena::FiberArena) and link to each
//! other by [`FiberId`]:
//!
//! ```text
//! HostRoot
//!   └─ child ─> App ─ sibling ─> (none)
//!                └─ child ─> div
//!                             └─ child ─> "a" ─ sibling ─> span
//! ```
//!
//! `parent` points back up (the "return" fiber), `child` to the first child,
//! `sibling` to the next sibling. `index` is the position among siblings and
//! is what keyless list diffing matches on.

use std::fmt;
use std::rc::Rc;

use crate::element::{Child, Element, ElementType, Key, Props};
use crate::hooks::{Effect, Hook};
use crate::types::{FiberFlags, WorkTag};

// =============================================================================
// Fiber Id
// =============================================================================

/// Stable handle to a fiber slot.
///
/// The same id names a node in both the current and the work-in-progress
/// tree. The generation makes ids of reclaimed slots go stale instead of
/// aliasing whatever reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiberId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fiber({}v{})", self.index, self.generation)
    }
}

// =============================================================================
// Memoized State
// =============================================================================

/// Per-kind state kept across renders.
#[derive(Clone, Default)]
pub(crate) enum MemoizedState {
    #[default]
    None,
    /// The element tree the root last rendered.
    Root(Child),
    /// The hook list of a component, in call order.
    Hooks(Vec<Hook>),
}

// =============================================================================
// Fiber
// =============================================================================

pub(crate) struct Fiber<I> {
    pub tag: WorkTag,
    /// Host tag or component identity. `None` for root and text.
    pub element_type: Option<ElementType>,
    pub key: Option<Key>,

    pub pending_props: Props,
    pub memoized_props: Option<Props>,
    pub memoized_state: MemoizedState,
    /// Effects scheduled by the component's latest render, in call order.
    pub effects: Vec<Rc<Effect>>,

    /// Host instance for host fibers.
    pub state_node: Option<I>,

    pub flags: FiberFlags,
    pub subtree_flags: FiberFlags,
    pub deletions: Vec<FiberId>,

    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    pub index: usize,
}

impl<I> Fiber<I> {
    pub fn new(tag: WorkTag, pending_props: Props, key: Option<Key>) -> Self {
        Self {
            tag,
            element_type: None,
            key,
            pending_props,
            memoized_props: None,
            memoized_state: MemoizedState::None,
            effects: Vec::new(),
            state_node: None,
            flags: FiberFlags::empty(),
            subtree_flags: FiberFlags::empty(),
            deletions: Vec::new(),
            parent: None,
            child: None,
            sibling: None,
            index: 0,
        }
    }

    /// The root fiber of a fresh tree.
    pub fn host_root() -> Self {
        let mut fiber = Self::new(WorkTag::HostRoot, Props::Root, None);
        fiber.memoized_state = MemoizedState::Root(Child::Empty);
        fiber
    }

    /// A text fiber.
    pub fn text(content: Rc<str>) -> Self {
        Self::new(WorkTag::HostText, Props::Text(content), None)
    }

    /// A fiber for `element`.
    pub fn from_element(element: &Element) -> Self {
        let tag = match element.element_type {
            ElementType::Host(_) => WorkTag::HostComponent,
            ElementType::Component(_) => WorkTag::FunctionComponent,
        };
        let mut fiber = Self::new(tag, element.props.clone(), element.key.clone());
        fiber.element_type = Some(element.element_type.clone());
        fiber
    }

    /// Build the work-in-progress counterpart of this (current) fiber.
    ///
    /// Structure is rebuilt by the render pass, so links, flags, deletions,
    /// and the effect list start empty. Components rebuild their hook list
    /// from the current fiber, so only the root carries state across.
    pub fn clone_for_work(&self, pending_props: Props) -> Self
    where
        I: Clone,
    {
        let memoized_state = match (&self.tag, &self.memoized_state) {
            (WorkTag::HostRoot, state) => state.clone(),
            _ => MemoizedState::None,
        };
        Self {
            tag: self.tag,
            element_type: self.element_type.clone(),
            key: self.key.clone(),
            pending_props,
            memoized_props: self.memoized_props.clone(),
            memoized_state,
            effects: Vec::new(),
            state_node: self.state_node.clone(),
            flags: FiberFlags::empty(),
            subtree_flags: FiberFlags::empty(),
            deletions: Vec::new(),
            parent: None,
            child: None,
            sibling: None,
            index: self.index,
        }
    }

    /// Hooks from the latest render, empty for anything but components.
    pub fn hooks(&self) -> &[Hook] {
        match &self.memoized_state {
            MemoizedState::Hooks(hooks) => hooks,
            _ => &[],
        }
    }

    /// Whether this fiber can be reused for `element`.
    pub fn matches_type(&self, element: &Element) -> bool {
        self.element_type.as_ref() == Some(&element.element_type)
    }
}

impl<I> fmt::Debug for Fiber<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("tag", &self.tag)
            .field("type", &self.element_type)
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("subtree_flags", &self.subtree_flags)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
