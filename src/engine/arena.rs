//! Fiber arena - slot allocation and the two tree buffers.
//!
//! Every fiber slot has two buffers. One belongs to the committed ("current")
//! tree, the other to the tree being rendered ("work in progress"). Which is
//! which is a single arena-wide bit that flips when a render commits:
//!
//! ```text
//!            buffer 0        buffer 1
//! slot 0     root (cur)      root (wip)
//! slot 1     App  (cur)      App  (wip)      <- reused: both buffers
//! slot 2     div  (cur)      -               <- deleted this pass
//! slot 3     -               span (wip)      <- created this pass
//!
//! commit: current = 1 - current; slot 2 reclaimed
//! ```
//!
//! A fiber's alternate is simply the other buffer of its slot. Reclaimed
//! slots go to a free pool and are handed out again with a bumped
//! generation, so stale [`FiberId`]s never resolve.

use super::fiber::{Fiber, FiberId};

// =============================================================================
// Buffers
// =============================================================================

/// Which tree to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Buffer {
    Current,
    WorkInProgress,
}

struct Slot<I> {
    generation: u32,
    occupied: bool,
    buffers: [Option<Fiber<I>>; 2],
}

impl<I> Slot<I> {
    fn vacant() -> Self {
        Self {
            generation: 0,
            occupied: false,
            buffers: [None, None],
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

pub(crate) struct FiberArena<I> {
    slots: Vec<Slot<I>>,
    /// Pool of reclaimed slot indices for reuse.
    free: Vec<u32>,
    /// Buffer index holding the committed tree.
    current: usize,
}

impl<I> FiberArena<I> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            current: 0,
        }
    }

    #[inline]
    fn buffer_index(&self, buffer: Buffer) -> usize {
        match buffer {
            Buffer::Current => self.current,
            Buffer::WorkInProgress => 1 - self.current,
        }
    }

    fn slot(&self, id: FiberId) -> Option<&Slot<I>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.occupied && slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: FiberId) -> Option<&mut Slot<I>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.occupied && slot.generation == id.generation)
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    /// Allocate a slot for a brand-new fiber in the work-in-progress tree.
    ///
    /// Reuses a reclaimed slot if one is available.
    pub fn allocate(&mut self, fiber: Fiber<I>) -> FiberId {
        let wip = self.buffer_index(Buffer::WorkInProgress);
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::vacant());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.occupied = true;
        slot.buffers[wip] = Some(fiber);
        FiberId {
            index,
            generation: slot.generation,
        }
    }

    /// Allocate a fiber directly into the current tree (the initial root).
    pub fn allocate_current(&mut self, fiber: Fiber<I>) -> FiberId {
        let id = self.allocate(fiber);
        let (cur, wip) = (self.current, 1 - self.current);
        let slot = &mut self.slots[id.index as usize];
        slot.buffers[cur] = slot.buffers[wip].take();
        id
    }

    /// Reclaim a slot. Both buffers are dropped and the id goes stale.
    pub fn release(&mut self, id: FiberId) {
        let Some(slot) = self.slot_mut(id) else { return };
        slot.buffers = [None, None];
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Whether `id` still names a live slot.
    pub fn is_live(&self, id: FiberId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn get(&self, id: FiberId, buffer: Buffer) -> Option<&Fiber<I>> {
        let index = self.buffer_index(buffer);
        self.slot(id).and_then(|slot| slot.buffers[index].as_ref())
    }

    pub fn get_mut(&mut self, id: FiberId, buffer: Buffer) -> Option<&mut Fiber<I>> {
        let index = self.buffer_index(buffer);
        self.slot_mut(id).and_then(|slot| slot.buffers[index].as_mut())
    }

    /// The committed counterpart of `id`, if it has one.
    #[inline]
    pub fn current(&self, id: FiberId) -> Option<&Fiber<I>> {
        self.get(id, Buffer::Current)
    }

    /// The work-in-progress fiber. Panics if `id` has none, which means the
    /// render pass lost track of its own tree.
    #[track_caller]
    pub fn wip(&self, id: FiberId) -> &Fiber<I> {
        match self.get(id, Buffer::WorkInProgress) {
            Some(fiber) => fiber,
            None => panic!("{id:?} has no work-in-progress fiber"),
        }
    }

    #[track_caller]
    pub fn wip_mut(&mut self, id: FiberId) -> &mut Fiber<I> {
        match self.get_mut(id, Buffer::WorkInProgress) {
            Some(fiber) => fiber,
            None => panic!("{id:?} has no work-in-progress fiber"),
        }
    }

    /// The committed fiber. Panics if `id` has none.
    #[track_caller]
    pub fn committed(&self, id: FiberId) -> &Fiber<I> {
        match self.get(id, Buffer::Current) {
            Some(fiber) => fiber,
            None => panic!("{id:?} has no committed fiber"),
        }
    }

    #[track_caller]
    pub fn committed_mut(&mut self, id: FiberId) -> &mut Fiber<I> {
        match self.get_mut(id, Buffer::Current) {
            Some(fiber) => fiber,
            None => panic!("{id:?} has no committed fiber"),
        }
    }

    // -------------------------------------------------------------------------
    // Dual tree
    // -------------------------------------------------------------------------

    /// Write the work-in-progress counterpart of committed fiber `id`.
    pub fn create_work_in_progress(&mut self, id: FiberId, pending_props: crate::element::Props) -> FiberId
    where
        I: Clone,
    {
        let wip = self.committed(id).clone_for_work(pending_props);
        let index = self.buffer_index(Buffer::WorkInProgress);
        if let Some(slot) = self.slot_mut(id) {
            slot.buffers[index] = Some(wip);
        }
        id
    }

    /// Make the work-in-progress tree the current one.
    pub fn swap_buffers(&mut self) {
        self.current = 1 - self.current;
    }

    /// Throw away the work-in-progress tree of an aborted pass.
    ///
    /// Fibers that only existed in that tree are reclaimed. Returns how many.
    pub fn discard_work_in_progress(&mut self) -> usize {
        let (cur, wip) = (self.current, 1 - self.current);
        let mut orphans = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.occupied {
                continue;
            }
            slot.buffers[wip] = None;
            if slot.buffers[cur].is_none() {
                orphans.push(FiberId {
                    index: index as u32,
                    generation: slot.generation,
                });
            }
        }
        let count = orphans.len();
        for id in orphans {
            self.release(id);
        }
        count
    }

    /// Every fiber in the subtree rooted at `root` within `buffer`, root first.
    #[cfg(test)]
    pub fn collect_subtree(&self, root: FiberId, buffer: Buffer) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.get(id, buffer) else { continue };
            out.push(id);
            if let Some(sibling) = fiber.sibling.filter(|_| id != root) {
                stack.push(sibling);
            }
            if let Some(child) = fiber.child {
                stack.push(child);
            }
        }
        out
    }
}

impl<I> Default for FiberArena<I> {
    fn default() -> Self {
        Self::new()
    }
}
