//! Core types for spark-fiber.
//!
//! Work tags and the flag sets that flow from the render phase into the
//! commit phase. Everything here is `Copy` and cheap to compare.

// =============================================================================
// Work Tags
// =============================================================================

/// What kind of unit of work a fiber is.
///
/// Matching on this is always exhaustive; begin, complete, and commit each
/// handle every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkTag {
    /// A stateful function-style component.
    FunctionComponent = 0,
    /// The root of a tree, bound to a host container.
    HostRoot = 3,
    /// A host element such as `div`.
    HostComponent = 5,
    /// A host text node.
    HostText = 6,
}

impl WorkTag {
    /// True for tags that own a host instance.
    #[inline]
    pub fn is_host(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostText)
    }

    /// True for tags that can act as the parent of a host instance.
    #[inline]
    pub fn is_host_parent(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostRoot)
    }
}

// =============================================================================
// Fiber Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Side effects recorded on a fiber during render and applied during commit.
    ///
    /// Combine with bitwise OR: `FiberFlags::PLACEMENT | FiberFlags::UPDATE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FiberFlags: u8 {
        /// Insert or move the fiber's host nodes.
        const PLACEMENT = 1 << 0;
        /// Host props or text changed.
        const UPDATE = 1 << 1;
        /// One or more children are queued in `deletions`.
        const CHILD_DELETION = 1 << 2;
        /// The component scheduled passive effects this render.
        const PASSIVE_EFFECT = 1 << 3;

        /// Flags applied by the mutation pass.
        const MUTATION_MASK = Self::PLACEMENT.bits()
            | Self::UPDATE.bits()
            | Self::CHILD_DELETION.bits();
        /// Flags that require passive-effect work (deletions carry cleanups).
        const PASSIVE_MASK = Self::PASSIVE_EFFECT.bits() | Self::CHILD_DELETION.bits();
        /// Everything the commit walk has to visit.
        const COMMIT_MASK = Self::MUTATION_MASK.bits() | Self::PASSIVE_MASK.bits();
    }
}

// =============================================================================
// Hook Effect Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Tags on an effect record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HookFlags: u8 {
        /// The effect must run (its deps changed, or it is new).
        const HAS_EFFECT = 1 << 0;
        /// Runs after commit.
        const PASSIVE = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks() {
        assert!(FiberFlags::MUTATION_MASK.contains(FiberFlags::PLACEMENT));
        assert!(!FiberFlags::MUTATION_MASK.contains(FiberFlags::PASSIVE_EFFECT));
        assert!(FiberFlags::COMMIT_MASK.contains(FiberFlags::PASSIVE_EFFECT));
        assert!(FiberFlags::PASSIVE_MASK.contains(FiberFlags::CHILD_DELETION));
    }

    #[test]
    fn test_host_tags() {
        assert!(WorkTag::HostText.is_host());
        assert!(!WorkTag::HostRoot.is_host());
        assert!(WorkTag::HostRoot.is_host_parent());
        assert!(!WorkTag::FunctionComponent.is_host_parent());
    }
}
