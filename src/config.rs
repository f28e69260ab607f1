//! Reconciler configuration.
//!
//! Fixed per root at creation time via
//! [`create_root_with_config`](crate::create_root_with_config).

// =============================================================================
// Unmount Cleanup
// =============================================================================

/// When a deleted component's effect cleanups run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmountCleanup {
    /// During the deletion of its subtree, before the host removal call.
    #[default]
    BeforeHostRemoval,
    /// After the whole mutation pass, together with the other passive
    /// effects. Cleanups then observe the host tree already detached.
    Deferred,
}

// =============================================================================
// Reconciler Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Render passes one drive may run before giving up with
    /// [`ReconcileError::NestedUpdateLimit`](crate::ReconcileError::NestedUpdateLimit).
    pub max_nested_updates: usize,
    /// Log a warning (debug builds) when a child shape cannot be reconciled.
    pub warn_on_unsupported_children: bool,
    pub unmount_cleanup: UnmountCleanup,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_nested_updates: 50,
            warn_on_unsupported_children: true,
            unmount_cleanup: UnmountCleanup::default(),
        }
    }
}

impl ReconcilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nested pass limit. Clamped to at least one pass.
    pub fn with_max_nested_updates(mut self, limit: usize) -> Self {
        self.max_nested_updates = limit.max(1);
        self
    }

    pub fn with_warn_on_unsupported_children(mut self, warn: bool) -> Self {
        self.warn_on_unsupported_children = warn;
        self
    }

    pub fn with_unmount_cleanup(mut self, timing: UnmountCleanup) -> Self {
        self.unmount_cleanup = timing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.max_nested_updates, 50);
        assert!(config.warn_on_unsupported_children);
        assert_eq!(config.unmount_cleanup, UnmountCleanup::BeforeHostRemoval);
    }

    #[test]
    fn test_builder_clamps_limit() {
        let config = ReconcilerConfig::new()
            .with_max_nested_updates(0)
            .with_unmount_cleanup(UnmountCleanup::Deferred);
        assert_eq!(config.max_nested_updates, 1);
        assert_eq!(config.unmount_cleanup, UnmountCleanup::Deferred);
    }
}
