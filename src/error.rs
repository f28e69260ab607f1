//! Error types for the reconciler.
//!
//! Three families of failure exist:
//! - developer-usage errors (hook order or type mismatch) that surface on the
//!   render where they happen
//! - render-pass failures (a component returned an error, the host adapter
//!   failed) that abort the pass and leave the committed tree in place
//! - scheduling errors (runaway nested updates, re-entrant root access)
//!
//! A host failure in the middle of a commit, after the host tree was already
//! touched, leaves host and fibers out of step. The root is poisoned and
//! refuses further work with [`ReconcileError::RootPoisoned`].
//!
//! Unsupported child shapes are not errors; the reconciler logs and falls back.

use std::error::Error as StdError;

/// Boxed error produced by a [`HostConfig`](crate::host::HostConfig) adapter.
pub type HostError = Box<dyn StdError + Send + Sync + 'static>;

/// Everything that can go wrong while rendering or committing.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The component called more hooks than on its previous render, or fewer.
    #[error(
        "component `{component}` rendered {actual} hooks but its previous render used {expected}; \
         hooks must be called in the same order on every render"
    )]
    HookMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The hook at a given position changed kind or state type between renders.
    #[error("component `{component}` hook #{position}: expected {expected}, found {found}")]
    HookTypeMismatch {
        component: &'static str,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A component's render function returned an error.
    #[error("component `{component}` failed to render: {message}")]
    Component {
        component: &'static str,
        message: String,
    },

    /// The host adapter failed while building or mutating the host tree.
    #[error("host operation `{operation}` failed: {source}")]
    Host {
        operation: &'static str,
        #[source]
        source: HostError,
    },

    /// Updates kept scheduling further passes from within a pass.
    #[error("exceeded {limit} nested render passes; an effect or render keeps scheduling updates")]
    NestedUpdateLimit { limit: usize },

    /// A root operation that needs exclusive access was called while the root was busy.
    #[error("root is busy with `{operation}`")]
    RootBusy { operation: &'static str },

    /// An earlier commit failed after mutating the host tree.
    #[error("root is poisoned: a previous commit failed partway through")]
    RootPoisoned,
}

impl ReconcileError {
    /// Build a component failure from any displayable error.
    pub fn component(component: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Component {
            component,
            message: message.to_string(),
        }
    }

    /// Wrap a host adapter failure for the named operation.
    pub fn host<E>(operation: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Host {
            operation,
            source: Box::new(source),
        }
    }

    /// True for errors caused by misuse of hooks.
    pub fn is_hook_error(&self) -> bool {
        matches!(self, Self::HookMismatch { .. } | Self::HookTypeMismatch { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
