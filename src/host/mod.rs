//! Host adapter - the boundary between the reconciler and whatever actually
//! displays the tree.
//!
//! The reconciler never touches host nodes directly. During completion it
//! asks the host to create instances and to assemble freshly created
//! subtrees; during commit it attaches, moves, updates, and removes them.
//!
//! ```text
//! render phase                     commit phase
//! ------------                     ------------
//! create_instance                  append_child / insert_before
//! create_text_instance             remove_child
//! append_initial_child             commit_update / commit_text_update
//! ```
//!
//! Every operation is fallible. A failure aborts the render pass and is
//! returned as [`ReconcileError::Host`](crate::ReconcileError::Host).

pub mod memory;

use std::error::Error as StdError;
use std::fmt::Debug;

use crate::element::HostProps;

/// Operations the reconciler needs from a host environment.
///
/// `Instance` is a cheap handle to a host node (an index, an `Rc`, ...).
/// The container passed to [`create_root`](crate::create_root) is an
/// `Instance` too.
pub trait HostConfig: 'static {
    type Instance: Clone + Debug + 'static;
    type Error: StdError + Send + Sync + 'static;

    /// Create a detached element node with the given attributes.
    fn create_instance(&mut self, tag: &str, props: &HostProps) -> Result<Self::Instance, Self::Error>;

    /// Create a detached text node.
    fn create_text_instance(&mut self, text: &str) -> Result<Self::Instance, Self::Error>;

    /// Append a child while assembling a subtree that is not attached yet.
    fn append_initial_child(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
    ) -> Result<(), Self::Error>;

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached somewhere.
    fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance) -> Result<(), Self::Error>;

    /// Insert `child` before `before` under `parent`, moving it if it is
    /// already attached somewhere.
    fn insert_before(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        before: &Self::Instance,
    ) -> Result<(), Self::Error>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance) -> Result<(), Self::Error>;

    /// Apply changed attributes to an element node.
    fn commit_update(
        &mut self,
        instance: &Self::Instance,
        old_props: &HostProps,
        new_props: &HostProps,
    ) -> Result<(), Self::Error>;

    /// Replace the content of a text node.
    fn commit_text_update(
        &mut self,
        instance: &Self::Instance,
        old_text: &str,
        new_text: &str,
    ) -> Result<(), Self::Error>;
}
