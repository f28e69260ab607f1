//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use spark_fiber::host::memory::{MemoryHost, MemoryHostError, NodeId};
use spark_fiber::{HostConfig, HostProps, Root, create_root};
use tracing_subscriber::EnvFilter;

/// Route reconciler logs to the test output. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn memory_root() -> (Root<MemoryHost>, NodeId) {
    init_tracing();
    let mut host = MemoryHost::new();
    let container = host.create_container();
    (create_root(host, container), container)
}

pub fn html(root: &Root<MemoryHost>) -> String {
    let container = *root.container();
    root.with_host(|host| host.to_html(container)).unwrap()
}

/// Names of the host operations issued since the last call.
pub fn op_names(root: &Root<MemoryHost>) -> Vec<&'static str> {
    root.with_host_mut(|host| host.take_journal())
        .unwrap()
        .iter()
        .map(|op| op.name())
        .collect()
}

/// Like [`op_names`], keeping only attach, move, and remove operations.
pub fn structural_ops(root: &Root<MemoryHost>) -> Vec<&'static str> {
    root.with_host_mut(|host| host.take_journal())
        .unwrap()
        .iter()
        .filter(|op| op.is_structural())
        .map(|op| op.name())
        .collect()
}

// =============================================================================
// Shared log
// =============================================================================

#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

// =============================================================================
// Logging host
// =============================================================================

/// A [`MemoryHost`] that also writes its removals to a shared [`Log`], so
/// tests can order them against effect cleanups.
pub struct LoggingHost {
    pub inner: MemoryHost,
    pub log: Log,
}

impl HostConfig for LoggingHost {
    type Instance = NodeId;
    type Error = MemoryHostError;

    fn create_instance(&mut self, tag: &str, props: &HostProps) -> Result<NodeId, MemoryHostError> {
        self.inner.create_instance(tag, props)
    }

    fn create_text_instance(&mut self, text: &str) -> Result<NodeId, MemoryHostError> {
        self.inner.create_text_instance(text)
    }

    fn append_initial_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.inner.append_initial_child(parent, child)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.inner.append_child(parent, child)
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, before: &NodeId) -> Result<(), MemoryHostError> {
        self.inner.insert_before(parent, child, before)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.log.push("remove_child");
        self.inner.remove_child(parent, child)
    }

    fn commit_update(&mut self, node: &NodeId, old: &HostProps, new: &HostProps) -> Result<(), MemoryHostError> {
        self.inner.commit_update(node, old, new)
    }

    fn commit_text_update(&mut self, node: &NodeId, old: &str, new: &str) -> Result<(), MemoryHostError> {
        self.inner.commit_text_update(node, old, new)
    }
}
