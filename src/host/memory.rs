//! In-memory host.
//!
//! Keeps a real node tree and a journal of every operation the reconciler
//! issued, which makes it the natural host for tests and demos:
//!
//! ```
//! use spark_fiber::host::memory::{HostOp, MemoryHost};
//! use spark_fiber::{create_root, Element};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! let root = create_root(host, container);
//!
//! root.render(Element::host("div").child("a")).unwrap();
//! let html = root.with_host(|host| host.to_html(container)).unwrap();
//! assert_eq!(html, "<div>a</div>");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::element::{AttrValue, HostProps};

use super::HostConfig;

// =============================================================================
// Nodes
// =============================================================================

/// Handle to a node in a [`MemoryHost`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Container,
    Element {
        tag: String,
        attrs: BTreeMap<String, AttrValue>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// =============================================================================
// Journal
// =============================================================================

/// One operation issued against the host, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateInstance { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    AppendInitialChild { parent: NodeId, child: NodeId },
    AppendChild { parent: NodeId, child: NodeId },
    InsertBefore { parent: NodeId, child: NodeId, before: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    CommitUpdate { node: NodeId },
    CommitTextUpdate { node: NodeId, text: String },
}

impl HostOp {
    /// The operation's name, matching the [`HostConfig`] method.
    pub fn name(&self) -> &'static str {
        match self {
            HostOp::CreateInstance { .. } => "create_instance",
            HostOp::CreateText { .. } => "create_text_instance",
            HostOp::AppendInitialChild { .. } => "append_initial_child",
            HostOp::AppendChild { .. } => "append_child",
            HostOp::InsertBefore { .. } => "insert_before",
            HostOp::RemoveChild { .. } => "remove_child",
            HostOp::CommitUpdate { .. } => "commit_update",
            HostOp::CommitTextUpdate { .. } => "commit_text_update",
        }
    }

    /// Whether the operation changes attached structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HostOp::AppendChild { .. } | HostOp::InsertBefore { .. } | HostOp::RemoveChild { .. }
        )
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MemoryHostError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("{0:?} cannot have children")]
    NotAParent(NodeId),

    #[error("injected failure in {operation}")]
    Injected { operation: &'static str },
}

// =============================================================================
// Host
// =============================================================================

/// An in-memory host tree with an operation journal.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<Node>,
    journal: Vec<HostOp>,
    fail_on: Option<&'static str>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root container node.
    pub fn create_container(&mut self) -> NodeId {
        self.push(NodeKind::Container)
    }

    /// Every operation issued so far.
    pub fn journal(&self) -> &[HostOp] {
        &self.journal
    }

    /// Take the journal, leaving it empty.
    pub fn take_journal(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.journal)
    }

    /// Make the next call of the named operation fail.
    pub fn fail_next(&mut self, operation: &'static str) {
        self.fail_on = Some(operation);
    }

    /// Node kind, if `node` exists.
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    /// Children of `node`, in order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node.0).map_or(&[], |n| &n.children)
    }

    /// Parent of `node`, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    /// Total number of nodes ever created, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Serialize the children of `node` as markup.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else { return };
        match &n.kind {
            NodeKind::Container => {
                for &child in &n.children {
                    self.write_html(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for &child in &n.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn check(&mut self, operation: &'static str) -> Result<(), MemoryHostError> {
        if self.fail_on == Some(operation) {
            self.fail_on = None;
            return Err(MemoryHostError::Injected { operation });
        }
        Ok(())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, MemoryHostError> {
        self.nodes.get_mut(node.0).ok_or(MemoryHostError::UnknownNode(node))
    }

    fn ensure_parent(&self, node: NodeId) -> Result<(), MemoryHostError> {
        match self.kind(node) {
            None => Err(MemoryHostError::UnknownNode(node)),
            Some(NodeKind::Text(_)) => Err(MemoryHostError::NotAParent(node)),
            Some(_) => Ok(()),
        }
    }

    /// Detach `child` from wherever it currently is.
    fn detach(&mut self, child: NodeId) -> Result<(), MemoryHostError> {
        if let Some(old) = self.node_mut(child)?.parent.take() {
            self.node_mut(old)?.children.retain(|&c| c != child);
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> Result<(), MemoryHostError> {
        self.ensure_parent(parent)?;
        self.node_mut(child)?;
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let position = match before {
            Some(anchor) => siblings
                .iter()
                .position(|&c| c == anchor)
                .ok_or(MemoryHostError::NotAChild { parent, child: anchor })?,
            None => siblings.len(),
        };
        siblings.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn record(&mut self, op: HostOp) {
        trace!(?op, "host op");
        self.journal.push(op);
    }
}

impl HostConfig for MemoryHost {
    type Instance = NodeId;
    type Error = MemoryHostError;

    fn create_instance(&mut self, tag: &str, props: &HostProps) -> Result<NodeId, MemoryHostError> {
        self.check("create_instance")?;
        let node = self.push(NodeKind::Element {
            tag: tag.to_string(),
            attrs: props.attrs.clone(),
        });
        self.record(HostOp::CreateInstance {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text_instance(&mut self, text: &str) -> Result<NodeId, MemoryHostError> {
        self.check("create_text_instance")?;
        let node = self.push(NodeKind::Text(text.to_string()));
        self.record(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        Ok(node)
    }

    fn append_initial_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.check("append_initial_child")?;
        self.attach(*parent, *child, None)?;
        self.record(HostOp::AppendInitialChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.check("append_child")?;
        self.attach(*parent, *child, None)?;
        self.record(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, before: &NodeId) -> Result<(), MemoryHostError> {
        self.check("insert_before")?;
        self.attach(*parent, *child, Some(*before))?;
        self.record(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), MemoryHostError> {
        self.check("remove_child")?;
        if self.parent(*child) != Some(*parent) {
            return Err(MemoryHostError::NotAChild {
                parent: *parent,
                child: *child,
            });
        }
        self.detach(*child)?;
        self.record(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn commit_update(&mut self, node: &NodeId, _old: &HostProps, new: &HostProps) -> Result<(), MemoryHostError> {
        self.check("commit_update")?;
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(*node)?.kind {
            *attrs = new.attrs.clone();
        }
        self.record(HostOp::CommitUpdate { node: *node });
        Ok(())
    }

    fn commit_text_update(&mut self, node: &NodeId, _old: &str, new: &str) -> Result<(), MemoryHostError> {
        self.check("commit_text_update")?;
        if let NodeKind::Text(text) = &mut self.node_mut(*node)?.kind {
            *text = new.to_string();
        }
        self.record(HostOp::CommitTextUpdate {
            node: *node,
            text: new.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(host: &mut MemoryHost, tag: &str) -> NodeId {
        host.create_instance(tag, &HostProps::default()).unwrap()
    }

    #[test]
    fn test_insert_before_and_append_move() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = element(&mut host, "a");
        let b = element(&mut host, "b");
        let c = element(&mut host, "c");

        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &b).unwrap();
        host.insert_before(&root, &c, &a).unwrap();
        assert_eq!(host.children(root), &[c, a, b]);

        // Re-appending an attached node moves it
        host.append_child(&root, &c).unwrap();
        assert_eq!(host.children(root), &[a, b, c]);
        assert_eq!(host.to_html(root), "<a></a><b></b><c></c>");
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = element(&mut host, "a");

        assert!(matches!(
            host.remove_child(&root, &a),
            Err(MemoryHostError::NotAChild { .. })
        ));
        host.append_child(&root, &a).unwrap();
        host.remove_child(&root, &a).unwrap();
        assert!(host.children(root).is_empty());
        assert_eq!(host.parent(a), None);
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut host = MemoryHost::new();
        let text = host.create_text_instance("x").unwrap();
        let a = element(&mut host, "a");
        assert!(matches!(
            host.append_child(&text, &a),
            Err(MemoryHostError::NotAParent(_))
        ));
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let mut host = MemoryHost::new();
        host.fail_next("create_text_instance");
        assert!(matches!(
            host.create_text_instance("x"),
            Err(MemoryHostError::Injected {
                operation: "create_text_instance"
            })
        ));
        assert!(host.create_text_instance("x").is_ok());
    }

    #[test]
    fn test_updates_and_journal() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let text = host.create_text_instance("old").unwrap();
        host.append_child(&root, &text).unwrap();
        host.commit_text_update(&text, "old", "new").unwrap();

        assert_eq!(host.to_html(root), "new");
        let names: Vec<_> = host.take_journal().iter().map(HostOp::name).collect();
        assert_eq!(names, ["create_text_instance", "append_child", "commit_text_update"]);
        assert!(host.journal().is_empty());
    }
}
