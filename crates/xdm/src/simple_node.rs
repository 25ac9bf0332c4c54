//! Simple in-memory tree implementing [`XdmNode`], used in tests and by
//! callers that need a quick node source.
//!
//! - Builder API for concise tree construction
//! - Document order from ancestry and sibling order
//! - Thread-safe (`Arc` + `RwLock`)
//! - Trees can be marked transient; [`SimpleStore`] copies them into
//!   persistent trees
//!
//! ```
//! use quarry_xdm::simple_node::{attr, doc, elem, text};
//! use quarry_xdm::XdmNode;
//!
//! // <root id="r"><child>Hello</child></root>
//! let document = doc()
//!     .child(elem("root").attr(attr("id", "r")).child(elem("child").child(text("Hello"))))
//!     .build();
//! let root = document.children()[0].clone();
//! assert_eq!(root.name().unwrap().local, "root");
//! assert_eq!(root.string_value(), "Hello");
//! ```

use crate::atomic::QNameValue;
use crate::error::Error;
use crate::node::{NodeKind, NodeStore, XdmNode};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    name: Option<QNameValue>,
    value: Option<String>,
    persistent: bool,
    parent: RwLock<Option<Weak<Inner>>>,
    attributes: RwLock<Vec<SimpleNode>>,
    namespaces: RwLock<Vec<SimpleNode>>,
    children: RwLock<Vec<SimpleNode>>,
    cached_text: RwLock<Option<String>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// An `Arc`-backed node; clones share identity.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SimpleNode {}

impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("value", &self.0.value)
            .finish_non_exhaustive()
    }
}

fn local_name(name: &str) -> Option<QNameValue> {
    Some(QNameValue::local(name))
}

impl SimpleNode {
    fn new(kind: NodeKind, name: Option<QNameValue>, value: Option<String>, persistent: bool) -> Self {
        SimpleNode(Arc::new(Inner {
            kind,
            name,
            value,
            persistent,
            parent: RwLock::new(None),
            attributes: RwLock::new(Vec::new()),
            namespaces: RwLock::new(Vec::new()),
            children: RwLock::new(Vec::new()),
            cached_text: RwLock::new(None),
        }))
    }

    pub fn document() -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Document, None, None)
    }

    pub fn element(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder::new(NodeKind::Element, local_name(name), None)
    }

    pub fn attribute(name: &str, value: &str) -> SimpleNode {
        SimpleNode::new(NodeKind::Attribute, local_name(name), Some(value.to_string()), true)
    }

    pub fn text(value: &str) -> SimpleNode {
        SimpleNode::new(NodeKind::Text, None, Some(value.to_string()), true)
    }

    pub fn comment(value: &str) -> SimpleNode {
        SimpleNode::new(NodeKind::Comment, None, Some(value.to_string()), true)
    }

    pub fn pi(target: &str, data: &str) -> SimpleNode {
        SimpleNode::new(
            NodeKind::ProcessingInstruction,
            local_name(target),
            Some(data.to_string()),
            true,
        )
    }

    pub fn namespace(prefix: &str, uri: &str) -> SimpleNode {
        SimpleNode::new(
            NodeKind::Namespace,
            Some(QNameValue::new(Some(prefix), None, prefix)),
            Some(uri.to_string()),
            true,
        )
    }

    /// Resolves `prefix` on this node or its nearest ancestor declaring it.
    pub fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        let mut cur = Some(self.clone());
        while let Some(n) = cur {
            for ns in n.namespaces() {
                if ns.0.name.as_ref().and_then(|q| q.prefix.as_deref()) == Some(prefix) {
                    return ns.0.value.clone();
                }
            }
            cur = n.parent();
        }
        None
    }

    /// Resolves a lexical QName against the namespaces in scope here.
    pub fn resolve_qname(&self, lexical: &str) -> Result<QNameValue, Error> {
        QNameValue::resolve(lexical, |prefix| self.lookup_namespace_uri(prefix))
    }

    pub fn root(&self) -> SimpleNode {
        let mut n = self.clone();
        while let Some(p) = n.parent() {
            n = p;
        }
        n
    }

    /// Copy of the subtree rooted here; the copy is persistent.
    fn deep_copy(&self) -> SimpleNode {
        let copy = SimpleNode::new(self.0.kind, self.0.name.clone(), self.0.value.clone(), true);
        let adopt = |list: &RwLock<Vec<SimpleNode>>, into: &RwLock<Vec<SimpleNode>>| {
            let copies: Vec<SimpleNode> = read(list).iter().map(SimpleNode::deep_copy).collect();
            for c in &copies {
                *write(&c.0.parent) = Some(Arc::downgrade(&copy.0));
            }
            write(into).extend(copies);
        };
        adopt(&self.0.attributes, &copy.0.attributes);
        adopt(&self.0.namespaces, &copy.0.namespaces);
        adopt(&self.0.children, &copy.0.children);
        copy
    }

    /// Position of this node under its parent: (group, index) where group 0
    /// is attributes, 1 namespaces, 2 children.
    fn slot(&self) -> Option<(u8, usize)> {
        let parent = self.parent()?;
        let groups = [parent.attributes(), parent.namespaces(), parent.children()];
        groups.iter().zip(0u8..).find_map(|(list, g)| {
            list.iter().position(|n| n == self).map(|i| (g, i))
        })
    }

    fn at_slot(&self, (group, index): (u8, usize)) -> Option<SimpleNode> {
        let list = match group {
            0 => self.attributes(),
            1 => self.namespaces(),
            _ => self.children(),
        };
        list.get(index).cloned()
    }
}

pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<QNameValue>,
    value: Option<String>,
    persistent: bool,
    pending_children: Vec<SimpleNode>,
    pending_attrs: Vec<SimpleNode>,
    pending_ns: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<QNameValue>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            persistent: true,
            pending_children: Vec::new(),
            pending_attrs: Vec::new(),
            pending_ns: Vec::new(),
        }
    }

    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        self.pending_children.push(child.into().into_node());
        self
    }

    pub fn children<I: IntoIterator<Item = SimpleNodeOrBuilder>>(mut self, it: I) -> Self {
        self.pending_children
            .extend(it.into_iter().map(SimpleNodeOrBuilder::into_node));
        self
    }

    pub fn attr(mut self, attr: SimpleNode) -> Self {
        debug_assert!(attr.kind() == NodeKind::Attribute);
        self.pending_attrs.push(attr);
        self
    }

    pub fn namespace(mut self, ns: SimpleNode) -> Self {
        debug_assert!(ns.kind() == NodeKind::Namespace);
        self.pending_ns.push(ns);
        self
    }

    /// Marks the tree being built as constructed during evaluation.
    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    pub fn build(self) -> SimpleNode {
        let node = SimpleNode::new(self.kind, self.name, self.value, self.persistent);
        let link = |list: Vec<SimpleNode>, into: &RwLock<Vec<SimpleNode>>| {
            for n in &list {
                *write(&n.0.parent) = Some(Arc::downgrade(&node.0));
            }
            write(into).extend(list);
        };
        link(self.pending_attrs, &node.0.attributes);
        link(self.pending_ns, &node.0.namespaces);
        link(self.pending_children, &node.0.children);
        node
    }
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl SimpleNodeOrBuilder {
    fn into_node(self) -> SimpleNode {
        match self {
            SimpleNodeOrBuilder::Built(n) => n,
            SimpleNodeOrBuilder::Builder(b) => b.build(),
        }
    }
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(n: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(n)
    }
}

impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(b: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(b)
    }
}

pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNode::element(name)
}

pub fn text(v: &str) -> SimpleNode {
    SimpleNode::text(v)
}

pub fn attr(name: &str, v: &str) -> SimpleNode {
    SimpleNode::attribute(name, v)
}

pub fn comment(v: &str) -> SimpleNode {
    SimpleNode::comment(v)
}

pub fn ns(prefix: &str, uri: &str) -> SimpleNode {
    SimpleNode::namespace(prefix, uri)
}

pub fn doc() -> SimpleNodeBuilder {
    SimpleNode::document()
}

impl XdmNode for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<QNameValue> {
        self.0.name.clone()
    }

    fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Element | NodeKind::Document => {
                if let Some(cached) = read(&self.0.cached_text).clone() {
                    return cached;
                }
                fn dfs(n: &SimpleNode, out: &mut String) {
                    if n.0.kind == NodeKind::Text
                        && let Some(v) = &n.0.value
                    {
                        out.push_str(v);
                    }
                    for c in n.children() {
                        dfs(&c, out);
                    }
                }
                let mut out = String::new();
                dfs(self, &mut out);
                *write(&self.0.cached_text) = Some(out.clone());
                out
            }
            _ => self.0.value.clone().unwrap_or_default(),
        }
    }

    fn parent(&self) -> Option<Self> {
        read(&self.0.parent)
            .as_ref()
            .and_then(Weak::upgrade)
            .map(SimpleNode)
    }

    fn children(&self) -> Vec<Self> {
        read(&self.0.children).clone()
    }

    fn attributes(&self) -> Vec<Self> {
        read(&self.0.attributes).clone()
    }

    fn namespaces(&self) -> Vec<Self> {
        read(&self.0.namespaces).clone()
    }

    fn is_persistent(&self) -> bool {
        self.root().0.persistent
    }
}

/// Node store over [`SimpleNode`] trees. Each transient tree is copied once;
/// later requests for nodes of the same tree resolve into that copy.
#[derive(Debug, Default)]
pub struct SimpleStore {
    copies: RwLock<HashMap<SimpleNode, SimpleNode>>,
}

impl SimpleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transient trees copied so far.
    pub fn materialized_trees(&self) -> usize {
        read(&self.copies).len()
    }
}

impl NodeStore<SimpleNode> for SimpleStore {
    fn materialize_node(&self, node: &SimpleNode) -> Result<SimpleNode, Error> {
        if node.is_persistent() {
            return Ok(node.clone());
        }
        let root = node.root();
        let copy_root = {
            let cached = read(&self.copies).get(&root).cloned();
            match cached {
                Some(c) => c,
                None => {
                    let c = root.deep_copy();
                    tracing::debug!(kind = ?root.kind(), "materialized transient tree");
                    write(&self.copies).insert(root.clone(), c.clone());
                    c
                }
            }
        };
        let mut path = Vec::new();
        let mut cur = node.clone();
        while let Some(slot) = cur.slot() {
            path.push(slot);
            cur = cur
                .parent()
                .ok_or_else(|| Error::internal("node lost its parent during materialization"))?;
        }
        path.iter().rev().try_fold(copy_root, |n, slot| {
            n.at_slot(*slot)
                .ok_or_else(|| Error::internal("materialized tree does not mirror its source"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_precede_children() {
        let r = elem("r").attr(attr("a", "1")).child(elem("c")).build();
        let a = r.attributes()[0].clone();
        let c = r.children()[0].clone();
        assert_eq!(a.compare_document_order(&c).unwrap(), core::cmp::Ordering::Less);
    }

    #[test]
    fn namespace_lookup_walks_ancestors() {
        let d = doc()
            .child(elem("root").namespace(ns("p", "urn:one")).child(elem("inner")))
            .build();
        let inner = d.children()[0].children()[0].clone();
        assert_eq!(inner.lookup_namespace_uri("p").as_deref(), Some("urn:one"));
        assert_eq!(inner.lookup_namespace_uri("q"), None);
        assert_eq!(inner.resolve_qname("p:x").unwrap().to_eqname(), "Q{urn:one}x");
        assert!(inner.resolve_qname("q:x").is_err());
    }

    #[test]
    fn store_copies_a_transient_tree_once() {
        let t = elem("t").child(elem("a")).child(elem("b")).transient().build();
        let b = t.children()[1].clone();
        assert!(!b.is_persistent());
        let store = SimpleStore::new();
        let mb = store.materialize_node(&b).unwrap();
        let mt = store.materialize_node(&t).unwrap();
        assert!(mb.is_persistent());
        assert_eq!(mb.name().unwrap().local, "b");
        assert_eq!(mb.parent().unwrap(), mt);
        assert_eq!(store.materialized_trees(), 1);
    }
}
