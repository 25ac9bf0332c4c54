//! The node side of the data model: the trait tree adapters implement, the
//! store that turns transient nodes into persistent ones, and the
//! document-ordered node collection.

use crate::atomic::{AtomicValue, QNameValue};
use crate::error::{Error, ErrorCode, ErrorKind};
use crate::types::XdmType;
use core::cmp::Ordering;
use core::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

impl NodeKind {
    pub fn xdm_type(self) -> XdmType {
        match self {
            NodeKind::Document => XdmType::Document,
            NodeKind::Element => XdmType::Element,
            NodeKind::Attribute => XdmType::Attribute,
            NodeKind::Text => XdmType::Text,
            NodeKind::Comment => XdmType::Comment,
            NodeKind::ProcessingInstruction => XdmType::ProcessingInstruction,
            NodeKind::Namespace => XdmType::Namespace,
        }
    }
}

/// Fallback comparator for document order based on ancestry and stable
/// sibling order.
///
/// - An ancestor precedes its descendants.
/// - Among siblings, attributes come first, then namespaces, then children;
///   within each group the adapter's order is kept.
/// - Nodes under different roots have no fallback order and yield
///   `err:FOER0000`. Adapters holding several trees override
///   [`XdmNode::compare_document_order`].
pub fn try_compare_by_ancestry<N: XdmNode>(a: &N, b: &N) -> Result<Ordering, Error> {
    if a == b {
        return Ok(Ordering::Equal);
    }
    fn path_to_root<N: XdmNode>(mut n: N) -> Vec<N> {
        let mut p = vec![n.clone()];
        while let Some(parent) = n.parent() {
            p.push(parent.clone());
            n = parent;
        }
        p.reverse();
        p
    }
    let pa = path_to_root(a.clone());
    let pb = path_to_root(b.clone());
    let len = pa.len().min(pb.len());
    let i = pa.iter().zip(&pb).take_while(|(x, y)| x == y).count();
    if i == len {
        return Ok(pa.len().cmp(&pb.len()));
    }
    if i == 0 {
        return Err(Error::new(
            ErrorKind::Comparison,
            ErrorCode::FOER0000,
            "document order is undefined for nodes from different trees",
        ));
    }
    let parent = &pa[i - 1];
    let siblings: Vec<N> = parent
        .attributes()
        .into_iter()
        .chain(parent.namespaces())
        .chain(parent.children())
        .collect();
    let pos = |n: &N| siblings.iter().position(|s| s == n);
    Ok(match (pos(&pa[i]), pos(&pb[i])) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    })
}

/// A node handle supplied by a tree adapter. Equality and hashing are node
/// identity.
pub trait XdmNode: Clone + Eq + Hash + core::fmt::Debug + Send + Sync {
    fn kind(&self) -> NodeKind;
    fn name(&self) -> Option<QNameValue>;
    fn string_value(&self) -> String;

    /// Atomized value. Untyped trees yield `xs:untypedAtomic`; comments,
    /// processing instructions and namespace nodes yield `xs:string`.
    fn typed_value(&self) -> Vec<AtomicValue> {
        let s = self.string_value();
        vec![match self.kind() {
            NodeKind::Comment | NodeKind::ProcessingInstruction | NodeKind::Namespace => {
                AtomicValue::string(s)
            }
            _ => AtomicValue::untyped(s),
        }]
    }

    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Vec<Self>;
    fn attributes(&self) -> Vec<Self>;
    fn namespaces(&self) -> Vec<Self> {
        Vec::new()
    }

    /// Transient nodes (built during evaluation) must pass through a
    /// [`NodeStore`] before they can join a node collection.
    fn is_persistent(&self) -> bool {
        true
    }

    fn compare_document_order(&self, other: &Self) -> Result<Ordering, Error> {
        try_compare_by_ancestry(self, other)
    }
}

/// Storage layer behind a tree adapter.
pub trait NodeStore<N: XdmNode> {
    /// Returns a persistent equivalent of `node`.
    fn materialize_node(&self, node: &N) -> Result<N, Error>;

    fn node_order(&self, a: &N, b: &N) -> Result<Ordering, Error> {
        a.compare_document_order(b)
    }
}

/// Nodes in document order without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCollection<N> {
    nodes: Vec<N>,
}

impl<N> Default for NodeCollection<N> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<N: XdmNode> NodeCollection<N> {
    /// Sorts `nodes` with `order` and drops duplicates.
    pub fn from_nodes(
        mut nodes: Vec<N>,
        mut order: impl FnMut(&N, &N) -> Result<Ordering, Error>,
    ) -> Result<Self, Error> {
        let mut failure = None;
        nodes.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            order(a, b).unwrap_or_else(|e| {
                failure = Some(e);
                Ordering::Equal
            })
        });
        if let Some(e) = failure {
            return Err(e);
        }
        nodes.dedup();
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&N> {
        self.nodes.get(index)
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, N> {
        self.nodes.iter()
    }

    pub fn into_vec(self) -> Vec<N> {
        self.nodes
    }
}

impl<N> IntoIterator for NodeCollection<N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a, N> IntoIterator for &'a NodeCollection<N> {
    type Item = &'a N;
    type IntoIter = core::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
