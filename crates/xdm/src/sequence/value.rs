use super::{
    Cardinality, Sequence, SequenceState, SubSequence, XdmItem, frozen_error, widen,
};
use crate::error::{Error, ErrorCode};
use crate::node::{NodeCollection, NodeStore, XdmNode};
use crate::types::XdmType;
use core::cmp::Ordering;
use std::collections::HashSet;

/// The general-purpose sequence.
#[derive(Debug, Clone)]
pub struct ValueSequence<N> {
    items: Vec<XdmItem<N>>,
    item_type: Option<XdmType>,
    node_only: bool,
    normalized: bool,
    keep_unordered: bool,
    state: SequenceState,
}

impl<N> Default for ValueSequence<N> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            item_type: None,
            node_only: true,
            normalized: true,
            keep_unordered: false,
            state: SequenceState::Building,
        }
    }
}

impl<N: XdmNode> ValueSequence<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = XdmItem<N>>) -> Result<Self, Error> {
        let mut seq = Self::new();
        seq.add_all(items)?;
        Ok(seq)
    }

    pub fn singleton(item: XdmItem<N>) -> Result<Self, Error> {
        Self::from_items([item])
    }

    /// Nodes of `collection`, already in document order.
    pub fn from_node_collection(collection: NodeCollection<N>) -> Self {
        let mut seq = Self::new();
        for node in collection {
            seq.item_type = widen(seq.item_type, node.kind().xdm_type()).ok();
            seq.items.push(XdmItem::Node(node));
        }
        seq.normalized = true;
        seq
    }

    /// With `true`, reading removes duplicate nodes but keeps insertion order.
    pub fn keep_unordered(&mut self, keep: bool) {
        if self.keep_unordered != keep {
            self.keep_unordered = keep;
            self.normalized = self.items.len() < 2;
        }
    }

    /// Leaves the items untouched when document order cannot be decided.
    fn normalize(&mut self) -> Result<(), Error> {
        if self.normalized {
            return Ok(());
        }
        if self.node_only {
            let before = self.items.len();
            if self.keep_unordered {
                let mut seen = HashSet::with_capacity(before);
                self.items.retain(|item| match item {
                    XdmItem::Node(n) => seen.insert(n.clone()),
                    XdmItem::Atomic(_) => true,
                });
            } else {
                let mut failure = None;
                let mut order: Vec<usize> = (0..before).collect();
                order.sort_by(|&a, &b| {
                    if failure.is_some() {
                        return Ordering::Equal;
                    }
                    match (&self.items[a], &self.items[b]) {
                        (XdmItem::Node(x), XdmItem::Node(y)) => {
                            x.compare_document_order(y).unwrap_or_else(|e| {
                                failure = Some(e);
                                Ordering::Equal
                            })
                        }
                        _ => Ordering::Equal,
                    }
                });
                if let Some(e) = failure {
                    return Err(e);
                }
                let mut slots: Vec<Option<XdmItem<N>>> = self.items.drain(..).map(Some).collect();
                self.items = order.into_iter().filter_map(|i| slots[i].take()).collect();
                self.items.dedup();
            }
            tracing::trace!(before, after = self.items.len(), "normalized node sequence");
        }
        self.normalized = true;
        Ok(())
    }

    /// Window of `len` items starting at zero-based `start`, in reading order.
    /// Out-of-range bounds are clipped.
    pub fn subsequence(&mut self, start: usize, len: Option<usize>) -> Result<SubSequence<'_, N>, Error> {
        let items = self.iterate()?.as_slice();
        let start = start.min(items.len());
        let end = len.map_or(items.len(), |l| start.saturating_add(l).min(items.len()));
        SubSequence::new(&items[start..end])
    }

    /// Converts to a document-ordered node collection. Every item must be a
    /// node; transient nodes are materialized through `store` and replaced
    /// in this sequence. On error the sequence is left as it was.
    pub fn to_node_collection<S: NodeStore<N>>(&mut self, store: &S) -> Result<NodeCollection<N>, Error> {
        if let Some(item) = self.items.iter().find(|i| !i.is_node()) {
            return Err(Error::type_error(
                ErrorCode::XPTY0004,
                "a node collection can only hold nodes",
            )
            .with_operand(item.item_type(), item.string_value()));
        }
        let nodes = self
            .items
            .iter()
            .filter_map(XdmItem::as_node)
            .map(|n| if n.is_persistent() { Ok(n.clone()) } else { store.materialize_node(n) })
            .collect::<Result<Vec<_>, Error>>()?;
        let collection = NodeCollection::from_nodes(nodes.clone(), |a, b| store.node_order(a, b))?;
        for (item, node) in self.items.iter_mut().zip(nodes) {
            *item = XdmItem::Node(node);
        }
        Ok(collection)
    }

    /// Consumes the sequence, yielding its items in reading order.
    pub fn into_items(mut self) -> Result<Vec<XdmItem<N>>, Error> {
        self.normalize()?;
        Ok(self.items)
    }
}

impl<N: XdmNode> Sequence<N> for ValueSequence<N> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::of(self.items.len())
    }

    fn item_type(&self) -> XdmType {
        self.item_type.unwrap_or(XdmType::Empty)
    }

    fn state(&self) -> SequenceState {
        self.state
    }

    fn freeze(&mut self) {
        self.state = SequenceState::Frozen;
    }

    fn add(&mut self, item: XdmItem<N>) -> Result<(), Error> {
        if self.state == SequenceState::Frozen {
            return Err(frozen_error());
        }
        self.item_type = Some(widen(self.item_type, item.item_type())?);
        self.node_only &= item.is_node();
        if !self.items.is_empty() {
            self.normalized = false;
        }
        self.items.push(item);
        Ok(())
    }

    fn iterate(&mut self) -> Result<core::slice::Iter<'_, XdmItem<N>>, Error> {
        self.normalize()?;
        Ok(self.items.iter())
    }

    fn unordered_iterate(&self) -> core::slice::Iter<'_, XdmItem<N>> {
        self.items.iter()
    }
}

impl<N: XdmNode> FromIterator<XdmItem<N>> for ValueSequence<N> {
    /// Collects without freezing; item types that cannot be widened leave
    /// the running type at `item()`.
    fn from_iter<I: IntoIterator<Item = XdmItem<N>>>(iter: I) -> Self {
        let mut seq = Self::new();
        for item in iter {
            seq.item_type = Some(widen(seq.item_type, item.item_type()).unwrap_or(XdmType::Item));
            seq.node_only &= item.is_node();
            seq.items.push(item);
        }
        seq.normalized = seq.items.len() < 2;
        seq
    }
}
