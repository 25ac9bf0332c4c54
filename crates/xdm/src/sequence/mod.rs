//! Sequences of items.
//!
//! A sequence is built by appending items and then read. Reading a
//! node-only sequence through [`Sequence::iterate`] puts it into document
//! order and removes duplicate nodes; that normalization runs once and is
//! kept. Ordered and grouped variants defer their sort or bucketing work the
//! same way.

mod grouped;
mod ordered;
mod sub;
mod value;

pub use grouped::{Group, GroupSpec, GroupedSequence};
pub use ordered::{EmptyOrder, OrderSpec, OrderedSequence, SortDirection};
pub use sub::SubSequence;
pub use value::ValueSequence;

use crate::atomic::AtomicValue;
use crate::error::{Error, ErrorCode};
use crate::node::XdmNode;
use crate::types::{XdmType, registry};

/// One item of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum XdmItem<N> {
    Node(N),
    Atomic(AtomicValue),
}

impl<N: XdmNode> XdmItem<N> {
    pub fn item_type(&self) -> XdmType {
        match self {
            XdmItem::Node(n) => n.kind().xdm_type(),
            XdmItem::Atomic(a) => a.xdm_type(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, XdmItem::Node(_))
    }

    pub fn as_node(&self) -> Option<&N> {
        match self {
            XdmItem::Node(n) => Some(n),
            XdmItem::Atomic(_) => None,
        }
    }

    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            XdmItem::Atomic(a) => Some(a),
            XdmItem::Node(_) => None,
        }
    }

    /// Atomic values of this item: itself, or a node's typed value.
    pub fn atomize(&self) -> Vec<AtomicValue> {
        match self {
            XdmItem::Atomic(a) => vec![a.clone()],
            XdmItem::Node(n) => n.typed_value(),
        }
    }

    pub fn string_value(&self) -> String {
        match self {
            XdmItem::Atomic(a) => a.to_lexical(),
            XdmItem::Node(n) => n.string_value(),
        }
    }
}

impl<N> From<AtomicValue> for XdmItem<N> {
    fn from(a: AtomicValue) -> Self {
        XdmItem::Atomic(a)
    }
}

/// Cached size class of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Empty,
    ExactlyOne,
    /// Two or more items.
    OneOrMore,
}

impl Cardinality {
    pub fn of(len: usize) -> Self {
        match len {
            0 => Cardinality::Empty,
            1 => Cardinality::ExactlyOne,
            _ => Cardinality::OneOrMore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceState {
    Building,
    Frozen,
}

pub(crate) fn frozen_error() -> Error {
    Error::internal("item added to a frozen sequence")
}

/// Running item type: the common supertype of every item added so far.
pub(crate) fn widen(current: Option<XdmType>, next: XdmType) -> Result<XdmType, Error> {
    match current {
        None => Ok(next),
        Some(t) => registry().common_supertype(t, next),
    }
}

/// Effective boolean value of a sequence given its items in order.
pub fn effective_boolean_of<'a, N: XdmNode + 'a>(
    mut items: impl Iterator<Item = &'a XdmItem<N>>,
) -> Result<bool, Error> {
    let Some(first) = items.next() else {
        return Ok(false);
    };
    if first.is_node() {
        return Ok(true);
    }
    if items.next().is_some() {
        return Err(Error::type_error(
            ErrorCode::FORG0006,
            "effective boolean value of a sequence of two or more atomic values",
        ));
    }
    match first {
        XdmItem::Atomic(a) => a.effective_boolean(),
        XdmItem::Node(_) => Ok(true),
    }
}

/// Read and append operations shared by all sequence variants.
pub trait Sequence<N: XdmNode> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn has_one(&self) -> bool {
        self.len() == 1
    }

    fn has_many(&self) -> bool {
        self.len() > 1
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::of(self.len())
    }

    /// Common supertype of all items; `empty-sequence()` when empty.
    fn item_type(&self) -> XdmType;

    fn state(&self) -> SequenceState;

    /// Ends the building phase; later `add` calls are defects.
    fn freeze(&mut self);

    fn add(&mut self, item: XdmItem<N>) -> Result<(), Error>;

    fn add_all<I>(&mut self, items: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = XdmItem<N>>,
        Self: Sized,
    {
        items.into_iter().try_for_each(|item| self.add(item))
    }

    /// Items in the variant's reading order, normalizing on first call.
    fn iterate(&mut self) -> Result<core::slice::Iter<'_, XdmItem<N>>, Error>;

    /// Items as stored, without sorting or removing duplicates.
    fn unordered_iterate(&self) -> core::slice::Iter<'_, XdmItem<N>>;

    fn iterate_in_reverse(
        &mut self,
    ) -> Result<core::iter::Rev<core::slice::Iter<'_, XdmItem<N>>>, Error> {
        Ok(self.iterate()?.rev())
    }

    /// Zero-based item in reading order.
    fn item_at(&mut self, index: usize) -> Result<Option<&XdmItem<N>>, Error> {
        Ok(self.iterate()?.nth(index))
    }

    fn contains(&self, item: &XdmItem<N>) -> bool
    where
        N: PartialEq,
    {
        self.unordered_iterate().any(|i| i == item)
    }

    fn effective_boolean(&self) -> Result<bool, Error> {
        effective_boolean_of(self.unordered_iterate())
    }
}
