use super::{Sequence, SequenceState, XdmItem, widen};
use crate::error::Error;
use crate::node::XdmNode;
use crate::types::XdmType;

/// Read-only window over a contiguous range of another sequence.
#[derive(Debug, Clone)]
pub struct SubSequence<'a, N> {
    items: &'a [XdmItem<N>],
    item_type: Option<XdmType>,
}

impl<'a, N: XdmNode> SubSequence<'a, N> {
    pub(crate) fn new(items: &'a [XdmItem<N>]) -> Result<Self, Error> {
        let item_type = items
            .iter()
            .try_fold(None, |acc, item| widen(acc, item.item_type()).map(Some))?;
        Ok(Self { items, item_type })
    }

    pub fn as_slice(&self) -> &'a [XdmItem<N>] {
        self.items
    }
}

impl<N: XdmNode> Sequence<N> for SubSequence<'_, N> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn item_type(&self) -> XdmType {
        self.item_type.unwrap_or(XdmType::Empty)
    }

    fn state(&self) -> SequenceState {
        SequenceState::Frozen
    }

    fn freeze(&mut self) {}

    fn add(&mut self, _item: XdmItem<N>) -> Result<(), Error> {
        Err(Error::internal("a subsequence is read-only"))
    }

    fn iterate(&mut self) -> Result<core::slice::Iter<'_, XdmItem<N>>, Error> {
        Ok(self.items.iter())
    }

    fn unordered_iterate(&self) -> core::slice::Iter<'_, XdmItem<N>> {
        self.items.iter()
    }
}
