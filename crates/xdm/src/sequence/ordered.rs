use super::{Sequence, SequenceState, XdmItem, frozen_error, widen};
use crate::atomic::AtomicValue;
use crate::collation::Collation;
use crate::context::XdmContext;
use crate::error::{Error, ErrorCode};
use crate::node::XdmNode;
use crate::types::XdmType;
use core::cmp::Ordering;
use core::fmt;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Placement of items whose key is empty (or NaN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmptyOrder {
    #[default]
    Least,
    Greatest,
}

type KeyFn<'f, N> = Box<dyn FnMut(&XdmItem<N>) -> Result<Vec<AtomicValue>, Error> + 'f>;

/// One `order by` key: how to compute it and how to compare it.
pub struct OrderSpec<'f, N> {
    key: KeyFn<'f, N>,
    direction: SortDirection,
    empty: EmptyOrder,
    collation: Option<Arc<dyn Collation>>,
}

impl<'f, N> OrderSpec<'f, N> {
    /// `key` returns the atomized key of an item; it is called once per item.
    pub fn new(key: impl FnMut(&XdmItem<N>) -> Result<Vec<AtomicValue>, Error> + 'f) -> Self {
        Self {
            key: Box::new(key),
            direction: SortDirection::Ascending,
            empty: EmptyOrder::Least,
            collation: None,
        }
    }

    #[must_use]
    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn descending(self) -> Self {
        self.direction(SortDirection::Descending)
    }

    #[must_use]
    pub fn empty_order(mut self, empty: EmptyOrder) -> Self {
        self.empty = empty;
        self
    }

    #[must_use]
    pub fn empty_greatest(self) -> Self {
        self.empty_order(EmptyOrder::Greatest)
    }

    /// Collation for string keys; the context default applies otherwise.
    #[must_use]
    pub fn collation(mut self, collation: Arc<dyn Collation>) -> Self {
        self.collation = Some(collation);
        self
    }

    fn evaluate(&mut self, item: &XdmItem<N>) -> Result<Option<AtomicValue>, Error> {
        let mut values = (self.key)(item)?;
        if values.len() > 1 {
            return Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("an order key must be a single atomic value, got {}", values.len()),
            ));
        }
        Ok(values.pop().and_then(|v| match v {
            v if v.is_nan() => None,
            AtomicValue::UntypedAtomic(s) => Some(AtomicValue::string(s)),
            v => Some(v),
        }))
    }

    fn compare(
        &self,
        a: Option<&AtomicValue>,
        b: Option<&AtomicValue>,
        ctx: &XdmContext,
    ) -> Result<Ordering, Error> {
        let empty_first = match self.empty {
            EmptyOrder::Least => Ordering::Less,
            EmptyOrder::Greatest => Ordering::Greater,
        };
        let ord = match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => empty_first,
            (Some(_), None) => empty_first.reverse(),
            (Some(x), Some(y)) => x.order_compare(y, ctx, self.collation.as_deref())?,
        };
        Ok(match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        })
    }
}

impl<N> fmt::Debug for OrderSpec<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSpec")
            .field("direction", &self.direction)
            .field("empty", &self.empty)
            .field("collation", &self.collation)
            .finish_non_exhaustive()
    }
}

type KeyTuple = SmallVec<[Option<AtomicValue>; 2]>;

/// Sequence sorted by one or more keys. Keys are computed when an item is
/// added; the stable sort runs on the first read after a change.
#[derive(Debug)]
pub struct OrderedSequence<'f, N> {
    specs: Vec<OrderSpec<'f, N>>,
    ctx: XdmContext,
    items: Vec<XdmItem<N>>,
    keys: Vec<KeyTuple>,
    item_type: Option<XdmType>,
    sorted: bool,
    state: SequenceState,
}

impl<'f, N: XdmNode> OrderedSequence<'f, N> {
    pub fn new(specs: Vec<OrderSpec<'f, N>>, ctx: &XdmContext) -> Self {
        Self {
            specs,
            ctx: ctx.clone(),
            items: Vec::new(),
            keys: Vec::new(),
            item_type: None,
            sorted: true,
            state: SequenceState::Building,
        }
    }

    fn compare_keys(&self, a: &KeyTuple, b: &KeyTuple) -> Result<Ordering, Error> {
        for (i, spec) in self.specs.iter().enumerate() {
            let ord = spec.compare(a[i].as_ref(), b[i].as_ref(), &self.ctx)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }

    fn sort(&mut self) -> Result<(), Error> {
        if self.sorted {
            return Ok(());
        }
        let mut perm: Vec<usize> = (0..self.items.len()).collect();
        let mut failure = None;
        perm.sort_by(|&i, &j| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            self.compare_keys(&self.keys[i], &self.keys[j])
                .unwrap_or_else(|e| {
                    failure = Some(e);
                    Ordering::Equal
                })
        });
        if let Some(e) = failure {
            return Err(e);
        }
        let mut items: Vec<Option<XdmItem<N>>> = self.items.drain(..).map(Some).collect();
        let mut keys: Vec<Option<KeyTuple>> = self.keys.drain(..).map(Some).collect();
        for &i in &perm {
            if let (Some(item), Some(key)) = (items[i].take(), keys[i].take()) {
                self.items.push(item);
                self.keys.push(key);
            }
        }
        self.sorted = true;
        tracing::trace!(items = self.items.len(), keys = self.specs.len(), "sorted ordered sequence");
        Ok(())
    }

    /// Sorted items, consuming the sequence.
    pub fn into_items(mut self) -> Result<Vec<XdmItem<N>>, Error> {
        self.sort()?;
        Ok(self.items)
    }
}

impl<N: XdmNode> Sequence<N> for OrderedSequence<'_, N> {
    fn len(&self) -> usize {
        self.items.len()
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
        let key = self
            .specs
            .iter_mut()
            .map(|spec| spec.evaluate(&item))
            .collect::<Result<KeyTuple, _>>()?;
        self.item_type = Some(widen(self.item_type, item.item_type())?);
        if !self.items.is_empty() {
            self.sorted = false;
        }
        self.items.push(item);
        self.keys.push(key);
        Ok(())
    }

    fn iterate(&mut self) -> Result<core::slice::Iter<'_, XdmItem<N>>, Error> {
        self.sort()?;
        Ok(self.items.iter())
    }

    fn unordered_iterate(&self) -> core::slice::Iter<'_, XdmItem<N>> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple_node::SimpleNode;
    use rstest::rstest;

    fn int_key(item: &XdmItem<SimpleNode>) -> Result<Vec<AtomicValue>, Error> {
        Ok(item.as_atomic().cloned().into_iter().collect())
    }

    #[rstest]
    #[case(EmptyOrder::Least, SortDirection::Ascending, vec!["()", "1", "2"])]
    #[case(EmptyOrder::Greatest, SortDirection::Ascending, vec!["1", "2", "()"])]
    #[case(EmptyOrder::Least, SortDirection::Descending, vec!["2", "1", "()"])]
    #[case(EmptyOrder::Greatest, SortDirection::Descending, vec!["()", "2", "1"])]
    fn empty_placement(#[case] empty: EmptyOrder, #[case] dir: SortDirection, #[case] expected: Vec<&str>) {
        let ctx = XdmContext::default();
        let spec = OrderSpec::new(|item: &XdmItem<SimpleNode>| {
            Ok(match item.as_atomic() {
                Some(AtomicValue::Double(d)) if d.is_nan() => vec![],
                Some(a) => vec![a.clone()],
                None => vec![],
            })
        })
        .empty_order(empty)
        .direction(dir);
        let mut seq = OrderedSequence::new(vec![spec], &ctx);
        for v in [AtomicValue::integer(2), AtomicValue::double(f64::NAN), AtomicValue::integer(1)] {
            seq.add(v.into()).unwrap();
        }
        let got: Vec<String> = seq
            .into_items()
            .unwrap()
            .iter()
            .map(|i| if i.as_atomic().is_some_and(AtomicValue::is_nan) { "()".into() } else { i.string_value() })
            .collect();
        assert_eq!(got, expected);
    }

    #[rstest]
    fn multi_valued_key_is_a_type_error() {
        let ctx = XdmContext::default();
        let spec = OrderSpec::new(|_: &XdmItem<SimpleNode>| {
            Ok(vec![AtomicValue::integer(1), AtomicValue::integer(2)])
        });
        let mut seq = OrderedSequence::new(vec![spec], &ctx);
        let err = seq.add(AtomicValue::integer(0).into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::XPTY0004);
    }

    #[rstest]
    fn incomparable_keys_surface_on_iteration() {
        let ctx = XdmContext::default();
        let mut seq = OrderedSequence::new(vec![OrderSpec::new(int_key)], &ctx);
        seq.add(AtomicValue::integer(1).into()).unwrap();
        seq.add(AtomicValue::Boolean(true).into()).unwrap();
        assert!(seq.iterate().is_err());
        assert_eq!(seq.unordered_iterate().count(), 2);
    }
}
