use super::{Sequence, SequenceState, XdmItem, frozen_error, widen};
use crate::atomic::decimal::plain_string;
use crate::atomic::{AtomicValue, ComparisonOp, Numeric};
use crate::collation::Collation;
use crate::context::XdmContext;
use crate::error::{Error, ErrorCode};
use crate::node::XdmNode;
use crate::temporal::DateTimeKind;
use crate::types::XdmType;
use core::fmt;
use itertools::Itertools;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

type KeyFn<'f, N> = Box<dyn FnMut(&XdmItem<N>) -> Result<Vec<AtomicValue>, Error> + 'f>;

/// One `group by` key.
pub struct GroupSpec<'f, N> {
    key: KeyFn<'f, N>,
    collation: Option<Arc<dyn Collation>>,
}

impl<'f, N> GroupSpec<'f, N> {
    pub fn new(key: impl FnMut(&XdmItem<N>) -> Result<Vec<AtomicValue>, Error> + 'f) -> Self {
        Self {
            key: Box::new(key),
            collation: None,
        }
    }

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
                format!("a grouping key must be a single atomic value, got {}", values.len()),
            ));
        }
        Ok(values.pop().map(|v| match v {
            AtomicValue::UntypedAtomic(s) => AtomicValue::string(s),
            v => v,
        }))
    }

    fn collation_or<'c>(&'c self, ctx: &'c XdmContext) -> &'c dyn Collation {
        self.collation.as_deref().unwrap_or_else(|| ctx.default_collation())
    }
}

impl<N> fmt::Debug for GroupSpec<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSpec")
            .field("collation", &self.collation)
            .finish_non_exhaustive()
    }
}

/// Hashable stand-in for one key value. Values that are `eq` always share
/// a hash part; the converse is checked with value comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum HashPart {
    Empty,
    Boolean(bool),
    /// Numbers rounded to single precision, so every promotion path lands
    /// on the same bits.
    Number(u32),
    Text(String),
    Instant(DateTimeKind, i64, u32),
    Duration(i64, String),
    QName(Option<String>, String),
    Binary(Vec<u8>),
}

type KeyTuple = SmallVec<[Option<AtomicValue>; 2]>;

#[derive(Debug)]
struct Bucket {
    key: KeyTuple,
    members: Vec<usize>,
}

/// Members of one group, in insertion order.
#[derive(Debug)]
pub struct Group<'a, N> {
    pub key: &'a [Option<AtomicValue>],
    pub items: Vec<&'a XdmItem<N>>,
}

/// Sequence partitioned by group keys. Buckets keep the order in which
/// their first member arrived; reading yields each bucket in turn.
#[derive(Debug)]
pub struct GroupedSequence<'f, N> {
    specs: Vec<GroupSpec<'f, N>>,
    ctx: XdmContext,
    items: Vec<XdmItem<N>>,
    buckets: Vec<Bucket>,
    index: HashMap<Vec<HashPart>, SmallVec<[usize; 1]>>,
    flattened: Vec<XdmItem<N>>,
    flattened_valid: bool,
    item_type: Option<XdmType>,
    state: SequenceState,
}

impl<'f, N: XdmNode> GroupedSequence<'f, N> {
    pub fn new(specs: Vec<GroupSpec<'f, N>>, ctx: &XdmContext) -> Self {
        Self {
            specs,
            ctx: ctx.clone(),
            items: Vec::new(),
            buckets: Vec::new(),
            index: HashMap::new(),
            flattened: Vec::new(),
            flattened_valid: true,
            item_type: None,
            state: SequenceState::Building,
        }
    }

    pub fn group_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn groups(&self) -> impl Iterator<Item = Group<'_, N>> {
        self.buckets.iter().map(|b| Group {
            key: &b.key,
            items: b.members.iter().map(|&i| &self.items[i]).collect(),
        })
    }

    fn hash_part(&self, spec: &GroupSpec<'f, N>, value: Option<&AtomicValue>) -> HashPart {
        let Some(v) = value else {
            return HashPart::Empty;
        };
        if let Some(n) = Numeric::classify(v) {
            #[allow(clippy::cast_possible_truncation)]
            let x = n.to_f64() as f32;
            let bits = if x.is_nan() {
                f32::NAN.to_bits()
            } else if x == 0.0 {
                0
            } else {
                x.to_bits()
            };
            return HashPart::Number(bits);
        }
        if let Some(s) = v.as_str() {
            return HashPart::Text(spec.collation_or(&self.ctx).key(s));
        }
        match v {
            AtomicValue::Boolean(b) => HashPart::Boolean(*b),
            AtomicValue::DateTime(dt) => {
                let m = dt.instant(self.ctx.implicit_timezone());
                HashPart::Instant(dt.kind(), m.seconds, m.nanos)
            }
            AtomicValue::Duration(d) => {
                HashPart::Duration(d.total_months(), plain_string(&d.total_seconds().normalized()))
            }
            AtomicValue::QName(q) => HashPart::QName(q.ns_uri.clone(), q.local.clone()),
            AtomicValue::Binary(b) => HashPart::Binary(b.as_bytes().to_vec()),
            _ => HashPart::Text(v.to_lexical()),
        }
    }

    fn same_key(&self, a: &KeyTuple, b: &KeyTuple) -> bool {
        a.iter().zip(b).zip(&self.specs).all(|((x, y), spec)| match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) if x.is_nan() || y.is_nan() => x.is_nan() && y.is_nan(),
            (Some(x), Some(y)) => x
                .compare(y, ComparisonOp::Eq, &self.ctx, spec.collation.as_deref())
                .unwrap_or(false),
            _ => false,
        })
    }

    /// Items bucket by bucket, consuming the sequence.
    pub fn into_items(mut self) -> Vec<XdmItem<N>> {
        self.flatten();
        self.flattened
    }

    fn flatten(&mut self) {
        if self.flattened_valid {
            return;
        }
        self.flattened = self
            .buckets
            .iter()
            .flat_map(|b| b.members.iter().map(|&i| self.items[i].clone()))
            .collect_vec();
        self.flattened_valid = true;
    }
}

impl<N: XdmNode> Sequence<N> for GroupedSequence<'_, N> {
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
        let hash: Vec<HashPart> = self
            .specs
            .iter()
            .zip(&key)
            .map(|(spec, v)| self.hash_part(spec, v.as_ref()))
            .collect();
        let position = self.items.len();
        let found = self.index.get(&hash).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&b| self.same_key(&self.buckets[b].key, &key))
        });
        match found {
            Some(b) => self.buckets[b].members.push(position),
            None => {
                let b = self.buckets.len();
                tracing::trace!(bucket = b, item = position, "new group");
                self.buckets.push(Bucket {
                    key,
                    members: vec![position],
                });
                self.index.entry(hash).or_default().push(b);
            }
        }
        self.items.push(item);
        self.flattened_valid = false;
        Ok(())
    }

    fn iterate(&mut self) -> Result<core::slice::Iter<'_, XdmItem<N>>, Error> {
        self.flatten();
        Ok(self.flattened.iter())
    }

    /// Items in insertion order, ignoring buckets.
    fn unordered_iterate(&self) -> core::slice::Iter<'_, XdmItem<N>> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::SimpleCaseCollation;
    use crate::simple_node::SimpleNode;
    use rstest::rstest;

    fn self_key(item: &XdmItem<SimpleNode>) -> Result<Vec<AtomicValue>, Error> {
        Ok(item.atomize())
    }

    #[rstest]
    fn numbers_group_across_types() {
        let ctx = XdmContext::default();
        let mut seq = GroupedSequence::new(vec![GroupSpec::new(self_key)], &ctx);
        let values = [
            AtomicValue::integer(1),
            AtomicValue::parse("1.0", XdmType::Decimal).unwrap(),
            AtomicValue::double(1.0),
            AtomicValue::double(f64::NAN),
            AtomicValue::float(f32::NAN),
            AtomicValue::double(-0.0),
            AtomicValue::integer(0),
        ];
        for v in values {
            seq.add(v.into()).unwrap();
        }
        assert_eq!(seq.group_count(), 3);
        let sizes: Vec<usize> = seq.groups().map(|g| g.items.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
    }

    #[rstest]
    fn empty_key_is_its_own_group() {
        let ctx = XdmContext::default();
        let mut seq = GroupedSequence::new(
            vec![GroupSpec::new(|i: &XdmItem<SimpleNode>| {
                Ok(i.as_atomic().filter(|a| a.as_str() != Some("")).cloned().into_iter().collect())
            })],
            &ctx,
        );
        for s in ["", "x", "", "x"] {
            seq.add(AtomicValue::string(s).into()).unwrap();
        }
        assert_eq!(seq.group_count(), 2);
        assert!(seq.groups().next().is_some_and(|g| g.key[0].is_none()));
    }

    #[rstest]
    fn collation_merges_case_variants() {
        let ctx = XdmContext::default();
        let spec = GroupSpec::new(self_key).collation(Arc::new(SimpleCaseCollation));
        let mut seq = GroupedSequence::new(vec![spec], &ctx);
        for s in ["Apple", "apple", "APPLE", "pear"] {
            seq.add(AtomicValue::string(s).into()).unwrap();
        }
        assert_eq!(seq.group_count(), 2);
    }

    #[rstest]
    fn unrelated_types_do_not_merge() {
        let ctx = XdmContext::default();
        let mut seq = GroupedSequence::new(vec![GroupSpec::new(self_key)], &ctx);
        seq.add(AtomicValue::string("1").into()).unwrap();
        seq.add(AtomicValue::integer(1).into()).unwrap();
        seq.add(AtomicValue::Boolean(true).into()).unwrap();
        assert_eq!(seq.group_count(), 3);
    }
}
