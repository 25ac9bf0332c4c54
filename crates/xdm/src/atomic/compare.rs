//! Value comparison between atomic values.

use super::numeric::{Numeric, numeric_cmp};
use super::{AtomicValue, ComparisonOp};
use crate::collation::Collation;
use crate::context::XdmContext;
use crate::error::Error;
use crate::temporal::DurationKind;
use core::cmp::Ordering;

/// How two comparable values relate.
enum Relation {
    Ordered(Ordering),
    /// At least one side is NaN.
    Unordered,
    /// The type supports only `eq` and `ne`.
    EqualityOnly(bool),
}

fn relate(
    a: &AtomicValue,
    b: &AtomicValue,
    ctx: &XdmContext,
    collation: Option<&dyn Collation>,
) -> Result<Relation, Error> {
    use AtomicValue as V;
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        let coll = collation.unwrap_or_else(|| ctx.default_collation());
        return Ok(Relation::Ordered(coll.compare(x, y)));
    }
    if let (Some(x), Some(y)) = (Numeric::classify(a), Numeric::classify(b)) {
        return Ok(numeric_cmp(&x, &y).map_or(Relation::Unordered, Relation::Ordered));
    }
    match (a, b) {
        (V::Boolean(x), V::Boolean(y)) => Ok(Relation::Ordered(x.cmp(y))),
        (V::DateTime(x), V::DateTime(y)) if x.kind() == y.kind() => x
            .order_compare(y, ctx.implicit_timezone())
            .map(Relation::Ordered),
        (V::Duration(x), V::Duration(y)) => match (x.kind(), y.kind()) {
            (DurationKind::YearMonth, DurationKind::YearMonth)
            | (DurationKind::DayTime, DurationKind::DayTime) => {
                x.order_compare(y).map(Relation::Ordered)
            }
            _ => Ok(Relation::EqualityOnly(x.value_eq(y))),
        },
        (V::QName(x), V::QName(y)) => Ok(Relation::EqualityOnly(x == y)),
        (V::Binary(x), V::Binary(y)) if x.encoding() == y.encoding() => {
            Ok(Relation::EqualityOnly(x.as_bytes() == y.as_bytes()))
        }
        _ => Err(Error::incomparable(a, b)),
    }
}

fn not_ordered(a: &AtomicValue, b: &AtomicValue, op: &str) -> Error {
    Error::comparison(format!(
        "'{op}' is not defined between {} and {}",
        a.xdm_type(),
        b.xdm_type()
    ))
    .with_value(a)
    .with_value(b)
}

impl AtomicValue {
    /// Value comparison. `xs:untypedAtomic` compares as `xs:string`; strings
    /// use `collation` or the context default. Any comparison involving NaN
    /// is false except `ne`.
    pub fn compare(
        &self,
        other: &AtomicValue,
        op: ComparisonOp,
        ctx: &XdmContext,
        collation: Option<&dyn Collation>,
    ) -> Result<bool, Error> {
        match relate(self, other, ctx, collation)? {
            Relation::Ordered(ord) => Ok(op.test(ord)),
            Relation::Unordered => Ok(op == ComparisonOp::Ne),
            Relation::EqualityOnly(eq) => match op {
                ComparisonOp::Eq => Ok(eq),
                ComparisonOp::Ne => Ok(!eq),
                _ => Err(not_ordered(self, other, op.as_str())),
            },
        }
    }

    /// Total order for sorting: like [`AtomicValue::compare`] except that NaN
    /// sorts below every other number and equal to itself.
    pub fn order_compare(
        &self,
        other: &AtomicValue,
        ctx: &XdmContext,
        collation: Option<&dyn Collation>,
    ) -> Result<Ordering, Error> {
        match relate(self, other, ctx, collation)? {
            Relation::Ordered(ord) => Ok(ord),
            Relation::Unordered => Ok(self.is_nan().cmp(&other.is_nan()).reverse()),
            Relation::EqualityOnly(_) => Err(not_ordered(self, other, "order by")),
        }
    }

    /// `eq` under the default collation.
    pub fn value_eq(&self, other: &AtomicValue, ctx: &XdmContext) -> Result<bool, Error> {
        self.compare(other, ComparisonOp::Eq, ctx, None)
    }
}
