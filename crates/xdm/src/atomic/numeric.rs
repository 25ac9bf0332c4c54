//! Numeric type promotion along integer → decimal → float → double.

use super::{AtomicValue, DecimalValue, DoubleValue, FloatValue, IntegerValue};
use crate::error::{Error, ErrorCode};
use crate::types::XdmType;
use core::cmp::Ordering;
use std::str::FromStr;

/// A numeric operand detached from its atomic wrapper.
#[derive(Clone, Debug, PartialEq)]
pub enum Numeric {
    Integer(IntegerValue),
    Decimal(DecimalValue),
    Float(FloatValue),
    Double(DoubleValue),
}

impl Numeric {
    pub fn classify(value: &AtomicValue) -> Option<Numeric> {
        Some(match value {
            AtomicValue::Integer(i) => Numeric::Integer(i.clone()),
            AtomicValue::Decimal(d) => Numeric::Decimal(d.clone()),
            AtomicValue::Float(f) => Numeric::Float(*f),
            AtomicValue::Double(d) => Numeric::Double(*d),
            _ => return None,
        })
    }

    /// Position on the promotion chain.
    pub fn rank(&self) -> u8 {
        match self {
            Numeric::Integer(_) => 0,
            Numeric::Decimal(_) => 1,
            Numeric::Float(_) => 2,
            Numeric::Double(_) => 3,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Integer(i) => i.to_f64(),
            Numeric::Decimal(d) => d.to_f64(),
            Numeric::Float(f) => f.to_f64(),
            Numeric::Double(d) => d.0,
        }
    }

    pub(crate) fn to_f32(&self) -> f32 {
        match self {
            Numeric::Float(f) => f.0,
            Numeric::Integer(i) => f32::from_str(&i.to_lexical()).unwrap_or(f32::NAN),
            Numeric::Decimal(d) => f32::from_str(&d.to_lexical()).unwrap_or(f32::NAN),
            Numeric::Double(d) => d.0 as f32,
        }
    }

    /// Promotes upward to `rank`; a lower or equal rank returns `self`.
    pub fn promote_to_rank(self, rank: u8) -> Numeric {
        if rank <= self.rank() {
            return self;
        }
        match rank {
            1 => match self {
                Numeric::Integer(i) => Numeric::Decimal(i.to_decimal()),
                other => other,
            },
            2 => Numeric::Float(FloatValue(self.to_f32())),
            _ => Numeric::Double(DoubleValue(self.to_f64())),
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Numeric::Float(f) => f.is_nan(),
            Numeric::Double(d) => d.is_nan(),
            _ => false,
        }
    }

    pub fn into_atomic(self) -> AtomicValue {
        match self {
            Numeric::Integer(i) => AtomicValue::Integer(i),
            Numeric::Decimal(d) => AtomicValue::Decimal(d),
            Numeric::Float(f) => AtomicValue::Float(f),
            Numeric::Double(d) => AtomicValue::Double(d),
        }
    }
}

/// Brings both operands to the wider of their two ranks.
pub fn unify(a: Numeric, b: Numeric) -> (Numeric, Numeric) {
    let rank = a.rank().max(b.rank());
    (a.promote_to_rank(rank), b.promote_to_rank(rank))
}

/// Numeric order after promotion; `None` when either side is NaN.
pub fn numeric_cmp(a: &Numeric, b: &Numeric) -> Option<Ordering> {
    match unify(a.clone(), b.clone()) {
        (Numeric::Integer(x), Numeric::Integer(y)) => Some(x.as_bigint().cmp(y.as_bigint())),
        (Numeric::Decimal(x), Numeric::Decimal(y)) => Some(x.cmp(&y)),
        (Numeric::Float(x), Numeric::Float(y)) => x.0.partial_cmp(&y.0),
        (x, y) => x.to_f64().partial_cmp(&y.to_f64()),
    }
}

/// Promotes a numeric value to `target` (`xs:decimal`, `xs:float` or
/// `xs:double`, or its own type). Demotion is a type error.
pub fn promote(value: &AtomicValue, target: XdmType) -> Result<AtomicValue, Error> {
    let refuse = || {
        Error::type_error(
            ErrorCode::XPTY0004,
            format!("cannot promote {} to {target}", value.xdm_type()),
        )
        .with_value(value)
    };
    let num = Numeric::classify(value).ok_or_else(refuse)?;
    if target == value.xdm_type() || target == XdmType::Numeric {
        return Ok(value.clone());
    }
    let rank = target.numeric_rank().ok_or_else(refuse)?;
    if rank == 0 {
        // Integer targets only admit subtype substitution.
        return if crate::types::registry().subtype_of(value.xdm_type(), target)? {
            Ok(value.clone())
        } else {
            Err(refuse())
        };
    }
    if rank < num.rank() {
        return Err(refuse());
    }
    Ok(num.promote_to_rank(rank).into_atomic())
}
