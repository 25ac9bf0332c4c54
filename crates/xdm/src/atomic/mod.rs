//! Atomic values: the typed payloads of the data model together with their
//! casting, comparison, arithmetic and host-export rules.

mod arith;
pub mod binary;
mod cast;
mod compare;
pub mod decimal;
pub mod float;
pub mod integer;
mod key;
pub mod native;
pub mod numeric;
pub mod qname;
pub mod string;

pub use binary::{BinaryEncoding, BinaryValue};
pub use decimal::DecimalValue;
pub use float::{DoubleValue, FloatValue};
pub use integer::{IntegerKind, IntegerValue};
pub use native::{NativeKind, NativeValue};
pub use numeric::Numeric;
pub use qname::QNameValue;
pub use string::{StringKind, StringValue};

use crate::error::{Error, ErrorCode};
use crate::temporal::{DateTimeValue, DurationValue};
use crate::types::XdmType;
use core::cmp::Ordering;
use core::fmt;

/// An immutable atomic value.
///
/// `PartialEq` is structural identity (same variant, same payload), which is
/// what tests and caches want. Query-level equality goes through
/// [`AtomicValue::compare`].
#[derive(Clone, Debug, PartialEq)]
pub enum AtomicValue {
    Boolean(bool),
    String(StringValue),
    UntypedAtomic(String),
    AnyUri(String),
    Integer(IntegerValue),
    Decimal(DecimalValue),
    Float(FloatValue),
    Double(DoubleValue),
    DateTime(DateTimeValue),
    Duration(DurationValue),
    QName(QNameValue),
    Binary(BinaryValue),
}

/// Value comparison operators (`eq`, `ne`, `lt`, `le`, `gt`, `ge`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn test(self, ord: Ordering) -> bool {
        match self {
            ComparisonOp::Eq => ord == Ordering::Equal,
            ComparisonOp::Ne => ord != Ordering::Equal,
            ComparisonOp::Lt => ord == Ordering::Less,
            ComparisonOp::Le => ord != Ordering::Greater,
            ComparisonOp::Gt => ord == Ordering::Greater,
            ComparisonOp::Ge => ord != Ordering::Less,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IntegerDivide,
    Modulus,
}

impl ArithmeticOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "div",
            ArithmeticOp::IntegerDivide => "idiv",
            ArithmeticOp::Modulus => "mod",
        }
    }
}

impl AtomicValue {
    pub fn string(s: impl Into<String>) -> Self {
        AtomicValue::String(StringValue::plain(s))
    }

    pub fn untyped(s: impl Into<String>) -> Self {
        AtomicValue::UntypedAtomic(s.into())
    }

    pub fn integer(i: i64) -> Self {
        AtomicValue::Integer(IntegerValue::from_i64(i))
    }

    pub fn double(x: f64) -> Self {
        AtomicValue::Double(DoubleValue(x))
    }

    pub fn float(x: f32) -> Self {
        AtomicValue::Float(FloatValue(x))
    }

    pub fn xdm_type(&self) -> XdmType {
        match self {
            AtomicValue::Boolean(_) => XdmType::Boolean,
            AtomicValue::String(s) => s.xdm_type(),
            AtomicValue::UntypedAtomic(_) => XdmType::UntypedAtomic,
            AtomicValue::AnyUri(_) => XdmType::AnyUri,
            AtomicValue::Integer(i) => i.xdm_type(),
            AtomicValue::Decimal(_) => XdmType::Decimal,
            AtomicValue::Float(_) => XdmType::Float,
            AtomicValue::Double(_) => XdmType::Double,
            AtomicValue::DateTime(dt) => dt.xdm_type(),
            AtomicValue::Duration(d) => d.xdm_type(),
            AtomicValue::QName(_) => XdmType::QName,
            AtomicValue::Binary(b) => b.xdm_type(),
        }
    }

    /// Canonical lexical form.
    pub fn to_lexical(&self) -> String {
        match self {
            AtomicValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            AtomicValue::String(s) => s.as_str().to_string(),
            AtomicValue::UntypedAtomic(s) | AtomicValue::AnyUri(s) => s.clone(),
            AtomicValue::Integer(i) => i.to_lexical(),
            AtomicValue::Decimal(d) => d.to_lexical(),
            AtomicValue::Float(f) => f.to_lexical(),
            AtomicValue::Double(d) => d.to_lexical(),
            AtomicValue::DateTime(dt) => dt.to_lexical(),
            AtomicValue::Duration(d) => d.to_lexical(),
            AtomicValue::QName(q) => q.to_lexical(),
            AtomicValue::Binary(b) => b.to_lexical(),
        }
    }

    /// Text of `xs:string` (and derived), `xs:untypedAtomic` and `xs:anyURI`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AtomicValue::String(s) => Some(s.as_str()),
            AtomicValue::UntypedAtomic(s) | AtomicValue::AnyUri(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicValue::Integer(_)
                | AtomicValue::Decimal(_)
                | AtomicValue::Float(_)
                | AtomicValue::Double(_)
        )
    }

    pub fn is_nan(&self) -> bool {
        match self {
            AtomicValue::Float(f) => f.is_nan(),
            AtomicValue::Double(d) => d.is_nan(),
            _ => false,
        }
    }

    /// Effective boolean value of a singleton: strings are true when
    /// non-empty, numerics when neither zero nor NaN.
    pub fn effective_boolean(&self) -> Result<bool, Error> {
        match self {
            AtomicValue::Boolean(b) => Ok(*b),
            AtomicValue::String(_) | AtomicValue::UntypedAtomic(_) | AtomicValue::AnyUri(_) => {
                Ok(self.as_str().is_some_and(|s| !s.is_empty()))
            }
            AtomicValue::Integer(i) => Ok(!i.is_zero()),
            AtomicValue::Decimal(d) => Ok(!d.is_zero()),
            AtomicValue::Float(f) => Ok(!(f.is_nan() || f.0 == 0.0)),
            AtomicValue::Double(d) => Ok(!(d.is_nan() || d.0 == 0.0)),
            _ => Err(Error::type_error(
                ErrorCode::FORG0006,
                format!("effective boolean value not defined for {}", self.xdm_type()),
            )
            .with_value(self)),
        }
    }
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

impl From<bool> for AtomicValue {
    fn from(b: bool) -> Self {
        AtomicValue::Boolean(b)
    }
}

impl From<i64> for AtomicValue {
    fn from(i: i64) -> Self {
        AtomicValue::integer(i)
    }
}

impl From<f64> for AtomicValue {
    fn from(x: f64) -> Self {
        AtomicValue::double(x)
    }
}

impl From<&str> for AtomicValue {
    fn from(s: &str) -> Self {
        AtomicValue::string(s)
    }
}

impl From<IntegerValue> for AtomicValue {
    fn from(v: IntegerValue) -> Self {
        AtomicValue::Integer(v)
    }
}

impl From<DecimalValue> for AtomicValue {
    fn from(v: DecimalValue) -> Self {
        AtomicValue::Decimal(v)
    }
}

impl From<DateTimeValue> for AtomicValue {
    fn from(v: DateTimeValue) -> Self {
        AtomicValue::DateTime(v)
    }
}

impl From<DurationValue> for AtomicValue {
    fn from(v: DurationValue) -> Self {
        AtomicValue::Duration(v)
    }
}

impl From<QNameValue> for AtomicValue {
    fn from(v: QNameValue) -> Self {
        AtomicValue::QName(v)
    }
}

impl From<BinaryValue> for AtomicValue {
    fn from(v: BinaryValue) -> Self {
        AtomicValue::Binary(v)
    }
}
