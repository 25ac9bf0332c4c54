use super::decimal::{DecimalValue, round_at};
use crate::error::{Error, ErrorCode};
use crate::types::XdmType;
use bigdecimal::{BigDecimal, RoundingMode};
use core::fmt;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::str::FromStr;

/// `xs:integer` and the restricted integer types derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    PositiveInteger,
}

impl IntegerKind {
    pub fn xdm_type(self) -> XdmType {
        match self {
            IntegerKind::Integer => XdmType::Integer,
            IntegerKind::NonPositiveInteger => XdmType::NonPositiveInteger,
            IntegerKind::NegativeInteger => XdmType::NegativeInteger,
            IntegerKind::Long => XdmType::Long,
            IntegerKind::Int => XdmType::Int,
            IntegerKind::Short => XdmType::Short,
            IntegerKind::Byte => XdmType::Byte,
            IntegerKind::NonNegativeInteger => XdmType::NonNegativeInteger,
            IntegerKind::UnsignedLong => XdmType::UnsignedLong,
            IntegerKind::UnsignedInt => XdmType::UnsignedInt,
            IntegerKind::UnsignedShort => XdmType::UnsignedShort,
            IntegerKind::UnsignedByte => XdmType::UnsignedByte,
            IntegerKind::PositiveInteger => XdmType::PositiveInteger,
        }
    }

    pub fn from_type(t: XdmType) -> Option<Self> {
        Some(match t {
            XdmType::Integer => IntegerKind::Integer,
            XdmType::NonPositiveInteger => IntegerKind::NonPositiveInteger,
            XdmType::NegativeInteger => IntegerKind::NegativeInteger,
            XdmType::Long => IntegerKind::Long,
            XdmType::Int => IntegerKind::Int,
            XdmType::Short => IntegerKind::Short,
            XdmType::Byte => IntegerKind::Byte,
            XdmType::NonNegativeInteger => IntegerKind::NonNegativeInteger,
            XdmType::UnsignedLong => IntegerKind::UnsignedLong,
            XdmType::UnsignedInt => IntegerKind::UnsignedInt,
            XdmType::UnsignedShort => IntegerKind::UnsignedShort,
            XdmType::UnsignedByte => IntegerKind::UnsignedByte,
            XdmType::PositiveInteger => IntegerKind::PositiveInteger,
            _ => return None,
        })
    }

    /// Inclusive `(min, max)`; `None` means unbounded on that side.
    pub fn bounds(self) -> (Option<BigInt>, Option<BigInt>) {
        use IntegerKind::*;
        match self {
            Integer => (None, None),
            NonPositiveInteger => (None, Some(BigInt::zero())),
            NegativeInteger => (None, Some(BigInt::from(-1))),
            Long => (Some(i64::MIN.into()), Some(i64::MAX.into())),
            Int => (Some(i32::MIN.into()), Some(i32::MAX.into())),
            Short => (Some(i16::MIN.into()), Some(i16::MAX.into())),
            Byte => (Some(i8::MIN.into()), Some(i8::MAX.into())),
            NonNegativeInteger => (Some(BigInt::zero()), None),
            UnsignedLong => (Some(BigInt::zero()), Some(u64::MAX.into())),
            UnsignedInt => (Some(BigInt::zero()), Some(u32::MAX.into())),
            UnsignedShort => (Some(BigInt::zero()), Some(u16::MAX.into())),
            UnsignedByte => (Some(BigInt::zero()), Some(u8::MAX.into())),
            PositiveInteger => (Some(BigInt::from(1)), None),
        }
    }

    pub fn contains(self, v: &BigInt) -> bool {
        let (lo, hi) = self.bounds();
        lo.is_none_or(|lo| *v >= lo) && hi.is_none_or(|hi| *v <= hi)
    }
}

/// An integer together with the restricted type it was constructed as.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntegerValue {
    value: BigInt,
    kind: IntegerKind,
}

impl IntegerValue {
    /// Fails with `FORG0001` when `value` lies outside the bounds of `kind`.
    pub fn new(value: BigInt, kind: IntegerKind) -> Result<Self, Error> {
        if !kind.contains(&value) {
            return Err(Error::cast(
                ErrorCode::FORG0001,
                format!("{value} is out of range for {}", kind.xdm_type()),
            )
            .with_operand(XdmType::Integer, value.to_string()));
        }
        Ok(Self { value, kind })
    }

    pub fn from_bigint(value: BigInt) -> Self {
        Self {
            value,
            kind: IntegerKind::Integer,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_bigint(BigInt::from(value))
    }

    /// Parses `[+-]?digits` after trimming whitespace.
    pub fn parse(input: &str, kind: IntegerKind) -> Result<Self, Error> {
        let s = input.trim();
        let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_lexical(kind.xdm_type(), input, "not an integer"));
        }
        let unsigned = s.strip_prefix('+').unwrap_or(s);
        let value = BigInt::from_str(unsigned)
            .map_err(|e| Error::invalid_lexical(kind.xdm_type(), input, e))?;
        Self::new(value, kind).map_err(|e| Error::invalid_lexical(kind.xdm_type(), input, e.message))
    }

    pub fn kind(&self) -> IntegerKind {
        self.kind
    }

    pub fn xdm_type(&self) -> XdmType {
        self.kind.xdm_type()
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.value
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.value.to_i64()
    }

    pub fn to_f64(&self) -> f64 {
        self.to_lexical().parse().unwrap_or(f64::NAN)
    }

    pub fn to_decimal(&self) -> DecimalValue {
        DecimalValue::new(BigDecimal::new(self.value.clone(), 0))
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Same number re-tagged as `kind`, range checked.
    pub fn with_kind(&self, kind: IntegerKind) -> Result<Self, Error> {
        Self::new(self.value.clone(), kind)
    }

    pub fn to_lexical(&self) -> String {
        self.value.to_string()
    }

    pub fn add(&self, other: &IntegerValue) -> IntegerValue {
        Self::from_bigint(&self.value + &other.value)
    }

    pub fn sub(&self, other: &IntegerValue) -> IntegerValue {
        Self::from_bigint(&self.value - &other.value)
    }

    pub fn mul(&self, other: &IntegerValue) -> IntegerValue {
        Self::from_bigint(&self.value * &other.value)
    }

    /// `xs:integer div xs:integer` yields `xs:decimal`; a zero divisor is `FOAR0001`.
    pub fn div(&self, other: &IntegerValue) -> Result<DecimalValue, Error> {
        self.to_decimal().div(&other.to_decimal())
    }

    /// Quotient truncated toward zero.
    pub fn idiv(&self, other: &IntegerValue) -> Result<IntegerValue, Error> {
        if other.is_zero() {
            return Err(Error::domain(ErrorCode::FOAR0001, "integer division by zero"));
        }
        Ok(Self::from_bigint(&self.value / &other.value))
    }

    /// Remainder with the sign of the dividend.
    pub fn rem(&self, other: &IntegerValue) -> Result<IntegerValue, Error> {
        if other.is_zero() {
            return Err(Error::domain(ErrorCode::FOAR0001, "modulus by zero"));
        }
        Ok(Self::from_bigint(&self.value % &other.value))
    }

    pub fn negate(&self) -> IntegerValue {
        Self::from_bigint(-self.value.clone())
    }

    pub fn abs(&self) -> IntegerValue {
        Self::from_bigint(self.value.abs())
    }

    /// Rounds at `precision` digits; only negative precision changes an integer.
    pub fn round(&self, precision: i64) -> IntegerValue {
        if precision >= 0 {
            return Self::from_bigint(self.value.clone());
        }
        let mode = if self.value.is_negative() {
            RoundingMode::HalfDown
        } else {
            RoundingMode::HalfUp
        };
        self.rounded(precision, mode)
    }

    pub fn round_half_to_even(&self, precision: i64) -> IntegerValue {
        if precision >= 0 {
            return Self::from_bigint(self.value.clone());
        }
        self.rounded(precision, RoundingMode::HalfEven)
    }

    fn rounded(&self, precision: i64, mode: RoundingMode) -> IntegerValue {
        let d = round_at(&BigDecimal::new(self.value.clone(), 0), precision, mode);
        Self::from_bigint(d.with_scale_round(0, RoundingMode::Down).as_bigint_and_exponent().0)
    }
}

impl fmt::Display for IntegerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}
