//! Export of atomic values to host Rust types.
//!
//! Each value family ranks the host kinds it can convert to; a lower rank is
//! a better fit. Callers binding an overloaded host function pick the
//! candidate with the lowest rank.

use super::AtomicValue;
use crate::error::{Error, ErrorCode};
use crate::temporal::{DateTimeKind, DurationKind};
use crate::types::XdmType;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Rank of the generic fallback representation.
pub const ANY_PREFERENCE: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeKind {
    /// The atomic value itself.
    Xdm,
    /// Whatever representation fits best.
    Any,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U64,
    BigInt,
    Decimal,
    F32,
    F64,
    String,
    Char,
    Bytes,
    DateTime,
    NaiveDateTime,
    NaiveDate,
    NaiveTime,
    TimeDelta,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    Xdm(AtomicValue),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U64(u64),
    BigInt(BigInt),
    Decimal(BigDecimal),
    F32(f32),
    F64(f64),
    String(String),
    Char(char),
    Bytes(Vec<u8>),
    DateTime(chrono::DateTime<chrono::FixedOffset>),
    NaiveDateTime(chrono::NaiveDateTime),
    NaiveDate(chrono::NaiveDate),
    NaiveTime(chrono::NaiveTime),
    TimeDelta(chrono::TimeDelta),
}

use NativeKind as K;

const INTEGER_RANKS: &[(NativeKind, u32)] = &[
    (K::BigInt, 1),
    (K::I64, 2),
    (K::U64, 3),
    (K::I32, 4),
    (K::I16, 5),
    (K::I8, 6),
    (K::Decimal, 7),
    (K::F64, 8),
    (K::F32, 9),
    (K::String, 10),
    (K::Bool, 11),
];

const DECIMAL_RANKS: &[(NativeKind, u32)] = &[
    (K::Decimal, 1),
    (K::F64, 2),
    (K::F32, 3),
    (K::I64, 4),
    (K::I32, 5),
    (K::I16, 6),
    (K::I8, 7),
    (K::String, 8),
    (K::Bool, 9),
];

const FLOAT_RANKS: &[(NativeKind, u32)] = &[
    (K::F32, 1),
    (K::F64, 2),
    (K::I64, 3),
    (K::I32, 4),
    (K::I16, 5),
    (K::I8, 6),
    (K::String, 7),
    (K::Bool, 8),
];

const DOUBLE_RANKS: &[(NativeKind, u32)] = &[
    (K::F64, 1),
    (K::F32, 2),
    (K::I64, 3),
    (K::I32, 4),
    (K::I16, 5),
    (K::I8, 6),
    (K::String, 7),
    (K::Bool, 8),
];

const STRING_RANKS: &[(NativeKind, u32)] = &[
    (K::String, 1),
    (K::Char, 2),
    (K::F64, 10),
    (K::F32, 11),
    (K::I64, 12),
    (K::I32, 13),
    (K::I16, 14),
    (K::I8, 15),
    (K::Bool, 16),
];

const BOOLEAN_RANKS: &[(NativeKind, u32)] = &[
    (K::Bool, 1),
    (K::I64, 2),
    (K::I32, 3),
    (K::I16, 4),
    (K::I8, 5),
    (K::String, 6),
];

const DATE_TIME_RANKS: &[(NativeKind, u32)] =
    &[(K::NaiveDateTime, 1), (K::DateTime, 2), (K::String, 3)];
const DATE_RANKS: &[(NativeKind, u32)] = &[(K::NaiveDate, 1), (K::String, 3)];
const TIME_RANKS: &[(NativeKind, u32)] = &[(K::NaiveTime, 1), (K::String, 3)];
const DAY_TIME_RANKS: &[(NativeKind, u32)] = &[(K::TimeDelta, 1), (K::String, 2)];
const BINARY_RANKS: &[(NativeKind, u32)] = &[(K::Bytes, 1), (K::String, 2)];
const STRING_ONLY: &[(NativeKind, u32)] = &[(K::String, 1)];

fn out_of_range(value: &AtomicValue, kind: NativeKind) -> Error {
    Error::cast(
        ErrorCode::FOCA0003,
        format!("{} does not fit {kind:?}", value.to_lexical()),
    )
    .with_value(value)
}

impl AtomicValue {
    fn native_ranks(&self) -> &'static [(NativeKind, u32)] {
        match self {
            AtomicValue::Integer(_) => INTEGER_RANKS,
            AtomicValue::Decimal(_) => DECIMAL_RANKS,
            AtomicValue::Float(_) => FLOAT_RANKS,
            AtomicValue::Double(_) => DOUBLE_RANKS,
            AtomicValue::String(_) | AtomicValue::UntypedAtomic(_) | AtomicValue::AnyUri(_) => {
                STRING_RANKS
            }
            AtomicValue::Boolean(_) => BOOLEAN_RANKS,
            AtomicValue::DateTime(dt) => match dt.kind() {
                DateTimeKind::DateTime => DATE_TIME_RANKS,
                DateTimeKind::Date => DATE_RANKS,
                DateTimeKind::Time => TIME_RANKS,
                _ => STRING_ONLY,
            },
            AtomicValue::Duration(d) if d.kind() == DurationKind::DayTime => DAY_TIME_RANKS,
            AtomicValue::Duration(_) | AtomicValue::QName(_) => STRING_ONLY,
            AtomicValue::Binary(_) => BINARY_RANKS,
        }
    }

    /// Rank of `kind` for this value; `None` when it cannot convert.
    pub fn conversion_preference(&self, kind: NativeKind) -> Option<u32> {
        match kind {
            NativeKind::Xdm => Some(0),
            NativeKind::Any => Some(ANY_PREFERENCE),
            _ => self
                .native_ranks()
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, rank)| *rank),
        }
    }

    /// Best-ranked host kind for this value.
    pub fn natural_native_kind(&self) -> NativeKind {
        self.native_ranks()
            .iter()
            .min_by_key(|(_, rank)| *rank)
            .map_or(NativeKind::String, |(k, _)| *k)
    }

    fn integral(&self) -> Result<BigInt, Error> {
        match self {
            AtomicValue::Integer(i) => Ok(i.as_bigint().clone()),
            AtomicValue::Decimal(d) => Ok(d.truncate()),
            AtomicValue::Float(f) => f.to_integer().map(|i| i.as_bigint().clone()),
            AtomicValue::Double(d) => d.to_integer().map(|i| i.as_bigint().clone()),
            AtomicValue::Boolean(b) => Ok(BigInt::from(u8::from(*b))),
            _ => match self.cast_to(XdmType::Integer)? {
                AtomicValue::Integer(i) => Ok(i.as_bigint().clone()),
                other => Err(Error::unsupported_cast(&other, XdmType::Integer)),
            },
        }
    }

    /// Converts to the host representation `kind`. Unsupported kinds are
    /// `XPTY0004`; values that do not fit are `FOCA0003`.
    pub fn to_native(&self, kind: NativeKind) -> Result<NativeValue, Error> {
        if self.conversion_preference(kind).is_none() {
            return Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("{} has no {kind:?} representation", self.xdm_type()),
            )
            .with_value(self));
        }
        let range = || out_of_range(self, kind);
        Ok(match kind {
            NativeKind::Xdm => NativeValue::Xdm(self.clone()),
            NativeKind::Any => return self.to_native(self.natural_native_kind()),
            NativeKind::Bool => match self.cast_to(XdmType::Boolean)? {
                AtomicValue::Boolean(b) => NativeValue::Bool(b),
                other => return Err(Error::unsupported_cast(&other, XdmType::Boolean)),
            },
            NativeKind::I8 => NativeValue::I8(self.integral()?.to_i8().ok_or_else(range)?),
            NativeKind::I16 => NativeValue::I16(self.integral()?.to_i16().ok_or_else(range)?),
            NativeKind::I32 => NativeValue::I32(self.integral()?.to_i32().ok_or_else(range)?),
            NativeKind::I64 => NativeValue::I64(self.integral()?.to_i64().ok_or_else(range)?),
            NativeKind::U64 => NativeValue::U64(self.integral()?.to_u64().ok_or_else(range)?),
            NativeKind::BigInt => NativeValue::BigInt(self.integral()?),
            NativeKind::Decimal => match self.cast_to(XdmType::Decimal)? {
                AtomicValue::Decimal(d) => NativeValue::Decimal(d.into_big()),
                other => return Err(Error::unsupported_cast(&other, XdmType::Decimal)),
            },
            NativeKind::F64 => match self.cast_to(XdmType::Double)? {
                AtomicValue::Double(d) => NativeValue::F64(d.0),
                other => return Err(Error::unsupported_cast(&other, XdmType::Double)),
            },
            NativeKind::F32 => match self.cast_to(XdmType::Float)? {
                AtomicValue::Float(f) => NativeValue::F32(f.0),
                other => return Err(Error::unsupported_cast(&other, XdmType::Float)),
            },
            NativeKind::String => NativeValue::String(self.to_lexical()),
            NativeKind::Char => {
                let text = self.to_lexical();
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => NativeValue::Char(c),
                    _ => return Err(range()),
                }
            }
            NativeKind::Bytes => match self {
                AtomicValue::Binary(b) => NativeValue::Bytes(b.as_bytes().to_vec()),
                _ => return Err(range()),
            },
            NativeKind::DateTime => match self {
                AtomicValue::DateTime(dt) => NativeValue::DateTime(dt.to_chrono().ok_or_else(range)?),
                _ => return Err(range()),
            },
            NativeKind::NaiveDateTime => match self {
                AtomicValue::DateTime(dt) => {
                    NativeValue::NaiveDateTime(dt.to_naive_date_time().ok_or_else(range)?)
                }
                _ => return Err(range()),
            },
            NativeKind::NaiveDate => match self {
                AtomicValue::DateTime(dt) => NativeValue::NaiveDate(dt.to_naive_date().ok_or_else(range)?),
                _ => return Err(range()),
            },
            NativeKind::NaiveTime => match self {
                AtomicValue::DateTime(dt) => NativeValue::NaiveTime(dt.to_naive_time().ok_or_else(range)?),
                _ => return Err(range()),
            },
            NativeKind::TimeDelta => match self {
                AtomicValue::Duration(d) => NativeValue::TimeDelta(d.to_time_delta().ok_or_else(range)?),
                _ => return Err(range()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_prefers_decimal_then_doubles() {
        let v = AtomicValue::parse("1.5", XdmType::Decimal).unwrap();
        let d = v.conversion_preference(NativeKind::Decimal).unwrap();
        let f64_rank = v.conversion_preference(NativeKind::F64).unwrap();
        let f32_rank = v.conversion_preference(NativeKind::F32).unwrap();
        let i64_rank = v.conversion_preference(NativeKind::I64).unwrap();
        assert!(d < f64_rank && f64_rank < f32_rank && f32_rank < i64_rank);
        assert_eq!(v.conversion_preference(NativeKind::Bytes), None);
    }

    #[test]
    fn narrowing_reports_range() {
        let v = AtomicValue::integer(1000);
        assert_eq!(v.to_native(NativeKind::I16).unwrap(), NativeValue::I16(1000));
        assert_eq!(v.to_native(NativeKind::I8).unwrap_err().code, ErrorCode::FOCA0003);
        assert_eq!(v.to_native(NativeKind::Bytes).unwrap_err().code, ErrorCode::XPTY0004);
    }
}
