//! Order-preserving byte keys for atomic values.
//!
//! A key is a family tag followed by a payload whose unsigned byte order
//! matches `order_compare` for values of that family.

use super::AtomicValue;
use crate::context::XdmContext;
use crate::error::{Error, ErrorCode};
use crate::temporal::{DateTimeKind, DurationKind};
use bigdecimal::RoundingMode;
use num_traits::ToPrimitive;

const TAG_BOOLEAN: u8 = 0x01;
const TAG_NUMERIC: u8 = 0x02;
const TAG_STRING: u8 = 0x03;
const TAG_DATE_TIME: u8 = 0x04;
const TAG_DURATION: u8 = 0x05;
const TAG_BINARY: u8 = 0x06;
const TAG_QNAME: u8 = 0x07;

/// IEEE bits rearranged so that unsigned comparison follows numeric order.
/// NaN maps below negative infinity and both zeros share one key.
fn f64_key(x: f64) -> [u8; 8] {
    if x.is_nan() {
        return [0; 8];
    }
    let x = if x == 0.0 { 0.0 } else { x };
    let bits = x.to_bits();
    let ordered = if x.is_sign_negative() {
        !bits
    } else {
        bits | (1 << 63)
    };
    ordered.to_be_bytes()
}

fn i64_key(v: i64) -> [u8; 8] {
    (v.cast_unsigned() ^ (1 << 63)).to_be_bytes()
}

fn i128_key(v: i128) -> [u8; 16] {
    (v.cast_unsigned() ^ (1 << 127)).to_be_bytes()
}

fn date_time_tag(kind: DateTimeKind) -> u8 {
    match kind {
        DateTimeKind::DateTime => 0,
        DateTimeKind::Date => 1,
        DateTimeKind::Time => 2,
        DateTimeKind::GYearMonth => 3,
        DateTimeKind::GYear => 4,
        DateTimeKind::GMonthDay => 5,
        DateTimeKind::GDay => 6,
        DateTimeKind::GMonth => 7,
    }
}

impl AtomicValue {
    /// Encodes this value as an index key. Strings use the context's default
    /// collation key; date/time values without a timezone are normalized
    /// with the implicit timezone.
    pub fn index_key(&self, ctx: &XdmContext) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(16);
        match self {
            AtomicValue::Boolean(b) => {
                out.push(TAG_BOOLEAN);
                out.push(u8::from(*b));
            }
            AtomicValue::Integer(_)
            | AtomicValue::Decimal(_)
            | AtomicValue::Float(_)
            | AtomicValue::Double(_) => {
                let x = super::Numeric::classify(self).map_or(f64::NAN, |n| n.to_f64());
                out.push(TAG_NUMERIC);
                out.extend_from_slice(&f64_key(x));
            }
            AtomicValue::String(_) | AtomicValue::UntypedAtomic(_) | AtomicValue::AnyUri(_) => {
                out.push(TAG_STRING);
                let s = self.as_str().unwrap_or_default();
                out.extend_from_slice(ctx.default_collation().key(s).as_bytes());
            }
            AtomicValue::DateTime(dt) => {
                let m = dt.instant(ctx.implicit_timezone());
                out.push(TAG_DATE_TIME);
                out.push(date_time_tag(dt.kind()));
                out.extend_from_slice(&i64_key(m.seconds));
                out.extend_from_slice(&m.nanos.to_be_bytes());
            }
            AtomicValue::Duration(d) => {
                let nanos = d
                    .total_seconds()
                    .with_scale_round(9, RoundingMode::HalfEven)
                    .as_bigint_and_exponent()
                    .0
                    .to_i128()
                    .ok_or_else(|| {
                        Error::domain(ErrorCode::FODT0002, "duration too large for an index key")
                    })?;
                out.push(TAG_DURATION);
                match d.kind() {
                    DurationKind::YearMonth => {
                        out.push(1);
                        out.extend_from_slice(&i64_key(d.total_months()));
                    }
                    DurationKind::DayTime => {
                        out.push(2);
                        out.extend_from_slice(&i128_key(nanos));
                    }
                    DurationKind::Duration => {
                        out.push(0);
                        out.extend_from_slice(&i64_key(d.total_months()));
                        out.extend_from_slice(&i128_key(nanos));
                    }
                }
            }
            AtomicValue::Binary(b) => {
                out.push(TAG_BINARY);
                out.push(u8::from(b.encoding() == super::BinaryEncoding::Hex));
                out.extend_from_slice(b.as_bytes());
            }
            AtomicValue::QName(q) => {
                out.push(TAG_QNAME);
                out.extend_from_slice(q.ns_uri.as_deref().unwrap_or("").as_bytes());
                out.push(0);
                out.extend_from_slice(q.local.as_bytes());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_follow_numeric_order() {
        let xs = [f64::NAN, f64::NEG_INFINITY, -2.5, -0.0, 0.0, 1e-300, 3.0, f64::INFINITY];
        let keys: Vec<_> = xs.iter().map(|x| f64_key(*x)).collect();
        for pair in keys.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert_eq!(f64_key(-0.0), f64_key(0.0));
    }

    #[test]
    fn signed_keys() {
        assert!(i64_key(-1) < i64_key(0));
        assert!(i64_key(i64::MIN) < i64_key(-1));
        assert!(i128_key(-5) < i128_key(7));
    }
}
