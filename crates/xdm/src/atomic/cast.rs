//! Casting between atomic types.
//!
//! Every source kind has one exhaustive arm. A pair with no rule is
//! `XPTY0004`; a target lexical form that does not parse is `FORG0001`.

use super::numeric::Numeric;
use super::{
    AtomicValue, BinaryEncoding, BinaryValue, DecimalValue, DoubleValue, FloatValue, IntegerKind,
    IntegerValue, QNameValue, StringKind, StringValue,
};
use crate::error::Error;
use crate::temporal::{DateTimeKind, DateTimeValue, DurationKind, DurationValue};
use crate::types::{XdmType, registry};
use num_bigint::BigInt;

impl AtomicValue {
    /// Builds a value of `target` from its lexical form, exactly as casting
    /// an `xs:string` would.
    pub fn parse(lexical: &str, target: XdmType) -> Result<AtomicValue, Error> {
        if let Some(kind) = StringKind::from_type(target) {
            return StringValue::new(kind, lexical).map(AtomicValue::String);
        }
        if let Some(kind) = IntegerKind::from_type(target) {
            return IntegerValue::parse(lexical, kind).map(AtomicValue::Integer);
        }
        if let Some(kind) = DateTimeKind::from_type(target) {
            return DateTimeValue::parse(kind, lexical).map(AtomicValue::DateTime);
        }
        if let Some(kind) = DurationKind::from_type(target) {
            return DurationValue::parse(kind, lexical).map(AtomicValue::Duration);
        }
        if let Some(encoding) = BinaryEncoding::from_type(target) {
            return BinaryValue::parse(encoding, lexical).map(AtomicValue::Binary);
        }
        match target {
            XdmType::UntypedAtomic => Ok(AtomicValue::UntypedAtomic(lexical.to_string())),
            XdmType::AnyUri => Ok(AtomicValue::AnyUri(
                super::string::collapse_xml_whitespace(lexical),
            )),
            XdmType::Boolean => match lexical.trim() {
                "true" | "1" => Ok(AtomicValue::Boolean(true)),
                "false" | "0" => Ok(AtomicValue::Boolean(false)),
                _ => Err(Error::invalid_lexical(target, lexical, "expected true, false, 1 or 0")),
            },
            XdmType::Decimal => DecimalValue::parse(lexical).map(AtomicValue::Decimal),
            XdmType::Double => DoubleValue::parse(lexical).map(AtomicValue::Double),
            XdmType::Float => FloatValue::parse(lexical).map(AtomicValue::Float),
            XdmType::QName => QNameValue::parse(lexical).map(AtomicValue::QName),
            _ => Err(Error::unsupported_cast(&AtomicValue::string(lexical), target)),
        }
    }

    /// Casts to `target`. Casting to the value's own type returns it
    /// unchanged; an abstract target accepts any value already below it.
    pub fn cast_to(&self, target: XdmType) -> Result<AtomicValue, Error> {
        let source = self.xdm_type();
        if source == target {
            return Ok(self.clone());
        }
        if !target.is_atomic() {
            return Err(Error::unsupported_cast(self, target));
        }
        if target.is_abstract() {
            return if registry().subtype_of(source, target)? {
                Ok(self.clone())
            } else {
                Err(Error::unsupported_cast(self, target))
            };
        }
        // Every type has a string form.
        if let Some(kind) = StringKind::from_type(target) {
            return StringValue::new(kind, &self.to_lexical()).map(AtomicValue::String);
        }
        if target == XdmType::UntypedAtomic {
            return Ok(AtomicValue::UntypedAtomic(self.to_lexical()));
        }
        match self {
            AtomicValue::String(_) | AtomicValue::UntypedAtomic(_) => {
                let lexical = self.as_str().unwrap_or_default();
                Self::parse(lexical, target)
            }
            AtomicValue::AnyUri(_) | AtomicValue::QName(_) => Err(Error::unsupported_cast(self, target)),
            AtomicValue::Boolean(b) => cast_boolean(self, *b, target),
            AtomicValue::Integer(_)
            | AtomicValue::Decimal(_)
            | AtomicValue::Float(_)
            | AtomicValue::Double(_) => {
                let num = Numeric::classify(self).ok_or_else(|| Error::unsupported_cast(self, target))?;
                cast_numeric(self, num, target)
            }
            AtomicValue::DateTime(dt) => cast_datetime(self, dt, target),
            AtomicValue::Duration(d) => match DurationKind::from_type(target) {
                Some(kind) => d.restricted_to(kind).map(AtomicValue::Duration),
                None => Err(Error::unsupported_cast(self, target)),
            },
            AtomicValue::Binary(b) => match BinaryEncoding::from_type(target) {
                Some(encoding) => Ok(AtomicValue::Binary(b.with_encoding(encoding))),
                None => Err(Error::unsupported_cast(self, target)),
            },
        }
    }

    /// True when `cast_to(target)` would not fail.
    pub fn castable_as(&self, target: XdmType) -> bool {
        self.cast_to(target).is_ok()
    }
}

fn cast_boolean(value: &AtomicValue, b: bool, target: XdmType) -> Result<AtomicValue, Error> {
    let one = i64::from(b);
    if let Some(kind) = IntegerKind::from_type(target) {
        return IntegerValue::new(BigInt::from(one), kind).map(AtomicValue::Integer);
    }
    match target {
        XdmType::Decimal => Ok(AtomicValue::Decimal(IntegerValue::from_i64(one).to_decimal())),
        XdmType::Double => Ok(AtomicValue::double(if b { 1.0 } else { 0.0 })),
        XdmType::Float => Ok(AtomicValue::float(if b { 1.0 } else { 0.0 })),
        _ => Err(Error::unsupported_cast(value, target)),
    }
}

fn cast_numeric(value: &AtomicValue, num: Numeric, target: XdmType) -> Result<AtomicValue, Error> {
    if let Some(kind) = IntegerKind::from_type(target) {
        let int = match &num {
            Numeric::Integer(i) => i.clone(),
            Numeric::Decimal(d) => IntegerValue::from_bigint(d.truncate()),
            Numeric::Float(f) => f.to_integer()?,
            Numeric::Double(d) => d.to_integer()?,
        };
        return int
            .with_kind(kind)
            .map(AtomicValue::Integer)
            .map_err(|e| Error::cast(e.code, e.message).with_value(value));
    }
    match target {
        XdmType::Boolean => Ok(AtomicValue::Boolean(value.effective_boolean()?)),
        XdmType::Decimal => match num {
            Numeric::Integer(i) => Ok(AtomicValue::Decimal(i.to_decimal())),
            Numeric::Decimal(d) => Ok(AtomicValue::Decimal(d)),
            Numeric::Float(f) => f.to_decimal().map(AtomicValue::Decimal),
            Numeric::Double(d) => d.to_decimal().map(AtomicValue::Decimal),
        },
        XdmType::Float => Ok(AtomicValue::float(num.to_f32())),
        XdmType::Double => Ok(AtomicValue::double(num.to_f64())),
        _ => Err(Error::unsupported_cast(value, target)),
    }
}

/// `xs:dateTime` narrows to every other date/time kind; `xs:date` widens to
/// `xs:dateTime` and narrows to the Gregorian kinds. Nothing else converts.
fn cast_datetime(
    value: &AtomicValue,
    dt: &DateTimeValue,
    target: XdmType,
) -> Result<AtomicValue, Error> {
    let Some(kind) = DateTimeKind::from_type(target) else {
        return Err(Error::unsupported_cast(value, target));
    };
    let allowed = match dt.kind() {
        DateTimeKind::DateTime => true,
        DateTimeKind::Date => kind != DateTimeKind::Time,
        _ => false,
    };
    if !allowed {
        return Err(Error::unsupported_cast(value, target));
    }
    dt.convert_to(kind).map(AtomicValue::DateTime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn double_nan_to_integer_is_foca0002() {
        let err = AtomicValue::double(f64::NAN)
            .cast_to(XdmType::Integer)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FOCA0002);
    }

    #[test]
    fn restricted_integer_range() {
        let err = AtomicValue::integer(300).cast_to(XdmType::Byte).unwrap_err();
        assert_eq!(err.code, ErrorCode::FORG0001);
        let ok = AtomicValue::integer(-3).cast_to(XdmType::NegativeInteger).unwrap();
        assert_eq!(ok.xdm_type(), XdmType::NegativeInteger);
    }

    #[test]
    fn time_does_not_cast_to_date() {
        let t = AtomicValue::parse("10:00:00", XdmType::Time).unwrap();
        assert_eq!(t.cast_to(XdmType::Date).unwrap_err().code, ErrorCode::XPTY0004);
    }
}
