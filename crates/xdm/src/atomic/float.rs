//! `xs:double` and `xs:float`.

use super::decimal::{DecimalValue, decimal_from_f64, round_at};
use super::integer::IntegerValue;
use crate::error::{Error, ErrorCode};
use crate::types::XdmType;
use bigdecimal::RoundingMode;
use core::fmt;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

/// Accepts the XSD floating point grammar: an optionally signed mantissa
/// with optional exponent, `INF`, `+INF`, `-INF` or `NaN`.
fn is_ieee_lexical(s: &str) -> bool {
    if matches!(s, "INF" | "+INF" | "-INF" | "NaN") {
        return true;
    }
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mantissa_ok = !(int.is_empty() && frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit());
    let exponent_ok = exponent.is_none_or(|e| {
        let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    });
    mantissa_ok && exponent_ok
}

fn parse_ieee(input: &str, target: XdmType) -> Result<f64, Error> {
    let s = input.trim();
    if !is_ieee_lexical(s) {
        return Err(Error::invalid_lexical(target, input, "not a floating point number"));
    }
    Ok(match s {
        "INF" | "+INF" => f64::INFINITY,
        "-INF" => f64::NEG_INFINITY,
        "NaN" => f64::NAN,
        _ => s
            .parse::<f64>()
            .map_err(|e| Error::invalid_lexical(target, input, e))?,
    })
}

/// Canonical form: plain notation inside `[1e-6, 1e6)`, otherwise
/// `mantissa E exponent` with at least one fractional mantissa digit.
fn format_ieee(x: f64, plain: String, scientific: String) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let abs = x.abs();
    if (1e-6..1e6).contains(&abs) {
        return plain;
    }
    match scientific.split_once('E') {
        Some((mantissa, exp)) if !mantissa.contains('.') => format!("{mantissa}.0E{exp}"),
        _ => scientific,
    }
}

/// `fn:round` on IEEE values: halves toward positive infinity, negative
/// zero preserved for inputs in `[-0.5, 0)`.
fn round_half_ceiling(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let f = x.floor();
    let r = if x - f >= 0.5 { f + 1.0 } else { f };
    if r == 0.0 && x < 0.0 { -0.0 } else { r }
}

fn round_half_even_at(x: f64, precision: i64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let Some(d) = decimal_from_f64(x) else {
        return x;
    };
    let r = round_at(&d, precision, RoundingMode::HalfEven)
        .to_f64()
        .unwrap_or(x);
    if r == 0.0 && x < 0.0 { -0.0 } else { r }
}

/// Integer quotient of two IEEE values truncated toward zero.
fn ieee_idiv(a: f64, b: f64) -> Result<IntegerValue, Error> {
    if b == 0.0 {
        return Err(Error::domain(ErrorCode::FOAR0001, "integer division by zero"));
    }
    if a.is_nan() || b.is_nan() || a.is_infinite() {
        return Err(Error::domain(
            ErrorCode::FOAR0002,
            format!("integer division of {a} by {b} has no integer result"),
        ));
    }
    let q = (a / b).trunc();
    BigInt::from_f64(q)
        .map(IntegerValue::from_bigint)
        .ok_or_else(|| Error::domain(ErrorCode::FOAR0002, "integer division overflow"))
}

fn ieee_to_integer(x: f64) -> Result<IntegerValue, Error> {
    if !x.is_finite() {
        return Err(Error::cast(
            ErrorCode::FOCA0002,
            format!("cannot convert {x} to xs:integer"),
        ));
    }
    BigInt::from_f64(x.trunc())
        .map(IntegerValue::from_bigint)
        .ok_or_else(|| Error::cast(ErrorCode::FOCA0003, "value too large for xs:integer"))
}

/// 64-bit IEEE 754 value.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct DoubleValue(pub f64);

impl DoubleValue {
    pub fn parse(input: &str) -> Result<Self, Error> {
        parse_ieee(input, XdmType::Double).map(Self)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }

    pub fn to_lexical(self) -> String {
        format_ieee(self.0, format!("{}", self.0), format!("{:E}", self.0))
    }

    pub fn to_decimal(self) -> Result<DecimalValue, Error> {
        DecimalValue::from_f64(self.0)
    }

    pub fn to_integer(self) -> Result<IntegerValue, Error> {
        ieee_to_integer(self.0)
    }

    pub fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }

    pub fn div(self, other: Self) -> Self {
        Self(self.0 / other.0)
    }

    pub fn idiv(self, other: Self) -> Result<IntegerValue, Error> {
        ieee_idiv(self.0, other.0)
    }

    pub fn rem(self, other: Self) -> Self {
        Self(self.0 % other.0)
    }

    pub fn negate(self) -> Self {
        Self(-self.0)
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn ceiling(self) -> Self {
        Self(self.0.ceil())
    }

    pub fn floor(self) -> Self {
        Self(self.0.floor())
    }

    pub fn round(self) -> Self {
        Self(round_half_ceiling(self.0))
    }

    pub fn round_half_to_even(self, precision: i64) -> Self {
        Self(round_half_even_at(self.0, precision))
    }
}

impl fmt::Display for DoubleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

/// 32-bit IEEE 754 value.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct FloatValue(pub f32);

impl FloatValue {
    pub fn parse(input: &str) -> Result<Self, Error> {
        let wide = parse_ieee(input, XdmType::Float)?;
        if !wide.is_finite() {
            return Ok(Self(wide as f32));
        }
        // Parse again at single precision so rounding happens once.
        let s = input.trim();
        s.parse::<f32>()
            .map(Self)
            .map_err(|e| Error::invalid_lexical(XdmType::Float, input, e))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0)
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }

    pub fn to_lexical(self) -> String {
        format_ieee(self.to_f64(), format!("{}", self.0), format!("{:E}", self.0))
    }

    pub fn to_decimal(self) -> Result<DecimalValue, Error> {
        DecimalValue::from_f32(self.0)
    }

    pub fn to_integer(self) -> Result<IntegerValue, Error> {
        ieee_to_integer(self.to_f64())
    }

    pub fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }

    pub fn div(self, other: Self) -> Self {
        Self(self.0 / other.0)
    }

    pub fn idiv(self, other: Self) -> Result<IntegerValue, Error> {
        ieee_idiv(self.to_f64(), other.to_f64())
    }

    pub fn rem(self, other: Self) -> Self {
        Self(self.0 % other.0)
    }

    pub fn negate(self) -> Self {
        Self(-self.0)
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn ceiling(self) -> Self {
        Self(self.0.ceil())
    }

    pub fn floor(self) -> Self {
        Self(self.0.floor())
    }

    pub fn round(self) -> Self {
        Self(round_half_ceiling(self.to_f64()) as f32)
    }

    pub fn round_half_to_even(self, precision: i64) -> Self {
        if !self.0.is_finite() || self.0 == 0.0 {
            return self;
        }
        let Ok(d) = self.to_decimal() else {
            return self;
        };
        let r = round_at(d.as_big(), precision, RoundingMode::HalfEven)
            .to_f32()
            .unwrap_or(self.0);
        Self(if r == 0.0 && self.0 < 0.0 { -0.0 } else { r })
    }
}

impl fmt::Display for FloatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1e6, "1.0E6")]
    #[case(1.5e-7, "1.5E-7")]
    #[case(123.25, "123.25")]
    #[case(0.000001, "0.000001")]
    #[case(-0.0, "-0")]
    #[case(f64::NEG_INFINITY, "-INF")]
    fn double_canonical_form(#[case] x: f64, #[case] want: &str) {
        assert_eq!(DoubleValue(x).to_lexical(), want);
    }

    #[rstest]
    #[case("inf")]
    #[case("Infinity")]
    #[case("1e")]
    #[case(".")]
    #[case("0x10")]
    fn rejects_non_xsd_spellings(#[case] s: &str) {
        assert!(DoubleValue::parse(s).is_err());
    }

    #[test]
    fn round_keeps_negative_zero() {
        let r = DoubleValue(-0.5).round().0;
        assert_eq!(r, 0.0);
        assert!(r.is_sign_negative());
        assert_eq!(DoubleValue(2.5).round().0, 3.0);
        assert_eq!(DoubleValue(-2.5).round().0, -2.0);
        assert_eq!(DoubleValue(0.49999999999999994).round().0, 0.0);
    }
}
