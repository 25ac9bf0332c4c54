use super::integer::IntegerValue;
use crate::error::{Error, ErrorCode};
use crate::types::XdmType;
use bigdecimal::{BigDecimal, RoundingMode};
use core::fmt;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};
use std::str::FromStr;

/// Minimum number of fractional digits kept by decimal division.
const DIVIDE_PRECISION: i64 = 18;

/// `xs:decimal`: exact, held without trailing fractional zeros.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DecimalValue(BigDecimal);

impl DecimalValue {
    pub fn new(value: BigDecimal) -> Self {
        Self(value.normalized())
    }

    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    /// Parses `[+-]?(digits(.digits?)?|.digits)`; no exponent.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let s = input.trim();
        let body = s.strip_prefix(['+', '-']).unwrap_or(s);
        let (int, frac) = body.split_once('.').unwrap_or((body, ""));
        let well_formed = !(int.is_empty() && frac.is_empty())
            && int.bytes().all(|b| b.is_ascii_digit())
            && frac.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(Error::invalid_lexical(XdmType::Decimal, input, "not a decimal"));
        }
        let sign = if s.starts_with('-') { "-" } else { "" };
        let int = if int.is_empty() { "0" } else { int };
        let text = if frac.is_empty() {
            format!("{sign}{int}")
        } else {
            format!("{sign}{int}.{frac}")
        };
        BigDecimal::from_str(&text)
            .map(Self::new)
            .map_err(|e| Error::invalid_lexical(XdmType::Decimal, input, e))
    }

    /// NaN and infinities have no decimal value (`FOCA0002`).
    pub fn from_f64(x: f64) -> Result<Self, Error> {
        decimal_from_f64(x).map(Self::new).ok_or_else(|| {
            Error::cast(ErrorCode::FOCA0002, format!("cannot convert {x} to xs:decimal"))
        })
    }

    pub fn from_f32(x: f32) -> Result<Self, Error> {
        if !x.is_finite() {
            return Self::from_f64(f64::from(x));
        }
        BigDecimal::from_str(&x.to_string())
            .map(Self::new)
            .map_err(|e| Error::cast(ErrorCode::FOCA0002, e.to_string()))
    }

    pub fn as_big(&self) -> &BigDecimal {
        &self.0
    }

    pub fn into_big(self) -> BigDecimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Nearest double, rounded once from the exact decimal text.
    pub fn to_f64(&self) -> f64 {
        self.to_lexical().parse().unwrap_or(f64::NAN)
    }

    pub fn to_lexical(&self) -> String {
        plain_string(&self.0)
    }

    /// Integer part, truncated toward zero.
    pub fn truncate(&self) -> BigInt {
        self.0.with_scale_round(0, RoundingMode::Down).as_bigint_and_exponent().0
    }

    pub fn add(&self, other: &DecimalValue) -> DecimalValue {
        Self::new(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &DecimalValue) -> DecimalValue {
        Self::new(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &DecimalValue) -> DecimalValue {
        Self::new(&self.0 * &other.0)
    }

    pub fn div(&self, other: &DecimalValue) -> Result<DecimalValue, Error> {
        if other.is_zero() {
            return Err(division_by_zero());
        }
        Ok(Self::new(divide(&self.0, &other.0)))
    }

    pub fn idiv(&self, other: &DecimalValue) -> Result<IntegerValue, Error> {
        if other.is_zero() {
            return Err(division_by_zero());
        }
        let q = (&self.0 / &other.0).with_scale_round(0, RoundingMode::Down);
        Ok(IntegerValue::from_bigint(q.as_bigint_and_exponent().0))
    }

    /// Remainder with the sign of the dividend.
    pub fn rem(&self, other: &DecimalValue) -> Result<DecimalValue, Error> {
        if other.is_zero() {
            return Err(division_by_zero());
        }
        let q = (&self.0 / &other.0).with_scale_round(0, RoundingMode::Down);
        Ok(Self::new(&self.0 - q * &other.0))
    }

    pub fn negate(&self) -> DecimalValue {
        Self(-self.0.clone())
    }

    pub fn abs(&self) -> DecimalValue {
        Self(self.0.abs())
    }

    pub fn ceiling(&self) -> DecimalValue {
        Self::new(self.0.with_scale_round(0, RoundingMode::Ceiling))
    }

    pub fn floor(&self) -> DecimalValue {
        Self::new(self.0.with_scale_round(0, RoundingMode::Floor))
    }

    /// `fn:round`: halves go toward positive infinity.
    pub fn round(&self) -> DecimalValue {
        Self::new(round_half_ceiling(&self.0))
    }

    pub fn round_half_to_even(&self, precision: i64) -> DecimalValue {
        Self::new(round_at(&self.0, precision, RoundingMode::HalfEven))
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

fn division_by_zero() -> Error {
    Error::domain(ErrorCode::FOAR0001, "division by zero")
}

/// Quotient kept to at least 18 fractional digits, ties toward zero.
pub(crate) fn divide(num: &BigDecimal, den: &BigDecimal) -> BigDecimal {
    let scale = DIVIDE_PRECISION
        .max(num.as_bigint_and_exponent().1)
        .max(den.as_bigint_and_exponent().1);
    (num / den)
        .with_scale_round(scale, RoundingMode::HalfDown)
        .normalized()
}

/// Rounds to an integral value with halves going toward positive infinity.
pub(crate) fn round_half_ceiling(d: &BigDecimal) -> BigDecimal {
    let mode = if d.is_negative() {
        RoundingMode::HalfDown
    } else {
        RoundingMode::HalfUp
    };
    d.with_scale_round(0, mode)
}

/// Rounds `d` to `precision` fractional digits; negative precision rounds
/// to tens, hundreds and so on.
pub(crate) fn round_at(d: &BigDecimal, precision: i64, mode: RoundingMode) -> BigDecimal {
    if precision >= 0 {
        return d.with_scale_round(precision, mode);
    }
    let shift = u32::try_from(precision.unsigned_abs()).unwrap_or(u32::MAX);
    let factor = BigDecimal::new(BigInt::from(10).pow(shift), 0);
    (d / &factor).with_scale_round(0, mode) * factor
}

/// Shortest decimal that round-trips through `x`; `None` for NaN and infinities.
pub(crate) fn decimal_from_f64(x: f64) -> Option<BigDecimal> {
    if !x.is_finite() {
        return None;
    }
    BigDecimal::from_str(&x.to_string()).ok()
}

/// Plain notation without exponent and without trailing fractional zeros.
pub(crate) fn plain_string(d: &BigDecimal) -> String {
    let n = d.normalized();
    let (digits, scale) = n.as_bigint_and_exponent();
    if digits.is_zero() {
        return "0".to_string();
    }
    let mut out = String::new();
    if digits.sign() == Sign::Minus {
        out.push('-');
    }
    let mag = digits.magnitude().to_string();
    if scale <= 0 {
        out.push_str(&mag);
        let zeros = usize::try_from(scale.unsigned_abs()).unwrap_or(0);
        out.extend(core::iter::repeat_n('0', zeros));
        return out;
    }
    let scale = usize::try_from(scale).unwrap_or(usize::MAX);
    if mag.len() <= scale {
        out.push_str("0.");
        out.extend(core::iter::repeat_n('0', scale - mag.len()));
        out.push_str(&mag);
    } else {
        let (int, frac) = mag.split_at(mag.len() - scale);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    }
    out
}
