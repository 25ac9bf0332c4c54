//! `xs:duration` and its two totally ordered subtypes.
//!
//! A value keeps the fields exactly as parsed. The canonical form (signed
//! month total, signed second total and the minimal field split derived from
//! them) is computed on first use and cached.

use crate::atomic::decimal::{decimal_from_f64, plain_string, round_half_ceiling};
use crate::error::{Error, ErrorCode, ErrorKind};
use crate::types::XdmType;
use bigdecimal::{BigDecimal, RoundingMode};
use core::cmp::Ordering;
use core::fmt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::sync::OnceLock;
use std::str::FromStr;

/// Largest magnitude accepted for a single lexical component.
const MAX_COMPONENT: u64 = 1_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DurationKind {
    Duration,
    YearMonth,
    DayTime,
}

impl DurationKind {
    pub fn xdm_type(self) -> XdmType {
        match self {
            DurationKind::Duration => XdmType::Duration,
            DurationKind::YearMonth => XdmType::YearMonthDuration,
            DurationKind::DayTime => XdmType::DayTimeDuration,
        }
    }

    pub fn from_type(t: XdmType) -> Option<Self> {
        match t {
            XdmType::Duration => Some(DurationKind::Duration),
            XdmType::YearMonthDuration => Some(DurationKind::YearMonth),
            XdmType::DayTimeDuration => Some(DurationKind::DayTime),
            _ => None,
        }
    }

    /// Year-month and day-time durations are totally ordered; the base type is not.
    pub fn is_ordered(self) -> bool {
        self != DurationKind::Duration
    }
}

/// Unsigned components plus an overall sign, as written in `-PnYnMnDTnHnMnS`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DurationFields {
    pub negative: bool,
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: BigDecimal,
}

#[derive(Clone, Debug)]
struct Canonical {
    months: i64,
    seconds: BigDecimal,
    fields: DurationFields,
}

#[derive(Clone, Debug)]
pub struct DurationValue {
    kind: DurationKind,
    raw: DurationFields,
    canonical: OnceLock<Canonical>,
}

impl PartialEq for DurationValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value_eq(other)
    }
}

impl DurationValue {
    /// Builds a value from raw fields, checking that `kind` allows them.
    pub fn from_fields(kind: DurationKind, fields: DurationFields) -> Result<Self, Error> {
        let too_big = [
            fields.years,
            fields.months,
            fields.days,
            fields.hours,
            fields.minutes,
        ]
        .iter()
        .any(|c| *c > MAX_COMPONENT)
            || fields.seconds.abs() > BigDecimal::from(MAX_COMPONENT);
        if too_big {
            return Err(Error::domain(
                ErrorCode::FODT0002,
                "duration component is too large",
            ));
        }
        if fields.seconds.is_negative() {
            return Err(Error::construction(
                "duration seconds must be unsigned; use the sign flag",
            ));
        }
        let has_ym = fields.years != 0 || fields.months != 0;
        let has_dt = fields.days != 0
            || fields.hours != 0
            || fields.minutes != 0
            || !fields.seconds.is_zero();
        match kind {
            DurationKind::YearMonth if has_dt => Err(Error::construction(
                "xs:yearMonthDuration cannot carry day or time components",
            )),
            DurationKind::DayTime if has_ym => Err(Error::construction(
                "xs:dayTimeDuration cannot carry year or month components",
            )),
            _ => Ok(Self {
                kind,
                raw: fields,
                canonical: OnceLock::new(),
            }),
        }
    }

    /// Builds a value from signed totals. Mixed signs are rejected.
    pub fn from_totals(kind: DurationKind, months: i64, seconds: BigDecimal) -> Result<Self, Error> {
        if (months < 0 && seconds.is_positive()) || (months > 0 && seconds.is_negative()) {
            return Err(Error::domain(
                ErrorCode::FODT0002,
                "duration months and seconds have opposite signs",
            ));
        }
        let fields = split_totals(months, &seconds)?;
        Self::from_fields(kind, fields)
    }

    pub fn zero(kind: DurationKind) -> Self {
        Self {
            kind,
            raw: DurationFields::default(),
            canonical: OnceLock::new(),
        }
    }

    pub fn year_month(months: i64) -> Result<Self, Error> {
        Self::from_totals(DurationKind::YearMonth, months, BigDecimal::zero())
    }

    pub fn day_time(seconds: BigDecimal) -> Result<Self, Error> {
        Self::from_totals(DurationKind::DayTime, 0, seconds)
    }

    pub fn kind(&self) -> DurationKind {
        self.kind
    }

    pub fn xdm_type(&self) -> XdmType {
        self.kind.xdm_type()
    }

    /// Fields as originally supplied.
    pub fn raw_fields(&self) -> &DurationFields {
        &self.raw
    }

    fn canonical(&self) -> &Canonical {
        self.canonical.get_or_init(|| {
            let r = &self.raw;
            let sign: i64 = if r.negative { -1 } else { 1 };
            // components are bounded by MAX_COMPONENT, so these fit in i64
            let months = sign * (to_i64(r.years) * 12 + to_i64(r.months));
            let whole = to_i64(r.days) * 86_400 + to_i64(r.hours) * 3600 + to_i64(r.minutes) * 60;
            let mut seconds = BigDecimal::from(whole) + &r.seconds;
            if r.negative {
                seconds = -seconds;
            }
            let seconds = seconds.normalized();
            let fields = split_totals(months, &seconds).unwrap_or_default();
            Canonical {
                months,
                seconds,
                fields,
            }
        })
    }

    /// Signed month total.
    pub fn total_months(&self) -> i64 {
        self.canonical().months
    }

    /// Signed second total.
    pub fn total_seconds(&self) -> &BigDecimal {
        &self.canonical().seconds
    }

    /// Minimal field split of this duration.
    pub fn canonical_fields(&self) -> &DurationFields {
        &self.canonical().fields
    }

    /// Same duration with its raw fields replaced by the canonical split.
    pub fn canonicalize(&self) -> DurationValue {
        let c = self.canonical();
        DurationValue {
            kind: self.kind,
            raw: c.fields.clone(),
            canonical: OnceLock::from(c.clone()),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total_months() == 0 && self.total_seconds().is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.total_months() < 0 || self.total_seconds().is_negative()
    }

    pub fn years(&self) -> i64 {
        self.signed(self.canonical_fields().years)
    }

    pub fn months(&self) -> i64 {
        self.signed(self.canonical_fields().months)
    }

    pub fn days(&self) -> i64 {
        self.signed(self.canonical_fields().days)
    }

    pub fn hours(&self) -> i64 {
        self.signed(self.canonical_fields().hours)
    }

    pub fn minutes(&self) -> i64 {
        self.signed(self.canonical_fields().minutes)
    }

    pub fn seconds(&self) -> BigDecimal {
        let s = self.canonical_fields().seconds.clone();
        if self.canonical_fields().negative { -s } else { s }
    }

    fn signed(&self, v: u64) -> i64 {
        let v = to_i64(v);
        if self.canonical_fields().negative { -v } else { v }
    }

    /// Re-tags this duration as `kind`, dropping components `kind` cannot hold.
    pub fn restricted_to(&self, kind: DurationKind) -> Result<Self, Error> {
        let (months, seconds) = match kind {
            DurationKind::Duration => (self.total_months(), self.total_seconds().clone()),
            DurationKind::YearMonth => (self.total_months(), BigDecimal::zero()),
            DurationKind::DayTime => (0, self.total_seconds().clone()),
        };
        Self::from_totals(kind, months, seconds)
    }

    pub fn negate(&self) -> Result<Self, Error> {
        let months = self
            .total_months()
            .checked_neg()
            .ok_or_else(|| overflow("negation"))?;
        Self::from_totals(self.kind, months, -self.total_seconds())
    }

    /// Value equality across all duration kinds: equal month and second totals.
    pub fn value_eq(&self, other: &DurationValue) -> bool {
        self.total_months() == other.total_months() && self.total_seconds() == other.total_seconds()
    }

    /// Total order within year-month or within day-time durations.
    pub fn order_compare(&self, other: &DurationValue) -> Result<Ordering, Error> {
        match (self.kind, other.kind) {
            (DurationKind::YearMonth, DurationKind::YearMonth) => {
                Ok(self.total_months().cmp(&other.total_months()))
            }
            (DurationKind::DayTime, DurationKind::DayTime) => {
                Ok(self.total_seconds().cmp(other.total_seconds()))
            }
            (a, b) => Err(Error::comparison(format!(
                "{} and {} are not ordered",
                a.xdm_type(),
                b.xdm_type()
            ))
            .with_operand(a.xdm_type(), self.to_lexical())
            .with_operand(b.xdm_type(), other.to_lexical())),
        }
    }

    /// Kind both operands share once a base `xs:duration` is promoted into
    /// its partner's subtype.
    fn common_kind(&self, other: &DurationValue) -> Result<DurationKind, Error> {
        let fits = |d: &DurationValue, k: DurationKind| match k {
            DurationKind::YearMonth => d.total_seconds().is_zero(),
            DurationKind::DayTime => d.total_months() == 0,
            DurationKind::Duration => false,
        };
        match (self.kind, other.kind) {
            (a, b) if a == b && a.is_ordered() => Ok(a),
            (DurationKind::Duration, k) if k.is_ordered() && fits(self, k) => Ok(k),
            (k, DurationKind::Duration) if k.is_ordered() && fits(other, k) => Ok(k),
            (a, b) => Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("no arithmetic between {} and {}", a.xdm_type(), b.xdm_type()),
            )),
        }
    }

    pub fn add(&self, other: &DurationValue) -> Result<Self, Error> {
        let kind = self.common_kind(other)?;
        let months = self
            .total_months()
            .checked_add(other.total_months())
            .ok_or_else(|| overflow("addition"))?;
        Self::from_totals(kind, months, self.total_seconds() + other.total_seconds())
    }

    pub fn subtract(&self, other: &DurationValue) -> Result<Self, Error> {
        self.add(&other.negate()?)
    }

    fn require_ordered(&self, op: &str) -> Result<(), Error> {
        if self.kind.is_ordered() {
            Ok(())
        } else {
            Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("cannot {op} an xs:duration; use a subtype"),
            ))
        }
    }

    /// Multiplies by an IEEE number. NaN is `FOCA0005`, an infinite factor `FODT0002`.
    pub fn multiply_by(&self, factor: f64) -> Result<Self, Error> {
        self.require_ordered("multiply")?;
        if factor.is_nan() {
            return Err(Error::domain(ErrorCode::FOCA0005, "duration multiplied by NaN"));
        }
        if factor.is_infinite() {
            return Err(overflow("multiplication by infinity"));
        }
        let factor = decimal_from_f64(factor)
            .ok_or_else(|| Error::domain(ErrorCode::FOCA0005, "invalid multiplier"))?;
        self.multiply_by_decimal(&factor)
    }

    pub fn multiply_by_decimal(&self, factor: &BigDecimal) -> Result<Self, Error> {
        self.require_ordered("multiply")?;
        self.scaled(|total| total * factor)
    }

    /// Divides by an IEEE number. NaN is `FOCA0005`, zero `FODT0002`; an
    /// infinite divisor yields a zero duration.
    pub fn divide_by(&self, divisor: f64) -> Result<Self, Error> {
        self.require_ordered("divide")?;
        if divisor.is_nan() {
            return Err(Error::domain(ErrorCode::FOCA0005, "duration divided by NaN"));
        }
        if divisor.is_infinite() {
            return Ok(Self::zero(self.kind));
        }
        let divisor = decimal_from_f64(divisor)
            .ok_or_else(|| Error::domain(ErrorCode::FOCA0005, "invalid divisor"))?;
        self.divide_by_decimal(&divisor)
    }

    pub fn divide_by_decimal(&self, divisor: &BigDecimal) -> Result<Self, Error> {
        self.require_ordered("divide")?;
        if divisor.is_zero() {
            return Err(overflow("division by zero"));
        }
        self.scaled(|total| total / divisor)
    }

    fn scaled(&self, f: impl Fn(&BigDecimal) -> BigDecimal) -> Result<Self, Error> {
        match self.kind {
            DurationKind::YearMonth => {
                let months = round_half_ceiling(&f(&BigDecimal::from(self.total_months())));
                let months = months.to_i64().ok_or_else(|| overflow("scaling"))?;
                Self::year_month(months)
            }
            _ => {
                let secs = f(self.total_seconds()).with_scale_round(9, RoundingMode::HalfUp);
                Self::day_time(secs.normalized())
            }
        }
    }

    /// Ratio of two durations of the same ordered kind, as `xs:decimal`.
    pub fn divide_by_duration(&self, other: &DurationValue) -> Result<BigDecimal, Error> {
        let kind = self.common_kind(other)?;
        let (num, den) = match kind {
            DurationKind::YearMonth => (
                BigDecimal::from(self.total_months()),
                BigDecimal::from(other.total_months()),
            ),
            _ => (self.total_seconds().clone(), other.total_seconds().clone()),
        };
        if den.is_zero() {
            return Err(Error::domain(
                ErrorCode::FOAR0001,
                "division by a zero duration",
            ));
        }
        Ok(crate::atomic::decimal::divide(&num, &den))
    }

    pub fn parse(kind: DurationKind, input: &str) -> Result<Self, Error> {
        let fields = parse_fields(kind, input.trim())?;
        Self::from_fields(kind, fields).map_err(|e| {
            if e.kind == ErrorKind::Construction {
                Error::invalid_lexical(kind.xdm_type(), input, e.message)
            } else {
                e
            }
        })
    }

    pub fn to_lexical(&self) -> String {
        let f = self.canonical_fields();
        let has_date = f.years != 0 || f.months != 0 || f.days != 0;
        let has_time = f.hours != 0 || f.minutes != 0 || !f.seconds.is_zero();
        if !has_date && !has_time {
            return match self.kind {
                DurationKind::YearMonth => "P0M".to_string(),
                _ => "PT0S".to_string(),
            };
        }
        let mut out = String::new();
        if f.negative {
            out.push('-');
        }
        out.push('P');
        for (v, unit) in [(f.years, 'Y'), (f.months, 'M'), (f.days, 'D')] {
            if v != 0 {
                out.push_str(&format!("{v}{unit}"));
            }
        }
        if has_time {
            out.push('T');
            for (v, unit) in [(f.hours, 'H'), (f.minutes, 'M')] {
                if v != 0 {
                    out.push_str(&format!("{v}{unit}"));
                }
            }
            if !f.seconds.is_zero() {
                out.push_str(&plain_string(&f.seconds));
                out.push('S');
            }
        }
        out
    }

    /// Day-time part as a chrono delta, truncated to nanoseconds.
    pub fn to_time_delta(&self) -> Option<chrono::TimeDelta> {
        let secs = self.total_seconds();
        let whole = secs.with_scale_round(0, RoundingMode::Down);
        let nanos = ((secs - &whole) * BigDecimal::from(1_000_000_000))
            .with_scale_round(0, RoundingMode::Down)
            .to_i64()?;
        chrono::TimeDelta::try_seconds(whole.to_i64()?)?
            .checked_add(&chrono::TimeDelta::nanoseconds(nanos))
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

fn overflow(what: &str) -> Error {
    Error::domain(ErrorCode::FODT0002, format!("duration overflow in {what}"))
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Minimal `Y M D H M S` split of signed totals.
fn split_totals(months: i64, seconds: &BigDecimal) -> Result<DurationFields, Error> {
    let negative = months < 0 || seconds.is_negative();
    let abs_months = months.unsigned_abs();
    let abs_secs = seconds.abs();
    let whole = abs_secs.with_scale_round(0, RoundingMode::Down);
    let frac = &abs_secs - &whole;
    let (whole_int, _) = whole.as_bigint_and_exponent();
    let whole = whole_int.to_u64().ok_or_else(|| overflow("normalization"))?;
    Ok(DurationFields {
        negative,
        years: abs_months / 12,
        months: abs_months % 12,
        days: whole / 86_400,
        hours: whole % 86_400 / 3600,
        minutes: whole % 3600 / 60,
        seconds: (BigDecimal::from(whole % 60) + frac).normalized(),
    })
}

/// Parses `-?P(nY)?(nM)?(nD)?(T(nH)?(nM)?(n(.n)?S)?)?`.
fn parse_fields(kind: DurationKind, s: &str) -> Result<DurationFields, Error> {
    let bad = |detail: String| Error::invalid_lexical(kind.xdm_type(), s, detail);
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let body = body
        .strip_prefix('P')
        .ok_or_else(|| bad("missing 'P' designator".to_string()))?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((d, t)) => {
            if t.is_empty() {
                return Err(bad("'T' must be followed by a time component".to_string()));
            }
            (d, Some(t))
        }
        None => (body, None),
    };
    let mut fields = DurationFields {
        negative,
        ..DurationFields::default()
    };
    let mut seen_any = false;
    // (designator, allowed in kind) in required order
    let date_units: [(char, bool); 3] = [
        ('Y', kind != DurationKind::DayTime),
        ('M', kind != DurationKind::DayTime),
        ('D', kind != DurationKind::YearMonth),
    ];
    let mut rest = date_part;
    let mut order = 0usize;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| bad(format!("number '{rest}' has no designator")))?;
        if digits_end == 0 {
            return Err(bad(format!("unexpected '{rest}'")));
        }
        let unit = rest[digits_end..].chars().next().unwrap_or('?');
        let pos = date_units[order..]
            .iter()
            .position(|(u, _)| *u == unit)
            .map(|p| p + order)
            .ok_or_else(|| bad(format!("unexpected designator '{unit}'")))?;
        if !date_units[pos].1 {
            return Err(bad(format!("designator '{unit}' not allowed here")));
        }
        let value = parse_component(&rest[..digits_end]).map_err(|_| overflow("parsing"))?;
        match unit {
            'Y' => fields.years = value,
            'M' => fields.months = value,
            _ => fields.days = value,
        }
        order = pos + 1;
        seen_any = true;
        rest = &rest[digits_end + unit.len_utf8()..];
    }
    if let Some(time) = time_part {
        if kind == DurationKind::YearMonth {
            return Err(bad("time components are not allowed".to_string()));
        }
        let time_units = ['H', 'M', 'S'];
        let mut rest = time;
        let mut order = 0usize;
        while !rest.is_empty() {
            let num_end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| bad(format!("number '{rest}' has no designator")))?;
            let number = &rest[..num_end];
            if number.is_empty() || number.starts_with('.') || number.ends_with('.') {
                return Err(bad(format!("malformed number '{number}'")));
            }
            let unit = rest[num_end..].chars().next().unwrap_or('?');
            let pos = time_units[order..]
                .iter()
                .position(|u| *u == unit)
                .map(|p| p + order)
                .ok_or_else(|| bad(format!("unexpected designator '{unit}'")))?;
            if unit == 'S' {
                fields.seconds = BigDecimal::from_str(number)
                    .map_err(|_| bad(format!("malformed seconds '{number}'")))?;
            } else {
                if number.contains('.') {
                    return Err(bad(format!("fraction only allowed in seconds: '{number}'")));
                }
                let value = parse_component(number).map_err(|_| overflow("parsing"))?;
                if unit == 'H' {
                    fields.hours = value;
                } else {
                    fields.minutes = value;
                }
            }
            order = pos + 1;
            seen_any = true;
            rest = &rest[num_end + unit.len_utf8()..];
        }
    }
    if !seen_any {
        return Err(bad("no components".to_string()));
    }
    Ok(fields)
}

fn parse_component(digits: &str) -> Result<u64, core::num::ParseIntError> {
    digits.parse::<u64>()
}
