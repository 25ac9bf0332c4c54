use super::calendar::{
    Calendar, MAX_YEAR, NANOS_PER_SECOND, SECONDS_PER_DAY, TimeOfDay, TzOffset, add_months,
    civil_from_days, days_from_civil, days_in_month,
};
use super::duration::DurationValue;
use super::lexical::{format_calendar, parse_calendar};
use crate::error::{Error, ErrorCode};
use crate::types::XdmType;
use bigdecimal::{BigDecimal, RoundingMode};
use core::cmp::Ordering;
use core::fmt;
use num_traits::ToPrimitive;
use std::sync::OnceLock;

/// Which calendar fields a [`DateTimeValue`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    DateTime,
    Date,
    Time,
    GYear,
    GYearMonth,
    GMonth,
    GMonthDay,
    GDay,
}

impl DateTimeKind {
    pub fn xdm_type(self) -> XdmType {
        match self {
            DateTimeKind::DateTime => XdmType::DateTime,
            DateTimeKind::Date => XdmType::Date,
            DateTimeKind::Time => XdmType::Time,
            DateTimeKind::GYear => XdmType::GYear,
            DateTimeKind::GYearMonth => XdmType::GYearMonth,
            DateTimeKind::GMonth => XdmType::GMonth,
            DateTimeKind::GMonthDay => XdmType::GMonthDay,
            DateTimeKind::GDay => XdmType::GDay,
        }
    }

    pub fn from_type(t: XdmType) -> Option<Self> {
        Some(match t {
            XdmType::DateTime => DateTimeKind::DateTime,
            XdmType::Date => DateTimeKind::Date,
            XdmType::Time => DateTimeKind::Time,
            XdmType::GYear => DateTimeKind::GYear,
            XdmType::GYearMonth => DateTimeKind::GYearMonth,
            XdmType::GMonth => DateTimeKind::GMonth,
            XdmType::GMonthDay => DateTimeKind::GMonthDay,
            XdmType::GDay => DateTimeKind::GDay,
            _ => return None,
        })
    }

    pub fn has_year(self) -> bool {
        matches!(
            self,
            DateTimeKind::DateTime | DateTimeKind::Date | DateTimeKind::GYear | DateTimeKind::GYearMonth
        )
    }

    pub fn has_month(self) -> bool {
        matches!(
            self,
            DateTimeKind::DateTime
                | DateTimeKind::Date
                | DateTimeKind::GYearMonth
                | DateTimeKind::GMonth
                | DateTimeKind::GMonthDay
        )
    }

    pub fn has_day(self) -> bool {
        matches!(
            self,
            DateTimeKind::DateTime | DateTimeKind::Date | DateTimeKind::GMonthDay | DateTimeKind::GDay
        )
    }

    pub fn has_time(self) -> bool {
        matches!(self, DateTimeKind::DateTime | DateTimeKind::Time)
    }

    /// Partial Gregorian kinds do not support arithmetic.
    pub fn is_gregorian_partial(self) -> bool {
        !matches!(
            self,
            DateTimeKind::DateTime | DateTimeKind::Date | DateTimeKind::Time
        )
    }
}

/// Seconds since 1970-01-01T00:00:00 plus a nanosecond fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Moment {
    pub seconds: i64,
    pub nanos: u32,
}

impl Moment {
    fn shifted(self, secs: i64) -> Result<Moment, Error> {
        Ok(Moment {
            seconds: self
                .seconds
                .checked_add(secs)
                .ok_or_else(|| date_overflow("timezone shift"))?,
            nanos: self.nanos,
        })
    }
}

#[derive(Clone, Debug)]
pub struct DateTimeValue {
    kind: DateTimeKind,
    cal: Calendar,
    local: OnceLock<Moment>,
}

impl PartialEq for DateTimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.cal == other.cal
    }
}

impl Eq for DateTimeValue {}

fn date_overflow(what: &str) -> Error {
    Error::domain(ErrorCode::FODT0001, format!("date/time overflow in {what}"))
}

impl DateTimeValue {
    /// Fails when `cal` lacks a field `kind` needs or carries one it must not.
    pub fn new(kind: DateTimeKind, cal: Calendar) -> Result<Self, Error> {
        cal.validate(kind)?;
        Ok(Self {
            kind,
            cal,
            local: OnceLock::new(),
        })
    }

    pub fn parse(kind: DateTimeKind, input: &str) -> Result<Self, Error> {
        let cal = parse_calendar(kind, input.trim())?;
        Self::new(kind, cal)
    }

    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    pub fn xdm_type(&self) -> XdmType {
        self.kind.xdm_type()
    }

    pub fn calendar(&self) -> &Calendar {
        &self.cal
    }

    pub fn year(&self) -> Option<i64> {
        self.cal.year
    }

    pub fn month(&self) -> Option<u8> {
        self.cal.month
    }

    pub fn day(&self) -> Option<u8> {
        self.cal.day
    }

    pub fn hour(&self) -> Option<u8> {
        self.cal.time.map(|t| t.hour)
    }

    pub fn minute(&self) -> Option<u8> {
        self.cal.time.map(|t| t.minute)
    }

    /// Seconds including the fractional part.
    pub fn second(&self) -> Option<BigDecimal> {
        self.cal.time.map(|t| {
            (BigDecimal::from(t.second) + BigDecimal::new(t.nanos.into(), 9)).normalized()
        })
    }

    pub fn timezone(&self) -> Option<TzOffset> {
        self.cal.tz
    }

    pub fn to_lexical(&self) -> String {
        format_calendar(self.kind, &self.cal)
    }

    /// Fields with the reference fill (1972-12-31T00:00:00) read as UTC.
    pub fn local_moment(&self) -> Moment {
        *self.local.get_or_init(|| {
            let (month_fill, day_fill) = match self.kind {
                DateTimeKind::Time => (12, 31),
                DateTimeKind::GDay => (12, 1),
                _ => (1, 1),
            };
            let y = self.cal.year.unwrap_or(1972);
            let m = self.cal.month.unwrap_or(month_fill);
            let d = self.cal.day.unwrap_or(day_fill);
            let t = self.cal.time.unwrap_or(TimeOfDay::MIDNIGHT);
            Moment {
                seconds: days_from_civil(y, m, d) * SECONDS_PER_DAY + t.seconds_of_day(),
                nanos: t.nanos,
            }
        })
    }

    /// UTC instant, substituting `implicit` when the value has no timezone.
    pub fn instant(&self, implicit: TzOffset) -> Moment {
        let tz = self.cal.tz.unwrap_or(implicit);
        let local = self.local_moment();
        Moment {
            seconds: local.seconds - tz.seconds(),
            nanos: local.nanos,
        }
    }

    /// Total order between values of the same kind. Ordering values of
    /// different kinds has no defined result and is reported as a defect.
    pub fn order_compare(&self, other: &DateTimeValue, implicit: TzOffset) -> Result<Ordering, Error> {
        if self.kind != other.kind {
            return Err(Error::internal(format!(
                "indeterminate order between {} and {}",
                self.xdm_type(),
                other.xdm_type()
            )));
        }
        Ok(self.instant(implicit).cmp(&other.instant(implicit)))
    }

    fn from_local(kind: DateTimeKind, moment: Moment, tz: Option<TzOffset>) -> Result<Self, Error> {
        let days = moment.seconds.div_euclid(SECONDS_PER_DAY);
        let secs = moment.seconds.rem_euclid(SECONDS_PER_DAY);
        let (y, m, d) = civil_from_days(days);
        if y.abs() > MAX_YEAR {
            return Err(date_overflow("normalization"));
        }
        let full = Calendar::date(y, m, d)
            .with_time(TimeOfDay::from_seconds_of_day(secs, moment.nanos))
            .with_tz(tz);
        Self::new(kind, full.restricted_to(kind))
    }

    fn require_adjustable(&self) -> Result<(), Error> {
        if self.kind.is_gregorian_partial() {
            return Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("{} does not support this operation", self.xdm_type()),
            ));
        }
        Ok(())
    }

    /// With `Some(offset)`: shifts the fields into `offset` when the value
    /// has a timezone, otherwise stamps it. With `None`: drops the timezone.
    pub fn adjusted_to_timezone(&self, offset_minutes: Option<i32>) -> Result<Self, Error> {
        self.require_adjustable()?;
        let Some(minutes) = offset_minutes else {
            return Ok(self.without_timezone());
        };
        let target = TzOffset::new(minutes)?;
        match self.cal.tz {
            None => Self::new(self.kind, self.cal.with_tz(Some(target))),
            Some(current) => {
                let moment = self
                    .local_moment()
                    .shifted(target.seconds() - current.seconds())?;
                Self::from_local(self.kind, moment, Some(target))
            }
        }
    }

    pub fn without_timezone(&self) -> Self {
        Self {
            kind: self.kind,
            cal: self.cal.with_tz(None),
            local: self.local.clone(),
        }
    }

    /// Re-tags as `kind`, keeping the fields `kind` carries. Going from a
    /// date to a dateTime fills midnight.
    pub fn convert_to(&self, kind: DateTimeKind) -> Result<Self, Error> {
        let mut cal = self.cal.restricted_to(kind);
        if kind.has_time() && cal.time.is_none() {
            cal.time = Some(TimeOfDay::MIDNIGHT);
        }
        Self::new(kind, cal)
    }

    /// Adds a duration: months first (pinning the day to the month end),
    /// then seconds with carry into days.
    pub fn add_duration(&self, dur: &DurationValue) -> Result<Self, Error> {
        self.require_adjustable()?;
        let (whole, nanos) = split_seconds(dur.total_seconds())?;
        if self.kind == DateTimeKind::Time {
            if dur.total_months() != 0 {
                return Err(Error::type_error(
                    ErrorCode::XPTY0004,
                    "cannot add a year-month duration to xs:time",
                ));
            }
            let local = self.local_moment();
            let moment = add_to_moment(local, whole, nanos)?;
            return Self::from_local(self.kind, moment, self.cal.tz);
        }
        let year = self.cal.year.unwrap_or_default();
        let month = self.cal.month.unwrap_or(1);
        let (y, m) = add_months(year, month, dur.total_months())?;
        let d = self.cal.day.unwrap_or(1).min(days_in_month(y, m));
        let t = self.cal.time.unwrap_or(TimeOfDay::MIDNIGHT);
        let base = Moment {
            seconds: days_from_civil(y, m, d)
                .checked_mul(SECONDS_PER_DAY)
                .and_then(|s| s.checked_add(t.seconds_of_day()))
                .ok_or_else(|| date_overflow("addition"))?,
            nanos: t.nanos,
        };
        let moment = add_to_moment(base, whole, nanos)?;
        Self::from_local(self.kind, moment, self.cal.tz)
    }

    pub fn subtract_duration(&self, dur: &DurationValue) -> Result<Self, Error> {
        self.add_duration(&dur.negate()?)
    }

    /// `self − other` as an `xs:dayTimeDuration`, both filled with `implicit`.
    pub fn difference(&self, other: &DateTimeValue, implicit: TzOffset) -> Result<DurationValue, Error> {
        self.require_adjustable()?;
        if self.kind != other.kind {
            return Err(Error::type_error(
                ErrorCode::XPTY0004,
                format!("cannot subtract {} from {}", other.xdm_type(), self.xdm_type()),
            ));
        }
        let a = self.instant(implicit);
        let b = other.instant(implicit);
        let whole = a
            .seconds
            .checked_sub(b.seconds)
            .ok_or_else(|| date_overflow("subtraction"))?;
        let secs = BigDecimal::from(whole)
            + BigDecimal::new((i64::from(a.nanos) - i64::from(b.nanos)).into(), 9);
        DurationValue::day_time(secs.normalized())
    }

    pub fn to_naive_date(&self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::from_ymd_opt(
            i32::try_from(self.cal.year?).ok()?,
            u32::from(self.cal.month?),
            u32::from(self.cal.day?),
        )
    }

    pub fn to_naive_time(&self) -> Option<chrono::NaiveTime> {
        let t = self.cal.time?;
        chrono::NaiveTime::from_hms_nano_opt(
            u32::from(t.hour),
            u32::from(t.minute),
            u32::from(t.second),
            t.nanos,
        )
    }

    pub fn to_naive_date_time(&self) -> Option<chrono::NaiveDateTime> {
        Some(self.to_naive_date()?.and_time(self.to_naive_time()?))
    }

    /// Only values with their own timezone map to an offset date-time.
    pub fn to_chrono(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        let offset = self.cal.tz?.to_fixed_offset()?;
        self.to_naive_date_time()?
            .and_local_timezone(offset)
            .single()
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lexical())
    }
}

/// Splits signed decimal seconds into floor seconds and a nanosecond remainder.
fn split_seconds(secs: &BigDecimal) -> Result<(i64, u32), Error> {
    let floor = secs.with_scale_round(0, RoundingMode::Floor);
    let frac = secs - &floor;
    let whole = floor.to_i64().ok_or_else(|| date_overflow("addition"))?;
    let nanos = (frac * BigDecimal::from(NANOS_PER_SECOND))
        .with_scale_round(0, RoundingMode::Down)
        .to_u32()
        .unwrap_or(0);
    Ok((whole, nanos.min(NANOS_PER_SECOND - 1)))
}

fn add_to_moment(base: Moment, whole: i64, nanos: u32) -> Result<Moment, Error> {
    let mut n = base.nanos + nanos;
    let mut carry = 0;
    if n >= NANOS_PER_SECOND {
        n -= NANOS_PER_SECOND;
        carry = 1;
    }
    let seconds = base
        .seconds
        .checked_add(whole)
        .and_then(|s| s.checked_add(carry))
        .ok_or_else(|| date_overflow("addition"))?;
    Ok(Moment { seconds, nanos: n })
}
