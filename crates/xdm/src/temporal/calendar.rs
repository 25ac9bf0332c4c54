//! Calendar fields shared by every date/time kind, plus the proleptic
//! Gregorian day arithmetic used to order and add to them.

use super::DateTimeKind;
use crate::consts::MAX_TZ_MINUTES;
use crate::error::{Error, ErrorCode};
use core::fmt;

/// Years beyond this magnitude are rejected so that second counts stay in `i64`.
pub const MAX_YEAR: i64 = 999_999_999;

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Timezone offset east of UTC, validated to ±14:00.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TzOffset {
    minutes: i16,
}

impl TzOffset {
    pub const UTC: TzOffset = TzOffset { minutes: 0 };

    pub fn new(minutes: i32) -> Result<Self, Error> {
        if minutes.abs() > MAX_TZ_MINUTES {
            return Err(Error::domain(
                ErrorCode::FODT0003,
                format!("timezone offset {minutes} minutes is outside -14:00..+14:00"),
            ));
        }
        // |minutes| <= 840 always fits
        Ok(Self {
            minutes: i16::try_from(minutes).unwrap_or_default(),
        })
    }

    /// Host offset at the time of the call, UTC if it cannot be represented.
    pub fn local() -> Self {
        use chrono::Offset;
        let secs = chrono::Local::now().offset().fix().local_minus_utc();
        TzOffset::new(secs / 60).unwrap_or(TzOffset::UTC)
    }

    pub fn minutes(self) -> i32 {
        i32::from(self.minutes)
    }

    pub fn seconds(self) -> i64 {
        i64::from(self.minutes) * 60
    }

    pub fn to_fixed_offset(self) -> Option<chrono::FixedOffset> {
        chrono::FixedOffset::east_opt(self.minutes() * 60)
    }
}

impl fmt::Display for TzOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            return f.write_str("Z");
        }
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}

/// Wall-clock time with nanosecond precision. `hour` is always `0..24`;
/// the lexical `24:00:00` is normalized by the parser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hour: 0,
        minute: 0,
        second: 0,
        nanos: 0,
    };

    pub fn new(hour: u8, minute: u8, second: u8, nanos: u32) -> Result<Self, Error> {
        if hour > 23 || minute > 59 || second > 59 || nanos >= NANOS_PER_SECOND {
            return Err(Error::construction(format!(
                "time {hour:02}:{minute:02}:{second:02} is out of range"
            )));
        }
        Ok(Self {
            hour,
            minute,
            second,
            nanos,
        })
    }

    pub fn seconds_of_day(self) -> i64 {
        i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second)
    }

    pub(crate) fn from_seconds_of_day(secs: i64, nanos: u32) -> Self {
        let secs = secs.rem_euclid(SECONDS_PER_DAY);
        // each component is bounded by the modulo above
        Self {
            hour: u8::try_from(secs / 3600).unwrap_or_default(),
            minute: u8::try_from(secs % 3600 / 60).unwrap_or_default(),
            second: u8::try_from(secs % 60).unwrap_or_default(),
            nanos,
        }
    }
}

/// Raw calendar fields. Which fields are present is dictated by the
/// [`DateTimeKind`] of the value holding it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Calendar {
    pub year: Option<i64>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub time: Option<TimeOfDay>,
    pub tz: Option<TzOffset>,
}

impl Calendar {
    pub fn date(year: i64, month: u8, day: u8) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time: TimeOfDay) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_tz(mut self, tz: Option<TzOffset>) -> Self {
        self.tz = tz;
        self
    }

    /// Copy keeping only the fields `kind` carries. The timezone is kept.
    pub fn restricted_to(&self, kind: DateTimeKind) -> Calendar {
        Calendar {
            year: self.year.filter(|_| kind.has_year()),
            month: self.month.filter(|_| kind.has_month()),
            day: self.day.filter(|_| kind.has_day()),
            time: self.time.filter(|_| kind.has_time()),
            tz: self.tz,
        }
    }

    /// Checks that exactly the fields of `kind` are present and in range.
    pub fn validate(&self, kind: DateTimeKind) -> Result<(), Error> {
        let presence = [
            ("year", self.year.is_some(), kind.has_year()),
            ("month", self.month.is_some(), kind.has_month()),
            ("day", self.day.is_some(), kind.has_day()),
            ("time", self.time.is_some(), kind.has_time()),
        ];
        for (field, present, wanted) in presence {
            if present && !wanted {
                return Err(Error::construction(format!(
                    "{} does not carry a {field} field",
                    kind.xdm_type()
                )));
            }
            if !present && wanted {
                return Err(Error::construction(format!(
                    "{} requires a {field} field",
                    kind.xdm_type()
                )));
            }
        }
        if let Some(y) = self.year
            && y.abs() > MAX_YEAR
        {
            return Err(Error::domain(
                ErrorCode::FODT0001,
                format!("year {y} is out of range"),
            ));
        }
        if let Some(m) = self.month
            && !(1..=12).contains(&m)
        {
            return Err(Error::construction(format!("month {m} is out of range")));
        }
        if let Some(d) = self.day {
            // partial kinds without a year validate against a leap year
            let max = match (self.year, self.month) {
                (Some(y), Some(m)) => days_in_month(y, m),
                (None, Some(m)) => days_in_month(2000, m),
                _ => 31,
            };
            if d == 0 || d > max {
                return Err(Error::construction(format!("day {d} is out of range")));
            }
        }
        if let Some(t) = self.time {
            TimeOfDay::new(t.hour, t.minute, t.second, t.nanos)?;
        }
        Ok(())
    }
}

pub fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i64, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date (year 0 = 1 BCE).
pub fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let m = i64::from(month);
    let d = i64::from(day);
    let y = if m <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
pub fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    // d in 1..=31 and m in 1..=12 by construction
    (
        y,
        u8::try_from(m).unwrap_or_default(),
        u8::try_from(d).unwrap_or_default(),
    )
}

/// Adds `months` to a year/month pair, returning the new pair.
pub fn add_months(year: i64, month: u8, months: i64) -> Result<(i64, u8), Error> {
    let total = year
        .checked_mul(12)
        .and_then(|t| t.checked_add(i64::from(month) - 1))
        .and_then(|t| t.checked_add(months))
        .ok_or_else(|| Error::domain(ErrorCode::FODT0001, "date overflow adding months"))?;
    let y = total.div_euclid(12);
    if y.abs() > MAX_YEAR {
        return Err(Error::domain(
            ErrorCode::FODT0001,
            format!("year {y} is out of range"),
        ));
    }
    let m = u8::try_from(total.rem_euclid(12) + 1).unwrap_or(1);
    Ok((y, m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_roundtrip_around_epoch_and_leap_days() {
        for days in [-719_468, -1, 0, 1, 11_016, 11_017, 19_782] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }

    #[test]
    fn month_addition_wraps_years() {
        assert_eq!(add_months(2000, 11, 3).unwrap(), (2001, 2));
        assert_eq!(add_months(2000, 1, -1).unwrap(), (1999, 12));
        assert_eq!(add_months(0, 1, -1).unwrap(), (-1, 12));
    }
}
