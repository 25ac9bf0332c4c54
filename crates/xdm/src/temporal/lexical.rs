//! Lexical grammar for the date/time kinds.
//!
//! Year: optional `-`, at least four digits, no leading zero beyond four.
//! Month/day/hour/minute/second: exactly two digits. Fractional seconds are
//! kept to nanosecond precision. Timezone: `Z` or `±hh:mm` within ±14:00.

use super::calendar::{Calendar, TimeOfDay, TzOffset, civil_from_days, days_from_civil};
use super::DateTimeKind;
use crate::error::Error;

struct Scanner<'a> {
    input: &'a str,
    rest: &'a str,
    kind: DateTimeKind,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, kind: DateTimeKind) -> Self {
        Self {
            input,
            rest: input,
            kind,
        }
    }

    fn fail(&self, detail: impl core::fmt::Display) -> Error {
        Error::invalid_lexical(self.kind.xdm_type(), self.input, detail)
    }

    fn fragment(&self) -> &'a str {
        if self.rest.is_empty() {
            "end of input"
        } else {
            self.rest
        }
    }

    fn expect(&mut self, c: char) -> Result<(), Error> {
        match self.rest.strip_prefix(c) {
            Some(r) => {
                self.rest = r;
                Ok(())
            }
            None => Err(self.fail(format!("expected '{c}' at '{}'", self.fragment()))),
        }
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(r) => {
                self.rest = r;
                true
            }
            None => false,
        }
    }

    fn digits(&mut self) -> &'a str {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let (d, r) = self.rest.split_at(end);
        self.rest = r;
        d
    }

    fn two_digits(&mut self, what: &str) -> Result<u8, Error> {
        let at = self.fragment();
        let d = self.digits();
        if d.len() != 2 {
            return Err(self.fail(format!("{what} must be two digits at '{at}'")));
        }
        d.parse::<u8>()
            .map_err(|_| self.fail(format!("{what} '{d}' is not a number")))
    }

    fn year(&mut self) -> Result<i64, Error> {
        let negative = self.eat('-');
        let d = self.digits();
        if d.len() < 4 {
            return Err(self.fail(format!("year '{d}' must have at least four digits")));
        }
        if d.len() > 4 && d.starts_with('0') {
            return Err(self.fail(format!("year '{d}' has a leading zero")));
        }
        let y = d
            .parse::<i64>()
            .map_err(|_| self.fail(format!("year '{d}' is out of range")))?;
        Ok(if negative { -y } else { y })
    }

    /// Returns `(time, rolled_over)`; `24:00:00` becomes midnight of the next day.
    fn time(&mut self) -> Result<(TimeOfDay, bool), Error> {
        let hour = self.two_digits("hour")?;
        self.expect(':')?;
        let minute = self.two_digits("minute")?;
        self.expect(':')?;
        let second = self.two_digits("second")?;
        let mut nanos = 0u32;
        if self.eat('.') {
            let frac = self.digits();
            if frac.is_empty() {
                return Err(self.fail("fractional seconds need at least one digit"));
            }
            let kept: String = frac.chars().chain(core::iter::repeat('0')).take(9).collect();
            nanos = kept
                .parse::<u32>()
                .map_err(|_| self.fail(format!("bad fraction '{frac}'")))?;
        }
        if hour == 24 {
            if minute != 0 || second != 0 || nanos != 0 {
                return Err(self.fail("24:00:00 is the only time allowed with hour 24"));
            }
            return Ok((TimeOfDay::MIDNIGHT, true));
        }
        let t = TimeOfDay::new(hour, minute, second, nanos).map_err(|e| self.fail(e.message))?;
        Ok((t, false))
    }

    fn timezone(&mut self) -> Result<Option<TzOffset>, Error> {
        if self.rest.is_empty() {
            return Ok(None);
        }
        if self.eat('Z') {
            return Ok(Some(TzOffset::UTC));
        }
        let sign = if self.eat('+') {
            1
        } else if self.eat('-') {
            -1
        } else {
            return Err(self.fail(format!("unexpected '{}'", self.fragment())));
        };
        let h = self.two_digits("timezone hour")?;
        self.expect(':')?;
        let m = self.two_digits("timezone minute")?;
        if m > 59 || h > 14 || (h == 14 && m != 0) {
            return Err(self.fail(format!("timezone {h:02}:{m:02} is out of range")));
        }
        TzOffset::new(sign * (i32::from(h) * 60 + i32::from(m)))
            .map(Some)
            .map_err(|e| self.fail(e.message))
    }

    fn finish(&self) -> Result<(), Error> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(self.fail(format!("trailing '{}'", self.rest)))
        }
    }
}

/// Parses `input` (already whitespace-trimmed) as `kind`.
pub(crate) fn parse_calendar(kind: DateTimeKind, input: &str) -> Result<Calendar, Error> {
    let mut sc = Scanner::new(input, kind);
    let mut cal = Calendar::default();
    let mut rolled_over = false;
    match kind {
        DateTimeKind::DateTime | DateTimeKind::Date => {
            cal.year = Some(sc.year()?);
            sc.expect('-')?;
            cal.month = Some(sc.two_digits("month")?);
            sc.expect('-')?;
            cal.day = Some(sc.two_digits("day")?);
            if kind == DateTimeKind::DateTime {
                sc.expect('T')?;
                let (t, roll) = sc.time()?;
                cal.time = Some(t);
                rolled_over = roll;
            }
        }
        DateTimeKind::Time => {
            let (t, _) = sc.time()?;
            cal.time = Some(t);
        }
        DateTimeKind::GYear => cal.year = Some(sc.year()?),
        DateTimeKind::GYearMonth => {
            cal.year = Some(sc.year()?);
            sc.expect('-')?;
            cal.month = Some(sc.two_digits("month")?);
        }
        DateTimeKind::GMonth => {
            sc.expect('-')?;
            sc.expect('-')?;
            cal.month = Some(sc.two_digits("month")?);
        }
        DateTimeKind::GMonthDay => {
            sc.expect('-')?;
            sc.expect('-')?;
            cal.month = Some(sc.two_digits("month")?);
            sc.expect('-')?;
            cal.day = Some(sc.two_digits("day")?);
        }
        DateTimeKind::GDay => {
            sc.expect('-')?;
            sc.expect('-')?;
            sc.expect('-')?;
            cal.day = Some(sc.two_digits("day")?);
        }
    }
    cal.tz = sc.timezone()?;
    sc.finish()?;
    cal.validate(kind).map_err(|e| sc.fail(e.message))?;
    if rolled_over && let (Some(y), Some(m), Some(d)) = (cal.year, cal.month, cal.day) {
        let (y, m, d) = civil_from_days(days_from_civil(y, m, d) + 1);
        cal.year = Some(y);
        cal.month = Some(m);
        cal.day = Some(d);
        cal.validate(kind).map_err(|e| sc.fail(e.message))?;
    }
    Ok(cal)
}

fn push_year(out: &mut String, y: i64) {
    if y < 0 {
        out.push('-');
    }
    out.push_str(&format!("{:04}", y.unsigned_abs()));
}

fn push_time(out: &mut String, t: TimeOfDay) {
    out.push_str(&format!("{:02}:{:02}:{:02}", t.hour, t.minute, t.second));
    if t.nanos != 0 {
        let frac = format!("{:09}", t.nanos);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
}

/// Canonical lexical form of `cal` for `kind`.
pub(crate) fn format_calendar(kind: DateTimeKind, cal: &Calendar) -> String {
    let mut out = String::new();
    let year = cal.year.unwrap_or_default();
    let month = cal.month.unwrap_or(1);
    let day = cal.day.unwrap_or(1);
    match kind {
        DateTimeKind::DateTime | DateTimeKind::Date => {
            push_year(&mut out, year);
            out.push_str(&format!("-{month:02}-{day:02}"));
            if kind == DateTimeKind::DateTime {
                out.push('T');
                push_time(&mut out, cal.time.unwrap_or_default());
            }
        }
        DateTimeKind::Time => push_time(&mut out, cal.time.unwrap_or_default()),
        DateTimeKind::GYear => push_year(&mut out, year),
        DateTimeKind::GYearMonth => {
            push_year(&mut out, year);
            out.push_str(&format!("-{month:02}"));
        }
        DateTimeKind::GMonth => out.push_str(&format!("--{month:02}")),
        DateTimeKind::GMonthDay => out.push_str(&format!("--{month:02}-{day:02}")),
        DateTimeKind::GDay => out.push_str(&format!("---{day:02}")),
    }
    if let Some(tz) = cal.tz {
        out.push_str(&tz.to_string());
    }
    out
}
