//! Date, time, Gregorian partial and duration values.

pub mod calendar;
pub mod datetime;
pub mod duration;
mod lexical;

pub use calendar::{Calendar, TimeOfDay, TzOffset};
pub use datetime::{DateTimeKind, DateTimeValue, Moment};
pub use duration::{DurationFields, DurationKind, DurationValue};
