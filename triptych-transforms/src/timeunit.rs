//! Calendar time units.
//!
//! A time unit is a non-empty subset of calendar parts, optionally UTC.
//! Flooring a timestamp keeps the included parts and normalizes everything
//! else to a fixed reference (year 2012, January 1st, midnight), so buckets
//! like "month" compare meaningfully across years. 2012 is a leap year
//! starting on a Sunday, which keeps Feb 29 and day-of-week buckets valid.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::TriptychTransformError;

pub const REFERENCE_YEAR: i32 = 2012;

/// One calendar component, coarse to fine in declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnitPart {
    Year,
    Quarter,
    Month,
    Date,
    Day,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeUnit {
    utc: bool,
    parts: Vec<TimeUnitPart>,
}

impl TimeUnit {
    /// Build a unit from parts; they are stored deduplicated in coarse-to-
    /// fine order regardless of input order.
    pub fn new(parts: impl IntoIterator<Item = TimeUnitPart>) -> Self {
        let mut parts: Vec<TimeUnitPart> = parts.into_iter().collect();
        parts.sort();
        parts.dedup();
        Self { utc: false, parts }
    }

    pub fn utc(mut self) -> Self {
        self.utc = true;
        self
    }

    pub fn is_utc(&self) -> bool {
        self.utc
    }

    pub fn parts(&self) -> &[TimeUnitPart] {
        &self.parts
    }

    pub fn has(&self, part: TimeUnitPart) -> bool {
        self.parts.contains(&part)
    }

    /// The finest included granularity; drives the interval end offset.
    pub fn smallest(&self) -> TimeUnitPart {
        self.parts.last().copied().unwrap_or(TimeUnitPart::Year)
    }

    /// The concatenated token form, e.g. `yearmonth` or `utcmonth`.
    pub fn token(&self) -> String {
        let mut out = String::new();
        if self.utc {
            out.push_str("utc");
        }
        for part in &self.parts {
            out.push_str(&part.to_string());
        }
        out
    }

    /// Map a timestamp to the start of the smallest calendar interval
    /// containing it, with unspecified parts pinned to the reference.
    pub fn floor(&self, dt: &NaiveDateTime) -> NaiveDateTime {
        let mut year = REFERENCE_YEAR;
        let mut month = 1u32;
        let mut day = 1u32;
        let mut hour = 0u32;
        let mut minute = 0u32;
        let mut second = 0u32;
        let mut milli = 0u32;

        for part in &self.parts {
            match part {
                TimeUnitPart::Year => year = dt.year(),
                TimeUnitPart::Quarter => month = 1 + 3 * (dt.month0() / 3),
                TimeUnitPart::Month => month = dt.month(),
                TimeUnitPart::Date => day = dt.day(),
                // Day-of-week buckets land in the reference week; the
                // reference January opens on a Sunday.
                TimeUnitPart::Day => day = 1 + dt.weekday().num_days_from_sunday(),
                TimeUnitPart::Hours => hour = dt.hour(),
                TimeUnitPart::Minutes => minute = dt.minute(),
                TimeUnitPart::Seconds => second = dt.second(),
                TimeUnitPart::Milliseconds => milli = dt.nanosecond() / 1_000_000,
            }
        }

        // A quarter start plus a day-of-month copied from another month can
        // name a nonexistent date (Apr 31); clamp into the month.
        let date = loop {
            match NaiveDate::from_ymd_opt(year, month, day) {
                Some(d) => break d,
                None => day -= 1,
            }
        };
        date.and_hms_milli_opt(hour, minute, second, milli)
            .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
    }

    /// Exclusive end of the interval starting at `start`: one unit of the
    /// smallest included granularity.
    pub fn interval_end(&self, start: &NaiveDateTime) -> NaiveDateTime {
        match self.smallest() {
            TimeUnitPart::Year => start
                .checked_add_months(Months::new(12))
                .unwrap_or(*start),
            TimeUnitPart::Quarter => {
                start.checked_add_months(Months::new(3)).unwrap_or(*start)
            }
            TimeUnitPart::Month => {
                start.checked_add_months(Months::new(1)).unwrap_or(*start)
            }
            TimeUnitPart::Date | TimeUnitPart::Day => *start + TimeDelta::days(1),
            TimeUnitPart::Hours => *start + TimeDelta::hours(1),
            TimeUnitPart::Minutes => *start + TimeDelta::minutes(1),
            TimeUnitPart::Seconds => *start + TimeDelta::seconds(1),
            TimeUnitPart::Milliseconds => *start + TimeDelta::milliseconds(1),
        }
    }

    /// Bucket label for the interval containing `dt`, e.g. "Jan 2012".
    pub fn format(&self, dt: &NaiveDateTime) -> String {
        let floored = self.floor(dt);
        let mut pieces: Vec<String> = Vec::new();
        for part in &self.parts {
            match part {
                TimeUnitPart::Year => pieces.push(floored.format("%Y").to_string()),
                TimeUnitPart::Quarter => pieces.push(format!("Q{}", 1 + floored.month0() / 3)),
                TimeUnitPart::Month => pieces.push(floored.format("%b").to_string()),
                TimeUnitPart::Date => pieces.push(floored.day().to_string()),
                TimeUnitPart::Day => pieces.push(floored.format("%a").to_string()),
                TimeUnitPart::Hours => pieces.push(format!("{:02}h", floored.hour())),
                TimeUnitPart::Minutes => pieces.push(format!("{:02}m", floored.minute())),
                TimeUnitPart::Seconds => pieces.push(format!("{:02}s", floored.second())),
                TimeUnitPart::Milliseconds => {
                    pieces.push(format!("{:03}ms", floored.nanosecond() / 1_000_000))
                }
            }
        }
        pieces.join(" ")
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for TimeUnit {
    type Err = TriptychTransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s;
        let utc = rest.starts_with("utc");
        if utc {
            rest = &rest["utc".len()..];
        }

        let mut parts = Vec::new();
        while !rest.is_empty() {
            let mut matched = false;
            for part in TimeUnitPart::iter() {
                let name = part.to_string();
                if rest.starts_with(&name) {
                    parts.push(part);
                    rest = &rest[name.len()..];
                    matched = true;
                    break;
                }
            }
            if !matched {
                return Err(TriptychTransformError::InvalidTimeUnit(s.to_string()));
            }
        }
        if parts.is_empty() {
            return Err(TriptychTransformError::InvalidTimeUnit(s.to_string()));
        }

        let unit = TimeUnit::new(parts);
        Ok(if utc { unit.utc() } else { unit })
    }
}

impl Serialize for TimeUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for TimeUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
