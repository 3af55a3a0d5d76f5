//! Time buckets used to group readings before plotting.
//!
//! An interval is either a number of minutes (3 to 60 in steps of 3) or a
//! number of hours (1 to 24). Timestamps are rounded to the *nearest* multiple
//! of the interval counted from the Unix epoch, with exact ties rounded to the
//! even multiple.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeInterval {
    Minutes(u32),
    Hours(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum IntervalError {
    #[display("invalid time interval '{input}' (expected e.g. '15min' or '2h')")]
    Format { input: String },
    #[display("minute interval must be a multiple of 3 between 3 and 60, got {minutes}")]
    MinutesOutOfRange { minutes: u32 },
    #[display("hour interval must be between 1 and 24, got {hours}")]
    HoursOutOfRange { hours: u32 },
}

impl Default for TimeInterval {
    fn default() -> Self {
        Self::Minutes(3)
    }
}

impl TimeInterval {
    pub fn minutes(minutes: u32) -> Result<Self, IntervalError> {
        if (3..=60).contains(&minutes) && minutes % 3 == 0 {
            Ok(Self::Minutes(minutes))
        } else {
            Err(IntervalError::MinutesOutOfRange { minutes })
        }
    }

    pub fn hours(hours: u32) -> Result<Self, IntervalError> {
        if (1..=24).contains(&hours) {
            Ok(Self::Hours(hours))
        } else {
            Err(IntervalError::HoursOutOfRange { hours })
        }
    }

    #[must_use]
    pub fn duration(self) -> TimeDelta {
        match self {
            Self::Minutes(m) => TimeDelta::minutes(i64::from(m)),
            Self::Hours(h) => TimeDelta::hours(i64::from(h)),
        }
    }

    /// Rounds a timestamp to the nearest multiple of this interval.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chrono::NaiveDateTime;
    /// # use envdash_analysis::interval::TimeInterval;
    /// let ts = NaiveDateTime::parse_from_str("2024-03-01 10:04:31", "%Y-%m-%d %H:%M:%S").unwrap();
    /// let rounded = TimeInterval::Minutes(3).round(ts);
    /// assert_eq!(rounded.to_string(), "2024-03-01 10:06:00");
    /// ```
    #[must_use]
    pub fn round(self, timestamp: NaiveDateTime) -> NaiveDateTime {
        round_to_micros(timestamp, self.duration().num_microseconds().unwrap_or(0))
    }
}

/// Rounds to the nearest multiple of `unit` microseconds, ties to even.
fn round_to_micros(timestamp: NaiveDateTime, unit: i64) -> NaiveDateTime {
    if unit <= 0 {
        return timestamp;
    }
    let micros = timestamp.and_utc().timestamp_micros();
    let mut quotient = micros.div_euclid(unit);
    let remainder = micros.rem_euclid(unit);
    match (2 * remainder).cmp(&unit) {
        std::cmp::Ordering::Greater => quotient += 1,
        std::cmp::Ordering::Equal if quotient % 2 != 0 => quotient += 1,
        _ => {}
    }
    DateTime::from_timestamp_micros(quotient * unit).map_or(timestamp, |dt| dt.naive_utc())
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes(m) => write!(f, "{m}min"),
            Self::Hours(h) => write!(f, "{h}H"),
        }
    }
}

impl FromStr for TimeInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let format_error = || IntervalError::Format {
            input: s.to_owned(),
        };
        let split = input
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(format_error)?;
        let (number, suffix) = input.split_at(split);
        let number = number.parse::<u32>().map_err(|_| format_error())?;
        match suffix.trim().to_ascii_lowercase().as_str() {
            "min" | "m" => Self::minutes(number),
            "h" => Self::hours(number),
            _ => Err(format_error()),
        }
    }
}

impl TryFrom<String> for TimeInterval {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeInterval> for String {
    fn from(value: TimeInterval) -> Self {
        value.to_string()
    }
}
