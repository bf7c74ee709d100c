//! Time-of-day value used for timetable start/end times and grid slots.
//!
//! # Invariants
//! - Values always lie within `00:00:00..=23:59:59`.
//! - Ordering follows wall-clock time, so `09:00` and `09:00:00` are equal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static TIME_OF_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2}))?$").expect("valid time-of-day regex")
});

/// Wall-clock time with second precision, stored as seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u32);

/// Rejected time-of-day text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeOfDayParseError(String);

impl Display for TimeOfDayParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid time of day `{}`; expected HH:MM or HH:MM:SS",
            self.0
        )
    }
}

impl Error for TimeOfDayParseError {}

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self(0);

    /// Builds a time from components, returning `None` when out of range.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour < 24 && minute < 60 && second < 60 {
            Some(Self(hour * 3600 + minute * 60 + second))
        } else {
            None
        }
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        Self::from_hms(hour, minute, 0)
    }

    pub fn hour(self) -> u32 {
        self.0 / 3600
    }

    pub fn minute(self) -> u32 {
        (self.0 / 60) % 60
    }

    pub fn second(self) -> u32 {
        self.0 % 60
    }

    /// Fixed-width `HH:MM:SS` form; sorts lexicographically in time order.
    pub fn to_storage_string(self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || TimeOfDayParseError(trimmed.to_string());
        let captures = TIME_OF_DAY_RE.captures(trimmed).ok_or_else(invalid)?;

        let component = |index: usize| -> Result<u32, TimeOfDayParseError> {
            match captures.get(index) {
                Some(matched) => matched.as_str().parse::<u32>().map_err(|_| invalid()),
                None => Ok(0),
            }
        };

        Self::from_hms(component(1)?, component(2)?, component(3)?).ok_or_else(invalid)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = if self.second() == 0 {
            format!("{:02}:{:02}", self.hour(), self.minute())
        } else {
            self.to_storage_string()
        };
        f.pad(&text)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::TimeOfDay;

    #[test]
    fn parses_minute_and_second_precision() {
        let short: TimeOfDay = "09:00".parse().unwrap();
        let long: TimeOfDay = "09:00:00".parse().unwrap();
        assert_eq!(short, long);
        assert_eq!(short.hour(), 9);

        let precise: TimeOfDay = " 13:45:30 ".parse().unwrap();
        assert_eq!(precise.minute(), 45);
        assert_eq!(precise.second(), 30);
    }

    #[test]
    fn rejects_out_of_range_and_malformed_values() {
        for raw in ["24:00", "09:60", "9:00", "09:00:61", "", "noon"] {
            assert!(raw.parse::<TimeOfDay>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn orders_by_clock_time_not_text() {
        let nine: TimeOfDay = "09:00:00".parse().unwrap();
        let nine_thirty: TimeOfDay = "09:30".parse().unwrap();
        assert!(nine < nine_thirty);
        assert!(TimeOfDay::MIDNIGHT < nine);
    }

    #[test]
    fn display_drops_zero_seconds_and_storage_keeps_them() {
        let time = TimeOfDay::from_hm(8, 5).unwrap();
        assert_eq!(time.to_string(), "08:05");
        assert_eq!(time.to_storage_string(), "08:05:00");
        assert_eq!(TimeOfDay::from_hms(8, 5, 9).unwrap().to_string(), "08:05:09");
    }
}
