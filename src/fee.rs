// 🧮 Fee Computation - pure arithmetic, no persistence
//
// fee = rate × minutes / 60, rounded to 2 decimals (half away from zero).
// Time-of-day arithmetic never wraps past midnight: a leaving time earlier
// than the entry time is a zero-minute stay. Full date-times lift that limit.

use crate::error::{ParkingError, Result};
use chrono::{DateTime, Local, Timelike};
use std::fmt;

/// Hours and minutes since midnight; seconds are dropped on parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(ParkingError::InvalidTime(format!("{}:{:02}", hour, minute)));
        }
        Ok(TimeOfDay { hour, minute })
    }

    /// Parse `H:MM`, `HH:MM`, `HH:MM:SS`, each optionally followed by AM/PM
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || ParkingError::InvalidTime(text.to_string());

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let upper = trimmed.to_uppercase();
        let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest.trim_end(), Some(false))
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest.trim_end(), Some(true))
        } else {
            (upper.as_str(), None)
        };

        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let mut numbers = Vec::with_capacity(parts.len());
        for part in &parts {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            numbers.push(part.parse::<u32>().map_err(|_| invalid())?);
        }

        let mut hour = numbers[0];
        let minute = numbers[1];
        if numbers.len() == 3 && numbers[2] > 59 {
            return Err(invalid());
        }

        if let Some(pm) = meridiem {
            if hour == 0 || hour > 12 {
                return Err(invalid());
            }
            hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
        }

        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }

    pub fn from_datetime(dt: &DateTime<Local>) -> Self {
        TimeOfDay {
            hour: dt.hour(),
            minute: dt.minute(),
        }
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Minutes from entry to leaving on the same clock face, clamped at zero
pub fn duration_minutes(entry: TimeOfDay, leaving: TimeOfDay) -> i64 {
    let entry = entry.minutes_since_midnight() as i64;
    let leaving = leaving.minutes_since_midnight() as i64;
    (leaving - entry).max(0)
}

/// Whole minutes between two instants, seconds truncated, clamped at zero
pub fn minutes_between(start: &DateTime<Local>, end: &DateTime<Local>) -> i64 {
    let start_minute = start.timestamp().div_euclid(60);
    let end_minute = end.timestamp().div_euclid(60);
    (end_minute - start_minute).max(0)
}

/// Charge for a stay of `minutes` at `hourly_rate`
pub fn fee_for(hourly_rate: f64, minutes: i64) -> f64 {
    round2(hourly_rate * (minutes.max(0) as f64) / 60.0)
}

pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
