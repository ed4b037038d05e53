//! Parsing of the free-form durations typed into time entries.
//!
//! Accepted forms:
//! - decimal hours: `1.5`, `2`
//! - clock style: `1:30`
//! - unit style: `1h 30m`, `2h`, `45m`, `90 min`, `1.5 hours`

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    static ref DECIMAL_HOURS: Regex = Regex::new(r"^(\d+(?:\.\d+)?)$").unwrap();

    static ref CLOCK: Regex = Regex::new(r"^(\d+):(\d{2})$").unwrap();

    static ref UNITS: Regex = Regex::new(
        r"^(?:(\d+(?:\.\d+)?)\s*(?:h|hr|hrs|hour|hours))?\s*(?:(\d+)\s*(?:m|min|mins|minute|minutes))?$"
    ).unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration is required")]
    Empty,
    #[error("minutes must be between 00 and 59 in '{0}'")]
    MinutesOutOfRange(String),
    #[error("duration must be greater than zero")]
    Zero,
    #[error("unrecognised duration '{0}'")]
    Malformed(String),
}

/// A whole number of worked minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkDuration {
    pub minutes: u32,
}

impl WorkDuration {
    /// Billable hours, rounded to two decimals
    pub fn hours(&self) -> f64 {
        (self.minutes as f64 / 60.0 * 100.0).round() / 100.0
    }

    pub fn parse(input: &str) -> Result<Self, DurationParseError> {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DurationParseError::Empty);
        }

        let minutes = if let Some(caps) = DECIMAL_HOURS.captures(&normalized) {
            hours_to_minutes(&caps[1])
        } else if let Some(caps) = CLOCK.captures(&normalized) {
            let hours: u32 = caps[1]
                .parse()
                .map_err(|_| DurationParseError::Malformed(input.to_string()))?;
            let mins: u32 = caps[2]
                .parse()
                .map_err(|_| DurationParseError::Malformed(input.to_string()))?;
            if mins >= 60 {
                return Err(DurationParseError::MinutesOutOfRange(input.to_string()));
            }
            hours.checked_mul(60).and_then(|h| h.checked_add(mins))
        } else if let Some(caps) = UNITS.captures(&normalized) {
            let hours = caps.get(1).map(|m| hours_to_minutes(m.as_str()));
            let mins = caps.get(2).map(|m| m.as_str().parse::<u32>().ok());
            match (hours, mins) {
                (None, None) => None,
                (h, m) => {
                    let h = h.unwrap_or(Some(0));
                    let m = m.unwrap_or(Some(0));
                    h.zip(m).and_then(|(h, m)| h.checked_add(m))
                }
            }
        } else {
            None
        };

        match minutes {
            Some(0) => Err(DurationParseError::Zero),
            Some(minutes) => Ok(Self { minutes }),
            None => Err(DurationParseError::Malformed(input.to_string())),
        }
    }
}

fn hours_to_minutes(raw: &str) -> Option<u32> {
    let hours: f64 = raw.parse().ok()?;
    let minutes = (hours * 60.0).round();
    if minutes > u32::MAX as f64 {
        return None;
    }
    Some(minutes as u32)
}

impl std::str::FromStr for WorkDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for WorkDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}
