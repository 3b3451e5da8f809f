//! Session Time
//!
//! Chat sessions run on a millisecond clock that starts at zero when the
//! session opens. The engine advances it explicitly, so the same clock drives
//! both real-time play and accelerated or single-stepped runs.
//!
//! # Example
//!
//! ```
//! use chat_events::SimTime;
//!
//! let t = SimTime::from_secs(90);
//! assert_eq!(t.to_string(), "01:30");
//! assert_eq!("1:30".parse::<SimTime>().unwrap(), t);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: u64 = 1000;

/// A point on the session clock, in milliseconds since the session opened.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    /// The moment the session opened.
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs * MILLIS_PER_SECOND)
    }

    /// Converts fractional seconds, saturating at zero for negative input.
    pub fn from_secs_f32(secs: f32) -> Self {
        Self((secs.max(0.0) * MILLIS_PER_SECOND as f32).round() as u64)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / MILLIS_PER_SECOND as f32
    }

    /// Returns the time `millis` milliseconds after this one.
    pub fn after(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is later).
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for SimTime {
    /// Formats as `mm:ss`, or `h:mm:ss` once the session passes an hour.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0 / MILLIS_PER_SECOND;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        if hours > 0 {
            write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            write!(f, "{:02}:{:02}", minutes, seconds)
        }
    }
}

/// Error type for parsing a [`SimTime`] from a string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseTimeError {
    #[error("invalid time format: '{0}', expected seconds, 'mm:ss' or 'h:mm:ss'")]
    InvalidFormat(String),
    #[error("invalid time component: '{0}'")]
    InvalidComponent(String),
}

impl FromStr for SimTime {
    type Err = ParseTimeError;

    /// Parses plain (fractional) seconds, `mm:ss` or `h:mm:ss`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseTimeError::InvalidFormat(s.to_string()));
        }

        if !s.contains(':') {
            let secs = s
                .parse::<f32>()
                .map_err(|_| ParseTimeError::InvalidComponent(s.to_string()))?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(ParseTimeError::InvalidComponent(s.to_string()));
            }
            return Ok(SimTime::from_secs_f32(secs));
        }

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() > 3 {
            return Err(ParseTimeError::InvalidFormat(s.to_string()));
        }

        let mut total_secs: u64 = 0;
        for (index, part) in parts.iter().enumerate() {
            let value = part
                .parse::<u64>()
                .map_err(|_| ParseTimeError::InvalidComponent(part.to_string()))?;
            // Every component after the leading one is a base-60 digit
            if index > 0 && value >= 60 {
                return Err(ParseTimeError::InvalidComponent(part.to_string()));
            }
            total_secs = total_secs * 60 + value;
        }

        Ok(SimTime::from_secs(total_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_minutes_and_hours() {
        assert_eq!(SimTime::ZERO.to_string(), "00:00");
        assert_eq!(SimTime::from_millis(61_999).to_string(), "01:01");
        assert_eq!(SimTime::from_secs(3723).to_string(), "1:02:03");
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("12".parse::<SimTime>().unwrap(), SimTime::from_secs(12));
        assert_eq!("2.5".parse::<SimTime>().unwrap(), SimTime::from_millis(2500));
        assert_eq!("03:05".parse::<SimTime>().unwrap(), SimTime::from_secs(185));
        assert_eq!("1:00:00".parse::<SimTime>().unwrap(), SimTime::from_secs(3600));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<SimTime>().is_err());
        assert!("abc".parse::<SimTime>().is_err());
        assert!("1:75".parse::<SimTime>().is_err());
        assert!("-3".parse::<SimTime>().is_err());
        assert!("1:2:3:4".parse::<SimTime>().is_err());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let t = SimTime::from_secs(5);
        assert_eq!(t.after(250).as_millis(), 5250);
        assert_eq!(t.since(SimTime::from_secs(2)), 3000);
        assert_eq!(SimTime::from_secs(2).since(t), 0);
    }
}
