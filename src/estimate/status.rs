//! Presentation strings for status snapshots

use crate::utils::{format_clock_time, format_duration, ClockStyle, DisplayZone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Formats instants and durations for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusFormatter {
    pub clock_style: ClockStyle,
    pub zone: DisplayZone,
}

impl StatusFormatter {
    pub fn new(clock_style: ClockStyle, zone: DisplayZone) -> Self {
        Self { clock_style, zone }
    }

    /// 24-hour UTC output, independent of the host time zone
    pub fn utc_24h() -> Self {
        Self::new(ClockStyle::TwentyFourHour, DisplayZone::Utc)
    }

    pub fn clock(&self, instant: DateTime<Utc>) -> String {
        format_clock_time(instant, self.clock_style, self.zone)
    }

    pub fn duration(&self, seconds: f64) -> String {
        format_duration(seconds)
    }
}

/// Round to one decimal place
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_formatter() {
        let formatter = StatusFormatter::utc_24h();
        let instant = DateTime::from_timestamp(3_600 * 5 + 61, 0).unwrap();

        assert_eq!(formatter.clock(instant), "05:01:01");
        assert_eq!(formatter.duration(125.7), "00:02:05");
    }

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(32.04), 32.0);
        assert_eq!(round_tenths(17.25), 17.3);
        assert_eq!(round_tenths(10.0), 10.0);
    }
}
