//! Utility functions for the queue estimator

use crate::error::{QueueError, Result};
use crate::types::QueueSize;
use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Get the current UTC timestamp, truncated to millisecond precision
pub fn current_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Signed number of seconds from `from` to `to`
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    to.signed_duration_since(from).num_milliseconds() as f64 / 1000.0
}

/// Add a fractional number of seconds to an instant (millisecond resolution).
///
/// Saturates at the representable range instead of overflowing.
pub fn add_seconds(instant: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    let saturated = if seconds < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };

    if seconds.is_nan() {
        return instant;
    }

    TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(saturated)
}

/// Format seconds as `HH:MM:SS`, flooring fractions and clamping negatives to zero
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// How clock times are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockStyle {
    /// `07:45 PM`
    #[default]
    TwelveHour,
    /// `19:45:12`
    TwentyFourHour,
}

/// Time zone used for rendering clock times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

/// Format an instant as a human-readable clock time
pub fn format_clock_time(instant: DateTime<Utc>, style: ClockStyle, zone: DisplayZone) -> String {
    let pattern = match style {
        ClockStyle::TwelveHour => "%I:%M %p",
        ClockStyle::TwentyFourHour => "%H:%M:%S",
    };

    match zone {
        DisplayZone::Local => instant.with_timezone(&Local).format(pattern).to_string(),
        DisplayZone::Utc => instant.format(pattern).to_string(),
    }
}

/// Parse user-entered queue size text
pub fn parse_queue_size(input: &str) -> Result<QueueSize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(QueueError::invalid_input("queue size is required").into());
    }

    let value: i64 = trimmed.parse().map_err(|_| {
        QueueError::invalid_input(format!("queue size must be a whole number, got '{}'", trimmed))
    })?;

    if value < 0 {
        return Err(QueueError::invalid_input(format!(
            "queue size cannot be negative, got {}",
            value
        ))
        .into());
    }

    QueueSize::try_from(value)
        .map_err(|_| QueueError::invalid_input(format!("queue size {} is too large", value)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(32.0), "00:00:32");
        assert_eq!(format_duration(3_725.0), "01:02:05");
        assert_eq!(format_duration(-15.0), "00:00:00");
        assert_eq!(format_duration(f64::NAN), "00:00:00");
    }

    #[test]
    fn test_format_clock_time_utc() {
        let instant = DateTime::parse_from_rfc3339("2024-05-01T19:45:12Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(
            format_clock_time(instant, ClockStyle::TwelveHour, DisplayZone::Utc),
            "07:45 PM"
        );
        assert_eq!(
            format_clock_time(instant, ClockStyle::TwentyFourHour, DisplayZone::Utc),
            "19:45:12"
        );
    }

    #[test]
    fn test_seconds_between_and_add_seconds() {
        let t0 = DateTime::from_timestamp_millis(1_000_000).unwrap();
        let t1 = add_seconds(t0, 100.5);
        assert_eq!(seconds_between(t0, t1), 100.5);
        assert_eq!(seconds_between(t1, t0), -100.5);
    }

    #[test]
    fn test_add_seconds_saturates() {
        let t0 = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

        assert_eq!(add_seconds(t0, 1e18), DateTime::<Utc>::MAX_UTC);
        assert_eq!(add_seconds(t0, f64::INFINITY), DateTime::<Utc>::MAX_UTC);
        assert_eq!(add_seconds(t0, -1e18), DateTime::<Utc>::MIN_UTC);
        assert_eq!(add_seconds(t0, f64::NAN), t0);
    }

    #[test]
    fn test_current_timestamp_has_millisecond_precision() {
        let now = current_timestamp();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_parse_queue_size() {
        assert_eq!(parse_queue_size("15").unwrap(), 15);
        assert_eq!(parse_queue_size(" 0 ").unwrap(), 0);

        for bad in ["", "abc", "-3", "4.5", "99999999999"] {
            let err = parse_queue_size(bad).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<QueueError>(),
                    Some(QueueError::InvalidInput { .. })
                ),
                "expected InvalidInput for {:?}",
                bad
            );
        }
    }
}
