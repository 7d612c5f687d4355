//! Time handling for valid times and output sampling windows.

use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Truncate a timestamp to the start of its hour.
pub fn truncate_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.duration_trunc(Duration::hours(1)).unwrap_or(dt)
}

/// Parse a date or date-time string as UTC.
///
/// Supports:
/// - RFC 3339: "2015-01-01T06:00:00Z"
/// - Naive date-time: "2015-01-01T06:00:00" or "2015-01-01 06:00:00"
/// - Date only: "2015-01-01" (midnight)
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Parse a sampling interval such as "6h", "1d", "30min" or "3600s".
///
/// Unit suffixes are case-insensitive: `s`/`sec`, `min`/`t`, `h`/`hr`,
/// `d`/`day`. A bare unit means one of it ("h" is one hour).
pub fn parse_interval(s: &str) -> Result<Duration, TimeParseError> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (count, unit) = trimmed.split_at(split);

    let count: i64 = if count.is_empty() {
        1
    } else {
        count
            .parse()
            .map_err(|_| TimeParseError::InvalidInterval(s.to_string()))?
    };

    let interval = match unit.trim().to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" => Duration::seconds(count),
        "min" | "mins" | "t" => Duration::minutes(count),
        "h" | "hr" | "hrs" | "hour" | "hours" => Duration::hours(count),
        "d" | "day" | "days" => Duration::days(count),
        _ => return Err(TimeParseError::InvalidInterval(s.to_string())),
    };

    if interval <= Duration::zero() {
        return Err(TimeParseError::InvalidInterval(s.to_string()));
    }
    Ok(interval)
}

/// A closed time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// Time stamps `start, start + interval, ...` up to and including `end`.
    ///
    /// An empty list is returned when `end` precedes `start`.
    pub fn stamps(&self, interval: Duration) -> Result<Vec<DateTime<Utc>>, TimeParseError> {
        if interval <= Duration::zero() {
            return Err(TimeParseError::InvalidInterval(interval.to_string()));
        }

        let mut stamps = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            stamps.push(current);
            current += interval;
        }
        Ok(stamps)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid sampling interval: {0}")]
    InvalidInterval(String),
}
