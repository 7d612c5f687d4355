//! CF-convention time axis decoding.
//!
//! Time coordinates are stored as numeric offsets from a reference date,
//! described by a `units` attribute such as `"days since 1850-01-01"` and an
//! optional `calendar` attribute. Offsets are rounded to the nearest second.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Supported calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// Mixed Gregorian; treated as proleptic Gregorian
    Standard,
    /// 365-day years, no leap days
    NoLeap,
}

impl Calendar {
    /// Parse a CF `calendar` attribute. A missing attribute means `standard`.
    pub fn parse(name: Option<&str>) -> NetCdfResult<Self> {
        match name.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("standard") | Some("gregorian") | Some("proleptic_gregorian") => {
                Ok(Calendar::Standard)
            }
            Some("noleap") | Some("365_day") => Ok(Calendar::NoLeap),
            Some(other) => Err(NetCdfError::InvalidTime(format!(
                "unsupported calendar '{}'",
                other
            ))),
        }
    }
}

/// Parsed `"<unit> since <reference>"` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    /// Seconds per unit
    pub seconds_per_unit: f64,
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower.split_once(" since ").ok_or_else(|| {
            NetCdfError::InvalidTime(format!("expected '<unit> since <date>', got '{}'", units))
        })?;

        let seconds_per_unit = match unit.trim() {
            "days" | "day" | "d" => 86_400.0,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
            other => {
                return Err(NetCdfError::InvalidTime(format!(
                    "unsupported time unit '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            seconds_per_unit,
            reference: parse_reference(reference.trim())?,
        })
    }
}

fn parse_reference(s: &str) -> NetCdfResult<NaiveDateTime> {
    let s = s
        .trim_end_matches(" utc")
        .trim_end_matches('z')
        .trim();

    // Date part followed by an optional time-of-day
    let (date, time) = match s.split_once(|c| c == ' ' || c == 't') {
        Some((d, t)) => (d, Some(t.trim())),
        None => (s, None),
    };

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| NetCdfError::InvalidTime(format!("invalid reference date '{}'", s)))?;

    let time = match time {
        None | Some("") => chrono::NaiveTime::MIN,
        Some(t) => ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M", "%H"]
            .iter()
            .find_map(|fmt| chrono::NaiveTime::parse_from_str(t, fmt).ok())
            .ok_or_else(|| NetCdfError::InvalidTime(format!("invalid reference time '{}'", t)))?,
    };

    Ok(date.and_time(time))
}

const NOLEAP_MONTH_DAYS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn noleap_day_number(year: i64, month: u32, day: u32) -> NetCdfResult<i64> {
    let m = month as usize;
    if !(1..=12).contains(&m) || day == 0 || day as i64 > NOLEAP_MONTH_DAYS[m - 1] {
        return Err(NetCdfError::InvalidTime(format!(
            "{:04}-{:02}-{:02} does not exist in a 365-day calendar",
            year, month, day
        )));
    }
    let before: i64 = NOLEAP_MONTH_DAYS[..m - 1].iter().sum();
    Ok(year * 365 + before + day as i64 - 1)
}

fn noleap_date(day_number: i64) -> NetCdfResult<NaiveDate> {
    let year = day_number.div_euclid(365);
    let mut doy = day_number.rem_euclid(365);
    let mut month = 1u32;
    for len in NOLEAP_MONTH_DAYS {
        if doy < len {
            break;
        }
        doy -= len;
        month += 1;
    }
    let year = i32::try_from(year)
        .map_err(|_| NetCdfError::InvalidTime(format!("year {} out of range", year)))?;
    NaiveDate::from_ymd_opt(year, month, doy as u32 + 1)
        .ok_or_else(|| NetCdfError::InvalidTime(format!("year {} out of range", year)))
}

fn offset_seconds(value: f64, units: &TimeUnits) -> NetCdfResult<i64> {
    if !value.is_finite() {
        return Err(NetCdfError::InvalidTime(format!("non-finite time value {}", value)));
    }
    let secs = (value * units.seconds_per_unit).round();
    if secs.abs() >= i64::MAX as f64 {
        return Err(NetCdfError::InvalidTime(format!("time value {} out of range", value)));
    }
    Ok(secs as i64)
}

fn overflow(value: f64) -> NetCdfError {
    NetCdfError::InvalidTime(format!("time value {} overflows", value))
}

/// Decode numeric time offsets into UTC instants.
///
/// Dates in the 365-day calendar map onto the Gregorian date with the same
/// year, month, day and time of day.
pub fn decode_times(
    units: &str,
    calendar: Option<&str>,
    values: &[f64],
) -> NetCdfResult<Vec<DateTime<Utc>>> {
    let units = TimeUnits::parse(units)?;
    let calendar = Calendar::parse(calendar)?;

    values
        .iter()
        .map(|&v| {
            let secs = offset_seconds(v, &units)?;
            let naive = match calendar {
                Calendar::Standard => Duration::try_seconds(secs)
                    .and_then(|offset| units.reference.checked_add_signed(offset))
                    .ok_or_else(|| overflow(v))?,
                Calendar::NoLeap => {
                    let r = units.reference;
                    let ref_day = noleap_day_number(r.year() as i64, r.month(), r.day())?;
                    let total = ref_day
                        .checked_mul(86_400)
                        .and_then(|t| t.checked_add(r.num_seconds_from_midnight() as i64))
                        .and_then(|t| t.checked_add(secs))
                        .ok_or_else(|| overflow(v))?;
                    let date = noleap_date(total.div_euclid(86_400))?;
                    Duration::try_seconds(total.rem_euclid(86_400))
                        .and_then(|tod| date.and_time(chrono::NaiveTime::MIN).checked_add_signed(tod))
                        .ok_or_else(|| overflow(v))?
                }
            };
            Ok(Utc.from_utc_datetime(&naive))
        })
        .collect()
}
