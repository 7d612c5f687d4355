use std::fmt;

use chrono::{DateTime, Utc};
use wps_common::truncate_to_hour;

/// Identifies one output sink: a name prefix and a valid time truncated to
/// the hour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputKey {
    prefix: String,
    valid_hour: DateTime<Utc>,
}

impl OutputKey {
    pub fn new(prefix: impl Into<String>, valid_time: DateTime<Utc>) -> Self {
        Self {
            prefix: prefix.into(),
            valid_hour: truncate_to_hour(valid_time),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn valid_hour(&self) -> DateTime<Utc> {
        self.valid_hour
    }

    /// Sink name, `"{prefix}:{YYYY-MM-DD_HH}"`.
    pub fn name(&self) -> String {
        format!("{}:{}", self.prefix, self.valid_hour.format("%Y-%m-%d_%H"))
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_name_format() {
        let key = OutputKey::new("out/FILE", Utc.with_ymd_and_hms(2015, 1, 2, 6, 0, 0).unwrap());
        assert_eq!(key.name(), "out/FILE:2015-01-02_06");
        assert_eq!(key.to_string(), "out/FILE:2015-01-02_06");
    }

    #[test]
    fn test_same_hour_same_key() {
        let a = OutputKey::new("FILE", Utc.with_ymd_and_hms(2015, 1, 1, 6, 0, 0).unwrap());
        let b = OutputKey::new("FILE", Utc.with_ymd_and_hms(2015, 1, 1, 6, 45, 10).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, OutputKey::new("OTHER", a.valid_hour()));
    }
}
