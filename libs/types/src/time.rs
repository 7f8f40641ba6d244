//! Timestamps

use chrono::{DateTime, Duration, Utc};

/// Wall-clock instant, always UTC.
pub type Timestamp = DateTime<Utc>;

/// `start + hours`, or `None` if that overflows the representable range.
pub fn add_hours(start: Timestamp, hours: u32) -> Option<Timestamp> {
    start.checked_add_signed(Duration::hours(i64::from(hours)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_hours() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let end = add_hours(start, 6).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_add_zero_hours() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(add_hours(start, 0), Some(start));
    }
}
