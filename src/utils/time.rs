use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive date-time layouts the calendar provider and older caches produce
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-time layouts that carry an offset but aren't strict RFC 3339
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Parse an event timestamp and normalize it to UTC.
///
/// Accepted shapes:
/// - RFC 3339 with an offset (`2024-05-01T10:00:00+03:00`)
/// - an offset without the colon (`2024-05-01T10:00:00+0300`)
/// - minute precision with an offset or `Z` (`2024-05-01T10:00+03:00`, `2024-05-01T10:00Z`)
/// - a naive date-time, which is taken to be UTC, never local time
/// - a date-only value (all-day events), which becomes UTC midnight
///
/// All-day events are therefore treated as UTC midnight to midnight, which can
/// misplace them for users far from UTC.
pub fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // A trailing `Z` is UTC, the same as no zone at all
    let naive_value = value.strip_suffix(['Z', 'z']).unwrap_or(value);
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whole minutes in a duration, truncated toward zero
pub fn whole_minutes(duration: Duration) -> i64 {
    duration.num_minutes()
}

/// Format a positive duration as `HH:MM:SS`
pub fn format_hms(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (mins, secs) = (total / 60, total % 60);
    let (hours, mins) = (mins / 60, mins % 60);
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Format a positive duration as `HH:MM`, dropping the seconds
pub fn format_hm(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let mins = total / 60;
    let (hours, mins) = (mins / 60, mins % 60);
    format!("{:02}:{:02}", hours, mins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_event_time_with_offset() {
        assert_eq!(
            parse_event_time("2024-05-01T10:00:00+03:00"),
            Some(utc(2024, 5, 1, 7, 0, 0))
        );
        assert_eq!(
            parse_event_time("2024-05-01T10:00:00Z"),
            Some(utc(2024, 5, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_event_time("2024-05-01T10:00:00+0300"),
            Some(utc(2024, 5, 1, 7, 0, 0))
        );
    }

    #[test]
    fn test_parse_event_time_minute_precision_with_zone() {
        assert_eq!(
            parse_event_time("2024-05-01T10:00Z"),
            Some(utc(2024, 5, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_event_time("2024-05-01T10:00+03:00"),
            Some(utc(2024, 5, 1, 7, 0, 0))
        );
        assert_eq!(
            parse_event_time("2024-05-01T10:00-0130"),
            Some(utc(2024, 5, 1, 11, 30, 0))
        );
    }

    #[test]
    fn test_parse_event_time_naive_is_utc() {
        assert_eq!(
            parse_event_time("2024-05-01T10:00:00"),
            Some(utc(2024, 5, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_event_time("2024-05-01 10:15"),
            Some(utc(2024, 5, 1, 10, 15, 0))
        );
        assert_eq!(
            parse_event_time("2024-05-01T10:00:00.250"),
            Some(utc(2024, 5, 1, 10, 0, 0) + Duration::milliseconds(250))
        );
    }

    #[test]
    fn test_parse_event_time_all_day() {
        assert_eq!(parse_event_time("2024-05-01"), Some(utc(2024, 5, 1, 0, 0, 0)));
    }

    #[test]
    fn test_parse_event_time_rejects_garbage() {
        assert_eq!(parse_event_time(""), None);
        assert_eq!(parse_event_time("tomorrow"), None);
        assert_eq!(parse_event_time("2024-13-01"), None);
        assert_eq!(parse_event_time("2024-05-01T25:00:00"), None);
    }

    #[test]
    fn test_whole_minutes() {
        assert_eq!(whole_minutes(Duration::seconds(899)), 14);
        assert_eq!(whole_minutes(Duration::seconds(900)), 15);
        assert_eq!(whole_minutes(Duration::seconds(-30)), 0);
        assert_eq!(whole_minutes(Duration::seconds(-90)), -1);
    }

    #[test]
    fn test_format_durations() {
        assert_eq!(format_hms(Duration::seconds(59)), "00:00:59");
        assert_eq!(format_hms(Duration::seconds(3_661)), "01:01:01");
        assert_eq!(format_hm(Duration::seconds(3_600)), "01:00");
        assert_eq!(format_hm(Duration::seconds(2_159)), "00:35");
        assert_eq!(format_hm(Duration::hours(101)), "101:00");
    }
}
