use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Handles parsing the timestamp formats the analytics backend emits
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a timestamp string into a DateTime<Utc>
    /// Handles both Z suffix and timezone info formats
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Utc>> {
        let timestamp = timestamp_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
            return Ok(dt.with_timezone(&Utc));
        }

        // Try parsing as naive datetime and assume UTC
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, format) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }

    /// Parse, discarding failures
    pub fn parse_opt(timestamp_str: &str) -> Option<DateTime<Utc>> {
        Self::parse(timestamp_str).ok()
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

/// "just now", "5 minutes ago", "1 hour ago", "3 days ago"
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);

    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        plural(elapsed.num_minutes(), "minute")
    } else if elapsed.num_days() < 1 {
        plural(elapsed.num_hours(), "hour")
    } else {
        plural(elapsed.num_days(), "day")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_z_suffix() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000Z");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_timezone() {
        let result = TimestampParser::parse("2024-01-01T15:00:00.000+03:00").unwrap();
        assert_eq!(result, TimestampParser::parse("2024-01-01T12:00:00Z").unwrap());
    }

    #[test]
    fn test_parse_naive() {
        assert!(TimestampParser::parse("2024-01-01T12:00:00.000").is_ok());
        assert!(TimestampParser::parse("2024-01-01 12:00:00").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TimestampParser::parse("invalid").is_err());
        assert!(TimestampParser::parse_opt("").is_none());
    }

    #[test]
    fn test_relative_time() {
        let now = TimestampParser::parse("2025-03-10T12:00:00Z").unwrap();
        assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_relative_time(now + Duration::minutes(5), now), "just now");
        assert_eq!(format_relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_relative_time(now - Duration::minutes(59), now), "59 minutes ago");
        assert_eq!(format_relative_time(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(format_relative_time(now - Duration::hours(23), now), "23 hours ago");
        assert_eq!(format_relative_time(now - Duration::days(3), now), "3 days ago");
    }
}
