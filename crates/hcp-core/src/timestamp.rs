//! Timestamp helpers shared by documents and status views.

use crate::error::{CoreError, Result};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Current UTC time.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Returns the current UTC time, or one nanosecond past `previous` if the
/// clock has not moved beyond it. Transition timestamps built this way are
/// strictly increasing even under coarse clocks.
pub fn now_after(previous: OffsetDateTime) -> OffsetDateTime {
    let now = now_utc();
    if now > previous {
        now
    } else {
        previous + Duration::nanoseconds(1)
    }
}

/// Formats a timestamp as RFC 3339.
pub fn format_rfc3339(datetime: &OffsetDateTime) -> Result<String> {
    datetime
        .format(&Rfc3339)
        .map_err(|e| CoreError::invalid_timestamp(e.to_string()))
}

/// Parses an RFC 3339 timestamp.
pub fn parse_rfc3339(s: &str) -> Result<OffsetDateTime> {
    Ok(OffsetDateTime::parse(s, &Rfc3339)?)
}

pub fn from_unix_timestamp(timestamp: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(timestamp).map_err(|e| {
        CoreError::invalid_timestamp(format!("Invalid Unix timestamp {timestamp}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_now_after_past_timestamp_uses_clock() {
        let past = datetime!(2020-01-01 00:00:00 UTC);
        let next = now_after(past);
        assert!(next > past);
        assert!(next.year() >= 2024);
    }

    #[test]
    fn test_now_after_future_timestamp_advances_by_one_nanosecond() {
        let future = datetime!(2999-01-01 00:00:00 UTC);
        let next = now_after(future);
        assert_eq!(next - future, Duration::nanoseconds(1));
    }

    #[test]
    fn test_rfc3339_roundtrip_format() {
        let dt = datetime!(2024-06-10 14:30:00 UTC);
        let formatted = format_rfc3339(&dt).unwrap();
        assert_eq!(formatted, "2024-06-10T14:30:00Z");
        assert_eq!(parse_rfc3339(&formatted).unwrap(), dt);
    }

    #[test]
    fn test_parse_rfc3339_invalid() {
        assert!(parse_rfc3339("not-a-date").is_err());
        assert!(parse_rfc3339("2024-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_from_unix_timestamp() {
        let dt = from_unix_timestamp(1_718_000_000).unwrap();
        assert_eq!(dt.unix_timestamp(), 1_718_000_000);
        assert!(from_unix_timestamp(i64::MAX).is_err());
    }
}
