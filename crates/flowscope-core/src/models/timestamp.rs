//! ISO-8601 timestamp helpers
//!
//! Canonical timestamps are UTC with millisecond precision and a `Z`
//! suffix, e.g. `2024-01-01T00:00:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Parse an RFC 3339 / ISO-8601 timestamp into UTC
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp in canonical form
pub fn format(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `value` is a canonical timestamp.
///
/// Holds only when parsing and re-rendering reproduces the exact input, so
/// date-equivalent spellings such as `+00:00` offsets, missing
/// milliseconds or microsecond precision are rejected.
pub fn is_canonical(value: &str) -> bool {
    parse(value).is_some_and(|dt| format(dt) == value)
}

/// Earliest canonical instant, `0000-01-01T00:00:00.000Z`, in epoch ms
pub const MIN_EPOCH_MILLIS: i64 = -62_167_219_200_000;

/// Latest canonical instant, `9999-12-31T23:59:59.999Z`, in epoch ms
pub const MAX_EPOCH_MILLIS: i64 = 253_402_300_799_999;

/// Convert epoch milliseconds into a UTC timestamp.
///
/// Only four-digit years have a canonical rendering, so instants outside
/// [`MIN_EPOCH_MILLIS`]..=[`MAX_EPOCH_MILLIS`] yield `None`.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    if !(MIN_EPOCH_MILLIS..=MAX_EPOCH_MILLIS).contains(&millis) {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

/// Current time in canonical form
pub fn now() -> String {
    format(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-01T00:00:00.000Z", true)]
    #[case("2023-11-14T22:13:20.000Z", true)]
    #[case("2024-01-01T00:00:00Z", false)]
    #[case("2024-01-01T00:00:00.000+00:00", false)]
    #[case("2024-01-01T00:00:00.000000Z", false)]
    #[case("2024-01-01", false)]
    #[case("not-a-date", false)]
    #[case("", false)]
    fn test_is_canonical(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_canonical(value), expected);
    }

    #[test]
    fn test_epoch_millis_round_trip() {
        let dt = from_epoch_millis(1_700_000_000_000).unwrap();

        assert_eq!(format(dt), "2023-11-14T22:13:20.000Z");
        assert_eq!(parse("2023-11-14T22:13:20.000Z").unwrap().timestamp_millis(), 1_700_000_000_000);
    }

    #[rstest]
    #[case(MIN_EPOCH_MILLIS, Some("0000-01-01T00:00:00.000Z"))]
    #[case(MAX_EPOCH_MILLIS, Some("9999-12-31T23:59:59.999Z"))]
    #[case(MIN_EPOCH_MILLIS - 1, None)]
    #[case(MAX_EPOCH_MILLIS + 1, None)]
    fn test_epoch_range_stays_canonical(#[case] millis: i64, #[case] expected: Option<&str>) {
        let rendered = from_epoch_millis(millis).map(format);

        assert_eq!(rendered.as_deref(), expected);
        assert!(rendered.as_deref().map_or(true, is_canonical));
    }

    #[test]
    fn test_now_is_canonical() {
        assert!(is_canonical(&now()));
    }
}
