//! Timestamp value object for immutable points in time.
//!
//! The framework exchanges timestamps as RFC 3339 strings. PocketBase stores
//! `date` columns as `YYYY-MM-DD HH:MM:SS.sssZ` and returns that form on
//! reads, so both are accepted by [`Timestamp::parse`].

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ValidationError;

/// Layout PocketBase uses for `date` columns.
const STORE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

/// Immutable point in time, always UTC, with millisecond precision.
///
/// Every constructor drops sub-millisecond digits so a value compares equal
/// to itself after a store write/read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment, truncated to milliseconds.
    ///
    /// PocketBase keeps millisecond precision, so anything finer would not
    /// survive a write/read cycle.
    pub fn now() -> Self {
        Self::from_unix_millis(Utc::now().timestamp_millis())
    }

    /// Creates a timestamp from a DateTime<Utc>, truncated to milliseconds.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from Unix milliseconds.
    pub fn from_unix_millis(millis: i64) -> Self {
        Self(
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self::from_unix_millis(secs.saturating_mul(1000))
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    ///
    /// Negative values subtract.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self::from_datetime(self.0 + Duration::seconds(secs))
    }

    /// Creates a new timestamp by adding the specified number of hours.
    pub fn plus_hours(&self, hours: i64) -> Self {
        Self::from_datetime(self.0 + Duration::hours(hours))
    }

    /// Creates a new timestamp by adding the specified number of days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self::from_datetime(self.0 + Duration::days(days))
    }

    /// RFC 3339 with millisecond precision, the form written to the store.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// The `YYYY-MM-DD HH:MM:SS.sssZ` form PocketBase returns for dates.
    pub fn to_store_format(&self) -> String {
        self.0.format(STORE_DATE_FORMAT).to_string()
    }

    /// Parses either RFC 3339 or PocketBase's date layout.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("timestamp"));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }

        NaiveDateTime::parse_from_str(raw, STORE_DATE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%SZ"))
            .map(|naive| Self::from_datetime(naive.and_utc()))
            .map_err(|e| ValidationError::invalid_format("timestamp", e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DateTime::<Utc>::deserialize(deserializer).map(Self::from_datetime)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamp_now_has_millisecond_precision() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn timestamp_ordering_works() {
        let ts1 = Timestamp::from_unix_secs(1_000);
        let ts2 = ts1.plus_secs(1);

        assert!(ts1 < ts2);
        assert!(ts1.is_before(&ts2));
        assert!(ts2.is_after(&ts1));
    }

    #[test]
    fn timestamp_from_unix_secs_works() {
        // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_unix_secs(1705276800);
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().month(), 1);
        assert_eq!(ts.as_datetime().day(), 15);
        assert_eq!(ts.as_unix_secs(), 1705276800);
    }

    #[test]
    fn timestamp_plus_hours_adds_correctly() {
        let ts = Timestamp::from_unix_secs(0).plus_hours(24);
        assert_eq!(ts.as_unix_secs(), 86_400);
    }

    #[test]
    fn parse_accepts_rfc3339() {
        let ts = Timestamp::parse("2024-01-15T10:30:00.250Z").unwrap();
        assert_eq!(ts.as_datetime().hour(), 10);
        assert_eq!(ts.as_datetime().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn parse_accepts_store_layout() {
        let ts = Timestamp::parse("2024-01-15 10:30:00.250Z").unwrap();
        assert_eq!(ts, Timestamp::parse("2024-01-15T10:30:00.250Z").unwrap());
    }

    #[test]
    fn parse_accepts_store_layout_without_millis() {
        let ts = Timestamp::parse("2024-01-15 10:30:00Z").unwrap();
        assert_eq!(ts.as_datetime().minute(), 30);
    }

    #[test]
    fn parse_rejects_empty_and_garbage() {
        assert!(matches!(
            Timestamp::parse(""),
            Err(ValidationError::EmptyField { .. })
        ));
        assert!(matches!(
            Timestamp::parse("yesterday"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn store_format_parses_back_to_same_instant() {
        let ts = Timestamp::from_unix_millis(1_705_314_600_123);
        assert_eq!(ts.to_store_format(), "2024-01-15 10:30:00.123Z");
        assert_eq!(Timestamp::parse(&ts.to_store_format()).unwrap(), ts);
    }

    #[test]
    fn rfc3339_output_uses_z_suffix() {
        let ts = Timestamp::from_unix_secs(1705276800);
        assert_eq!(ts.to_rfc3339(), "2024-01-15T00:00:00.000Z");
    }

    #[test]
    fn sub_millisecond_digits_are_dropped() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);

        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.as_datetime().nanosecond(), 123_000_000);
        assert_eq!(ts, Timestamp::from_unix_millis(1_705_314_600_123));
    }

    #[test]
    fn microsecond_input_matches_its_store_form() {
        let parsed = Timestamp::parse("2024-01-15T10:30:00.123456Z").unwrap();
        let deserialized: Timestamp =
            serde_json::from_str("\"2024-01-15T10:30:00.123456Z\"").unwrap();

        let stored = Timestamp::parse(&parsed.to_store_format()).unwrap();
        assert_eq!(parsed, stored);
        assert_eq!(deserialized, stored);
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let ts = Timestamp::from_unix_secs(1705276800);
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
    }
}
