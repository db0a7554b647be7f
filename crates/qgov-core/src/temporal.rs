//! # Temporal Types: UTC Timestamps and Clocks
//!
//! Defines [`Timestamp`], a UTC-only timestamp truncated to seconds
//! precision, and the [`Clock`] trait through which governance operations
//! read the current time.
//!
//! ## Invariants
//!
//! - Every timestamp is UTC with no sub-second component. Identity expiry
//!   and proposal deadlines are compared at second granularity, so two
//!   reads within the same second agree.
//! - Operations read the clock exactly once per call and pass the value
//!   down. Nothing below the service layer calls [`Clock::now`] itself.

use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::QgovError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time, truncated.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`]: from an RFC 3339 string, rejecting non-UTC offsets.
/// - [`Timestamp::from_epoch_secs()`]: from Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// Only the `Z` suffix is accepted. Explicit offsets, even `+00:00`,
    /// are rejected so that configuration files carry one spelling per
    /// instant.
    ///
    /// # Errors
    ///
    /// Returns [`QgovError::InvalidTimestamp`] if the string is not valid
    /// RFC 3339 or uses a non-Z offset.
    pub fn parse(s: &str) -> Result<Self, QgovError> {
        if !s.ends_with('Z') {
            return Err(QgovError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            QgovError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, QgovError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| QgovError::InvalidTimestamp(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Add a number of seconds, returning `None` on overflow.
    pub fn checked_add_secs(&self, secs: u64) -> Option<Self> {
        let secs = i64::try_from(secs).ok()?;
        let delta = Duration::try_seconds(secs)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Add a number of seconds, clamping to the latest representable instant.
    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        self.checked_add_secs(secs)
            .unwrap_or(Self(truncate_to_seconds(DateTime::<Utc>::MAX_UTC)))
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

// ─── Clocks ──────────────────────────────────────────────────────────

/// Source of wall-clock time for governance operations.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// Reads the host system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning yields a handle onto the same underlying instant, so a test can
/// keep one handle while the service owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to an absolute instant. Moving backwards is allowed.
    pub fn set(&self, to: Timestamp) {
        *self.current.lock() = to;
    }

    /// Move forward by `secs` seconds.
    pub fn advance_secs(&self, secs: u64) {
        let mut guard = self.current.lock();
        *guard = guard.saturating_add_secs(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:30:45Z");
    }

    // ---- parse() ----

    #[test]
    fn test_parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_offsets_rejected() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T17:00:00+05:00").is_err());
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    // ---- epoch ----

    #[test]
    fn test_epoch_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap(), ts);
    }

    // ---- arithmetic ----

    #[test]
    fn test_checked_add_secs() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let later = ts.checked_add_secs(86_400).unwrap();
        assert_eq!(later.to_iso8601(), "2026-01-16T12:00:00Z");
    }

    #[test]
    fn test_checked_add_secs_overflow() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert!(ts.checked_add_secs(u64::MAX).is_none());
        assert!(ts.saturating_add_secs(u64::MAX) > ts);
    }

    // ---- clocks ----

    #[test]
    fn test_manual_clock_advances() {
        let start = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();
        handle.advance_secs(90);
        assert_eq!(clock.now().epoch_secs(), start.epoch_secs() + 90);
        clock.set(start);
        assert_eq!(handle.now(), start);
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
