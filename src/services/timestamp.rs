//! Request timestamp freshness check.

use crate::{models::AuthError, services::clock::Clock};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::sync::Arc;

/// Wire format of the `Timestamp` header, e.g. `2024-01-01 12:00:00Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

/// Render an instant in the `Timestamp` header format
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `Timestamp` header value.
///
/// Only the exact zero-padded form is accepted; chrono alone would also take
/// unpadded fields and a missing or doubled space.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let parsed = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()?
        .and_utc();
    (format_timestamp(parsed) == value).then_some(parsed)
}

/// Checks that a caller-supplied timestamp lies within `now ± tolerance`.
///
/// Both bounds are inclusive.
#[derive(Clone)]
pub struct TimestampValidator {
    clock: Arc<dyn Clock>,
    tolerance: Duration,
}

impl TimestampValidator {
    pub fn new(clock: Arc<dyn Clock>, tolerance: std::time::Duration) -> Self {
        let tolerance = Duration::from_std(tolerance).unwrap_or_else(|_| {
            tracing::warn!(
                tolerance_seconds = tolerance.as_secs(),
                "timestamp tolerance out of range, clamping to the maximum"
            );
            Duration::MAX
        });
        Self { clock, tolerance }
    }

    /// `true` when the timestamp parses and is fresh
    pub fn validate(&self, timestamp: &str) -> bool {
        self.check(timestamp).is_ok()
    }

    /// Same as [`validate`](Self::validate) but keeps the failure kind for logs.
    pub fn check(&self, timestamp: &str) -> Result<DateTime<Utc>, AuthError> {
        let parsed = parse_timestamp(timestamp).ok_or(AuthError::MissingOrMalformedTimestamp)?;
        let now = self.clock.now();

        let earliest = now
            .checked_sub_signed(self.tolerance)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let latest = now
            .checked_add_signed(self.tolerance)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if parsed < earliest {
            tracing::debug!(%parsed, %now, "timestamp older than the freshness window");
            return Err(AuthError::TimestampOutOfWindow);
        }
        if parsed > latest {
            tracing::debug!(%parsed, %now, "timestamp ahead of the freshness window");
            return Err(AuthError::TimestampOutOfWindow);
        }

        Ok(parsed)
    }
}
