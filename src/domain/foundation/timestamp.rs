//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns how long ago this timestamp was, clamped at zero.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.0).max(Duration::zero())
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

    #[test]
    fn now_falls_between_surrounding_clock_reads() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn age_of_past_timestamp_is_positive() {
        let ts = Timestamp::from_datetime(Utc::now() - Duration::seconds(30));
        assert!(ts.age() >= Duration::seconds(30));
    }

    #[test]
    fn age_of_future_timestamp_is_zero() {
        let ts = Timestamp::from_datetime(Utc::now() + Duration::seconds(30));
        assert_eq!(ts.age(), Duration::zero());
    }
}
