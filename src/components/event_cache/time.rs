use chrono::{DateTime, Duration, Utc};

/// How long a cached event list may be served without refetching
pub fn cache_expiry() -> Duration {
    Duration::minutes(5)
}

/// `now - cached_at <= 5 minutes`
///
/// A capture time in the future (clock skew) counts as fresh.
pub fn is_fresh(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - cached_at <= cache_expiry()
}

/// Whole minutes since capture, never negative
pub fn age_minutes(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - cached_at).num_minutes().max(0)
}
