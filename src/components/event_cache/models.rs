use crate::components::schedule::RawEvent;
use chrono::{DateTime, Utc};

/// A fetched event list together with the instant it was captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub events: Vec<RawEvent>,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(events: Vec<RawEvent>, cached_at: DateTime<Utc>) -> Self {
        Self { events, cached_at }
    }
}
