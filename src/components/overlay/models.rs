use crate::components::event_cache::{age_minutes, cache_expiry};
use crate::components::schedule::{
    compute_countdown, compute_timeline, CountdownState, RawEvent, Timeline,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Where the events currently on screen came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    /// Nothing fetched yet
    Empty,
    Cache,
    Provider,
}

/// The raw event list the display recomputes from on every tick.
///
/// Replaced wholesale on refresh; never modified in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFeed {
    pub events: Vec<RawEvent>,
    /// When the events were captured from the provider
    pub cached_at: Option<DateTime<Utc>>,
    pub source: FeedSource,
    pub excluded_titles: HashSet<String>,
}

impl EventFeed {
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            cached_at: None,
            source: FeedSource::Empty,
            excluded_titles: HashSet::new(),
        }
    }
}

/// What a refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub source: FeedSource,
    pub event_count: usize,
}

/// Everything the presenter needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    pub timeline: Timeline,
    pub countdown: CountdownState,
    /// Minutes since the events were captured
    pub cache_age_minutes: Option<i64>,
    /// The shown events are older than the cache expiry
    pub cache_stale: bool,
}

impl OverlayView {
    pub fn compute(feed: &EventFeed, now: DateTime<Utc>) -> Self {
        let timeline = compute_timeline(&feed.events, &feed.excluded_titles, now);
        let countdown = compute_countdown(&timeline.visible, now);
        let cache_age_minutes = feed.cached_at.map(|at| age_minutes(at, now));
        let cache_stale = cache_age_minutes
            .map(|age| age >= cache_expiry().num_minutes())
            .unwrap_or(false);

        Self {
            timeline,
            countdown,
            cache_age_minutes,
            cache_stale,
        }
    }
}
