use super::models::CalendarEvent;
use crate::components::schedule::RawEvent;
use crate::utils::time::parse_event_time;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Turn an API event into a raw event, or `None` if it should not be shown.
///
/// Drops events without a summary, events whose summary is an excluded
/// keyword, events with unreadable times and events that are already over.
pub fn to_raw_event(
    event: &CalendarEvent,
    exclude_keywords: &HashSet<String>,
    now: DateTime<Utc>,
) -> Option<RawEvent> {
    let summary = event.summary.as_deref().unwrap_or("");
    if summary.trim().is_empty() || exclude_keywords.contains(summary) {
        return None;
    }

    let start = event.start.as_ref().and_then(|t| t.value());
    let end = event.end.as_ref().and_then(|t| t.value());
    let (Some(start), Some(end)) = (start, end) else {
        warn!("Skipping event '{}' without start or end", summary);
        return None;
    };

    if parse_event_time(start).is_none() {
        warn!("Skipping event '{}' with unreadable start '{}'", summary, start);
        return None;
    }

    match parse_event_time(end) {
        Some(end_at) if end_at > now => Some(RawEvent::new(summary, start, end)),
        Some(_) => {
            debug!("Skipping finished event '{}'", summary);
            None
        }
        None => {
            warn!("Skipping event '{}' with unreadable end '{}'", summary, end);
            None
        }
    }
}

/// Merge per-calendar results into one list: deduplicated, sorted by start
/// and cut to `count`
pub fn merge_events(batches: Vec<Vec<RawEvent>>, count: usize) -> Vec<RawEvent> {
    let mut seen = HashSet::new();
    let mut merged: Vec<(DateTime<Utc>, RawEvent)> = batches
        .into_iter()
        .flatten()
        .filter(|event| seen.insert(event.clone()))
        .filter_map(|event| parse_event_time(&event.start).map(|start| (start, event)))
        .collect();

    merged.sort_by_key(|(start, _)| *start);
    merged.truncate(count);
    merged.into_iter().map(|(_, event)| event).collect()
}
