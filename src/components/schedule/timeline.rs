use super::models::{
    DisplayEntry, EventStatus, GapEntry, RawEvent, ScheduledEvent, SkippedEvent, Timeline,
    TimelineEntry,
};
use crate::utils::time::whole_minutes;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Most events the overlay shows at once
pub const MAX_VISIBLE_EVENTS: usize = 10;

/// Derive the visible timeline from the raw event list.
///
/// `events` is expected to be sorted by start time and deduplicated. Excluded
/// and already-ended events are dropped and don't take part in gap tracking;
/// events with unreadable times are reported in [`Timeline::skipped`].
pub fn compute_timeline(
    events: &[RawEvent],
    excluded_titles: &HashSet<String>,
    now: DateTime<Utc>,
) -> Timeline {
    let mut timeline = Timeline::default();

    for (index, event) in events.iter().enumerate() {
        if timeline.visible.len() >= MAX_VISIBLE_EVENTS {
            break;
        }

        if excluded_titles.contains(event.title()) {
            continue;
        }

        let scheduled = match ScheduledEvent::from_raw(event) {
            Ok(scheduled) => scheduled,
            Err(error) => {
                timeline.skipped.push(SkippedEvent {
                    index,
                    summary: event.summary.clone(),
                    error,
                });
                continue;
            }
        };

        if scheduled.has_ended_at(now) {
            continue;
        }

        if let Some(previous) = timeline.visible.last() {
            // Back-to-back and overlapping events get no gap row
            let gap = whole_minutes(scheduled.start - previous.end);
            if gap > 0 {
                timeline.entries.push(TimelineEntry::Gap(GapEntry { minutes: gap }));
            }
        }

        let status = if scheduled.is_current_at(now) {
            EventStatus::Current {
                remaining_minutes: whole_minutes(scheduled.end - now).max(0),
            }
        } else {
            EventStatus::Upcoming
        };

        timeline.entries.push(TimelineEntry::Event(DisplayEntry {
            title: scheduled.title().to_string(),
            start: scheduled.start,
            end: scheduled.end,
            duration_minutes: whole_minutes(scheduled.duration()),
            status,
        }));
        timeline.visible.push(scheduled);
    }

    timeline
}
