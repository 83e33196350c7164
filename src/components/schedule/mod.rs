//! Pure schedule computations: the visible timeline and the countdown.
//!
//! Nothing here does I/O or reads global state; both entry points take the
//! raw events and the current instant as arguments and return fresh values.

mod countdown;
pub mod models;
mod timeline;

pub use countdown::{compute_countdown, format_countdown, grace_window, STARTED_TEXT};
pub use models::{
    Bucket, CountdownState, CountdownTarget, DisplayEntry, EventStatus, GapEntry, RawEvent,
    ScheduledEvent, SkippedEvent, Timeline, TimelineEntry,
};
pub use timeline::{compute_timeline, MAX_VISIBLE_EVENTS};

use std::collections::HashSet;

/// Build the excluded-title set from configured titles
pub fn excluded_title_set<I, S>(titles: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    titles
        .into_iter()
        .map(|title| title.as_ref().to_string())
        .collect()
}
