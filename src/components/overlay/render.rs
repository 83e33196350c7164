use super::models::OverlayView;
use crate::components::schedule::{DisplayEntry, EventStatus, TimelineEntry};
use chrono::{DateTime, TimeZone, Utc};
use rust_i18n::t;
use std::fmt::Display;

/// One piece of text and how it should be colored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// `safe`, `warning`, `critical`, `active`, `idle`, `current`,
    /// `upcoming`, `gap`, `muted` or `stale`
    pub tone: &'static str,
}

impl Line {
    fn new(text: impl Into<String>, tone: &'static str) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// A fully rendered overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub countdown: Line,
    pub rows: Vec<Line>,
    pub cache_age: Option<Line>,
}

/// Turn a view into text, showing clock times in `tz`
pub fn render<Tz>(view: &OverlayView, tz: &Tz) -> Frame
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let countdown = Line::new(view.countdown.text.clone(), view.countdown.bucket.tone());

    let mut rows: Vec<Line> = view
        .timeline
        .entries
        .iter()
        .map(|entry| match entry {
            TimelineEntry::Gap(gap) => Line::new(t!("gap_minutes", minutes = gap.minutes), "gap"),
            TimelineEntry::Event(event) => render_event(event, tz),
        })
        .collect();

    if rows.is_empty() {
        rows.push(Line::new(t!("no_events"), "muted"));
    }

    let cache_age = view.cache_age_minutes.map(|minutes| {
        let tone = if view.cache_stale { "stale" } else { "muted" };
        Line::new(t!("cache_age", minutes = minutes), tone)
    });

    Frame {
        countdown,
        rows,
        cache_age,
    }
}

fn render_event<Tz>(event: &DisplayEntry, tz: &Tz) -> Line
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let start = clock(event.start, tz);
    let end = clock(event.end, tz);

    match event.status {
        EventStatus::Current { remaining_minutes } => Line::new(
            t!(
                "event_current",
                title = event.title,
                start = start,
                end = end,
                remaining = remaining_minutes
            ),
            "current",
        ),
        EventStatus::Upcoming => Line::new(
            t!(
                "event_upcoming",
                title = event.title,
                start = start,
                end = end,
                duration = event.duration_minutes
            ),
            "upcoming",
        ),
    }
}

fn clock<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}
