use crate::error::EventError;
use crate::utils::time::parse_event_time;
use chrono::{DateTime, Duration, Utc};

/// Calendar event as delivered by the provider and stored in the cache.
///
/// `start` and `end` are kept as the provider sent them; they may carry an
/// offset, be naive, or be date-only for all-day events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RawEvent {
    pub summary: String,
    pub start: String,
    pub end: String,
}

impl RawEvent {
    pub fn new(summary: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// The summary with surrounding whitespace removed
    pub fn title(&self) -> &str {
        self.summary.trim()
    }
}

/// A raw event with its boundaries normalized to UTC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub event: RawEvent,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduledEvent {
    /// Normalize both boundaries of `event`
    pub fn from_raw(event: &RawEvent) -> Result<Self, EventError> {
        let start = normalize(&event.start, "start")?;
        let end = normalize(&event.end, "end")?;

        Ok(Self {
            event: event.clone(),
            start,
            end,
        })
    }

    pub fn title(&self) -> &str {
        self.event.title()
    }

    /// `start <= now < end`
    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

fn normalize(value: &str, field: &'static str) -> Result<DateTime<Utc>, EventError> {
    if value.trim().is_empty() {
        return Err(EventError::MissingTime(field));
    }
    parse_event_time(value).ok_or_else(|| EventError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}

/// An event that was dropped because it could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    /// Position in the input list
    pub index: usize,
    pub summary: String,
    pub error: EventError,
}

/// Whether a displayed event is happening right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Current { remaining_minutes: i64 },
    Upcoming,
}

/// One event row of the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: EventStatus,
}

impl DisplayEntry {
    pub fn is_current(&self) -> bool {
        matches!(self.status, EventStatus::Current { .. })
    }

    pub fn remaining_minutes(&self) -> Option<i64> {
        match self.status {
            EventStatus::Current { remaining_minutes } => Some(remaining_minutes),
            EventStatus::Upcoming => None,
        }
    }
}

/// Idle time between two consecutive visible events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapEntry {
    /// Always at least 1
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    Gap(GapEntry),
    Event(DisplayEntry),
}

/// Result of [`compute_timeline`](super::compute_timeline)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timeline {
    /// Rows in display order, gaps placed before the event they precede
    pub entries: Vec<TimelineEntry>,
    /// The events behind the event rows, in the same order
    pub visible: Vec<ScheduledEvent>,
    /// Events that were dropped because their times could not be read
    pub skipped: Vec<SkippedEvent>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

/// What the countdown is counting towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTarget {
    /// The first visible event, which hasn't started yet (also used for its grace window)
    FirstUpcoming,
    /// The next event that starts after the one in progress
    GapToNext,
    /// Nothing left to count down to
    None,
}

/// Display urgency of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// More than ten minutes away
    Far,
    /// Between one and ten minutes away
    Near,
    /// A minute or less away
    Imminent,
    /// The first event just started
    Active,
    /// No countdown
    None,
}

impl Bucket {
    /// Classify a positive remaining duration
    pub fn for_remaining(remaining: Duration) -> Self {
        if remaining > Duration::seconds(600) {
            Bucket::Far
        } else if remaining > Duration::seconds(60) {
            Bucket::Near
        } else if remaining > Duration::zero() {
            Bucket::Imminent
        } else {
            Bucket::None
        }
    }

    /// Color convention the presenter maps onto
    pub fn tone(&self) -> &'static str {
        match self {
            Bucket::Far => "safe",
            Bucket::Near => "warning",
            Bucket::Imminent => "critical",
            Bucket::Active => "active",
            Bucket::None => "idle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownState {
    pub target: CountdownTarget,
    /// `HH:MM`, `HH:MM:SS` or empty
    pub text: String,
    pub bucket: Bucket,
    /// Time left until the target starts, when counting
    pub remaining: Option<Duration>,
    /// Title of the event the countdown refers to
    pub event_title: Option<String>,
}

impl CountdownState {
    pub fn none() -> Self {
        Self {
            target: CountdownTarget::None,
            text: String::new(),
            bucket: Bucket::None,
            remaining: None,
            event_title: None,
        }
    }
}
