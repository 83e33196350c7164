use crate::error::SoonlyResult;
use async_trait::async_trait;

pub mod event_cache;
pub mod google_calendar;
pub mod overlay;
pub mod schedule;

pub use google_calendar::GoogleCalendarHandle;
pub use overlay::OverlayHandle;

use google_calendar::CalendarListEntry;
use schedule::RawEvent;

/// Source of calendar events
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Upcoming events across the selected calendars, sorted by start,
    /// deduplicated and cut to `count`
    async fn upcoming_events(&self, count: usize) -> SoonlyResult<Vec<RawEvent>>;

    /// Calendars that can be selected
    async fn calendars(&self) -> SoonlyResult<Vec<CalendarListEntry>>;
}
