mod actor;
mod handle;
pub mod merge;
pub mod models;
pub mod token;

pub use actor::{API_BASE, DEFAULT_CALENDAR_ID};
pub use handle::GoogleCalendarHandle;
pub use models::{CalendarEvent, CalendarListEntry, EventTime};
pub use token::{StoredToken, TokenManager};
