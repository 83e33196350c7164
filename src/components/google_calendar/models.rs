use serde::{Deserialize, Serialize};

/// Start or end of an event as the Calendar API returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<String>,
    /// Set instead of `date_time` for all-day events
    pub date: Option<String>,
}

impl EventTime {
    pub fn value(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// Calendar event resource, reduced to what the overlay uses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
}

/// Calendar list resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarListEntry {
    pub id: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

impl CalendarListEntry {
    pub fn display_name(&self) -> &str {
        self.summary.as_deref().unwrap_or("(unnamed)")
    }
}
