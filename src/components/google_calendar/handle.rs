use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle};
use super::models::CalendarListEntry;
use crate::components::schedule::RawEvent;
use crate::components::CalendarProvider;
use crate::config::{Config, ConfigStore};
use crate::error::SoonlyResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(config: Arc<RwLock<Config>>, settings: Arc<dyn ConfigStore>) -> Self {
        let (mut actor, handle) = GoogleCalendarActor::new(config, settings);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Get upcoming events from the selected calendars
    pub async fn get_upcoming_events(&self, count: usize) -> SoonlyResult<Vec<RawEvent>> {
        self.actor_handle.get_upcoming_events(count).await
    }

    /// List calendars the account can choose from
    pub async fn list_calendars(&self) -> SoonlyResult<Vec<CalendarListEntry>> {
        self.actor_handle.list_calendars().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SoonlyResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarHandle {
    async fn upcoming_events(&self, count: usize) -> SoonlyResult<Vec<RawEvent>> {
        self.get_upcoming_events(count).await
    }

    async fn calendars(&self) -> SoonlyResult<Vec<CalendarListEntry>> {
        self.list_calendars().await
    }
}
