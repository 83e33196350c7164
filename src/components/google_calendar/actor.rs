use super::merge::{merge_events, to_raw_event};
use super::models::{CalendarEvent, CalendarListEntry};
use super::token::TokenManager;
use crate::components::schedule::RawEvent;
use crate::config::{Config, ConfigStore};
use crate::error::{google_calendar_error, SoonlyResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use url::Url;

pub const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar used when none has been chosen yet
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    config: Arc<RwLock<Config>>,
    settings: Arc<dyn ConfigStore>,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    GetUpcomingEvents(usize, mpsc::Sender<SoonlyResult<Vec<RawEvent>>>),
    ListCalendars(mpsc::Sender<SoonlyResult<Vec<CalendarListEntry>>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// Get upcoming events across the selected calendars
    pub async fn get_upcoming_events(&self, count: usize) -> SoonlyResult<Vec<RawEvent>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::GetUpcomingEvents(count, response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// List the calendars the account can see
    pub async fn list_calendars(&self) -> SoonlyResult<Vec<CalendarListEntry>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::ListCalendars(response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SoonlyResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        settings: Arc<dyn ConfigStore>,
    ) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config: Arc::clone(&config),
            settings,
            token_manager: TokenManager::new(config),
            client: Client::new(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::GetUpcomingEvents(count, response_tx) => {
                    let result = self.get_upcoming_events(count).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::ListCalendars(response_tx) => {
                    let result = self.list_calendars().await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    async fn access_token(&self) -> SoonlyResult<String> {
        Ok(self.token_manager.get_token().await?.access_token)
    }

    /// Fetch every selected calendar and merge the results
    async fn get_upcoming_events(&self, count: usize) -> SoonlyResult<Vec<RawEvent>> {
        let settings = self.settings.load()?;
        let mut calendar_ids = settings.calendar_ids;
        if calendar_ids.is_empty() {
            warn!("No calendars selected, using the primary calendar");
            calendar_ids.push(DEFAULT_CALENDAR_ID.to_string());
        }

        let exclude_keywords: HashSet<String> = settings.exclude_keywords.into_iter().collect();
        let per_calendar_limit = self.config.read().await.per_calendar_limit;
        let access_token = self.access_token().await?;
        let now = Utc::now();

        let fetches = calendar_ids.iter().map(|calendar_id| {
            self.fetch_calendar(calendar_id, &access_token, per_calendar_limit, now)
        });
        let results = join_all(fetches).await;

        let mut batches = Vec::with_capacity(results.len());
        let mut last_error = None;
        for (calendar_id, result) in calendar_ids.iter().zip(results) {
            match result {
                Ok(items) => batches.push(
                    items
                        .iter()
                        .filter_map(|item| to_raw_event(item, &exclude_keywords, now))
                        .collect::<Vec<_>>(),
                ),
                Err(e) => {
                    error!("Error in calendar {}: {}", calendar_id, e);
                    last_error = Some(e);
                }
            }
        }

        // Keep the previous feed rather than blanking it when nothing could be fetched
        if batches.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let events = merge_events(batches, count);
        info!("Fetched {} upcoming events from {} calendars", events.len(), calendar_ids.len());
        Ok(events)
    }

    /// Fetch upcoming single events of one calendar
    async fn fetch_calendar(
        &self,
        calendar_id: &str,
        access_token: &str,
        max_results: usize,
        now: DateTime<Utc>,
    ) -> SoonlyResult<Vec<CalendarEvent>> {
        let mut url = Url::parse(API_BASE)?;
        url.path_segments_mut()
            .map_err(|_| google_calendar_error("Calendar API URL cannot have a path"))?
            .extend(&["calendars", calendar_id, "events"]);

        url.query_pairs_mut()
            .append_pair("timeMin", &now.to_rfc3339())
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        let body = self.get_json(url, access_token).await?;

        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();

        let mut events = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<CalendarEvent>(item) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping unreadable event in calendar {}: {}", calendar_id, e),
            }
        }

        Ok(events)
    }

    /// List calendars visible to the account
    async fn list_calendars(&self) -> SoonlyResult<Vec<CalendarListEntry>> {
        let access_token = self.access_token().await?;
        let url = Url::parse(&format!("{}/users/me/calendarList", API_BASE))?;
        let body = self.get_json(url, &access_token).await?;

        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .ok_or_else(|| google_calendar_error("No items in calendar list response"))?;

        Ok(items
            .iter()
            .filter_map(|item| serde_json::from_value::<CalendarListEntry>(item.clone()).ok())
            .collect())
    }

    async fn get_json(&self, url: Url, access_token: &str) -> SoonlyResult<Value> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Calendar API request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse response: {}", e)))
    }
}
