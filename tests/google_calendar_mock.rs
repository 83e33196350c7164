use async_trait::async_trait;
use chrono::{Duration, Utc};
use soonly::components::event_cache::{EventCache, InMemoryCacheStore};
use soonly::components::google_calendar::CalendarListEntry;
use soonly::components::overlay::{read_commands, FeedSource, InputCommand, OverlayHandle};
use soonly::components::schedule::RawEvent;
use soonly::components::CalendarProvider;
use soonly::config::{ConfigStore, JsonConfigStore};
use soonly::error::{google_calendar_error, SoonlyResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Mock calendar provider that counts how often it is asked for events
#[derive(Debug, Default)]
pub struct MockCalendarProvider {
    events: Mutex<Vec<RawEvent>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockCalendarProvider {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_events(&self, events: Vec<RawEvent>) {
        *self.events.lock().unwrap() = events;
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    async fn upcoming_events(&self, count: usize) -> SoonlyResult<Vec<RawEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(google_calendar_error("calendar unavailable"));
        }
        let events = self.events.lock().unwrap();
        Ok(events.iter().take(count).cloned().collect())
    }

    async fn calendars(&self) -> SoonlyResult<Vec<CalendarListEntry>> {
        Ok(vec![CalendarListEntry {
            id: "primary".to_string(),
            summary: Some("Me".to_string()),
            primary: true,
        }])
    }
}

fn upcoming(summary: &str, minutes_from_now: i64) -> RawEvent {
    let start = Utc::now() + Duration::minutes(minutes_from_now);
    let end = start + Duration::minutes(30);
    RawEvent::new(summary, start.to_rfc3339(), end.to_rfc3339())
}

struct Fixture {
    provider: Arc<MockCalendarProvider>,
    cache: EventCache,
    settings: Arc<JsonConfigStore>,
    overlay: OverlayHandle,
    _dir: tempfile::TempDir,
}

fn fixture(events: Vec<RawEvent>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockCalendarProvider::new(events));
    let cache = EventCache::new(Arc::new(InMemoryCacheStore::new()));
    let settings = Arc::new(JsonConfigStore::new(dir.path().join("config.json")));

    let overlay = OverlayHandle::new(
        provider.clone(),
        cache.clone(),
        settings.clone(),
        10,
    );

    Fixture {
        provider,
        cache,
        settings,
        overlay,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_first_refresh_fetches_and_caches() {
    let f = fixture(vec![upcoming("Standup", 30), upcoming("Review", 90)]);

    let outcome = f.overlay.refresh().await.unwrap();
    assert_eq!(outcome.source, FeedSource::Provider);
    assert_eq!(outcome.event_count, 2);
    assert_eq!(f.provider.calls(), 1);

    let feed = f.overlay.current_feed();
    assert_eq!(feed.events.len(), 2);
    assert!(f.cache.load(Utc::now()).is_some());
}

#[tokio::test]
async fn test_fresh_cache_is_served_without_fetching() {
    let f = fixture(vec![upcoming("Standup", 30)]);

    f.overlay.refresh().await.unwrap();
    let outcome = f.overlay.refresh().await.unwrap();

    assert_eq!(outcome.source, FeedSource::Cache);
    assert_eq!(f.provider.calls(), 1);
}

#[tokio::test]
async fn test_stale_cache_is_refetched() {
    let f = fixture(vec![upcoming("Standup", 30)]);
    f.cache
        .store(&[upcoming("Old", 10)], Utc::now() - Duration::minutes(6))
        .unwrap();

    let outcome = f.overlay.refresh().await.unwrap();
    assert_eq!(outcome.source, FeedSource::Provider);
    assert_eq!(f.overlay.current_feed().events[0].summary, "Standup");
}

#[tokio::test]
async fn test_manual_refresh_bypasses_cache() {
    let f = fixture(vec![upcoming("Standup", 30)]);
    f.overlay.refresh().await.unwrap();

    f.provider.set_events(vec![upcoming("Moved", 45)]);
    let outcome = f.overlay.manual_refresh().await.unwrap();

    assert_eq!(outcome.source, FeedSource::Provider);
    assert_eq!(f.provider.calls(), 2);
    assert_eq!(f.overlay.current_feed().events[0].summary, "Moved");
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_feed() {
    let f = fixture(vec![upcoming("Standup", 30)]);
    f.overlay.refresh().await.unwrap();

    f.provider.set_failing(true);
    assert!(f.overlay.manual_refresh().await.is_err());

    let feed = f.overlay.current_feed();
    assert_eq!(feed.events.len(), 1);
    assert_eq!(feed.source, FeedSource::Provider);
}

#[tokio::test]
async fn test_queued_refreshes_are_coalesced() {
    let f = fixture(vec![upcoming("Standup", 30)]);

    let (a, b, c) = tokio::join!(
        f.overlay.refresh(),
        f.overlay.manual_refresh(),
        f.overlay.refresh()
    );

    assert_eq!(a.unwrap().source, FeedSource::Provider);
    assert_eq!(b.unwrap().source, FeedSource::Provider);
    assert_eq!(c.unwrap().source, FeedSource::Provider);
    assert_eq!(f.provider.calls(), 1);
}

#[tokio::test]
async fn test_excluded_titles_are_reloaded_on_refresh() {
    let f = fixture(vec![upcoming("Standup", 30), upcoming("Lunch", 90)]);
    f.settings
        .set_excluded_titles(vec!["Lunch".to_string()])
        .unwrap();

    f.overlay.refresh().await.unwrap();
    let feed = f.overlay.current_feed();
    assert!(feed.excluded_titles.contains("Lunch"));

    let view = soonly::components::overlay::OverlayView::compute(&feed, Utc::now());
    assert_eq!(view.timeline.visible.len(), 1);
    assert_eq!(view.timeline.visible[0].title(), "Standup");
}

#[tokio::test]
async fn test_feed_subscribers_see_refreshes() {
    let f = fixture(vec![upcoming("Standup", 30)]);
    let mut feed_rx = f.overlay.subscribe();
    assert_eq!(feed_rx.borrow().source, FeedSource::Empty);

    f.overlay.refresh().await.unwrap();
    feed_rx.changed().await.unwrap();
    assert_eq!(feed_rx.borrow().events.len(), 1);
}

#[tokio::test]
async fn test_key_commands_refresh_then_quit() {
    let f = fixture(vec![upcoming("Standup", 30)]);
    f.overlay.refresh().await.unwrap();

    let (command_tx, command_rx) = mpsc::channel(8);
    let (quit_tx, quit_rx) = oneshot::channel();
    command_tx.send(InputCommand::Refresh).await.unwrap();
    command_tx.send(InputCommand::Quit).await.unwrap();

    read_commands(command_rx, f.overlay.clone(), quit_tx).await;

    // The key refresh skipped the fresh cache
    assert_eq!(f.provider.calls(), 2);
    assert!(quit_rx.await.is_ok());
}

#[tokio::test]
async fn test_closed_key_reader_does_not_quit() {
    let f = fixture(Vec::new());
    let (command_tx, command_rx) = mpsc::channel::<InputCommand>(8);
    let (quit_tx, quit_rx) = oneshot::channel();
    drop(command_tx);

    read_commands(command_rx, f.overlay.clone(), quit_tx).await;
    assert!(quit_rx.await.is_err());
}

#[tokio::test]
async fn test_mock_lists_calendars() {
    let provider = MockCalendarProvider::new(Vec::new());
    let calendars = provider.calendars().await.unwrap();
    assert_eq!(calendars.len(), 1);
    assert!(calendars[0].primary);
}
