use super::models::{EventFeed, FeedSource, RefreshOutcome};
use crate::components::event_cache::EventCache;
use crate::components::schedule::{compute_timeline, excluded_title_set, RawEvent};
use crate::components::CalendarProvider;
use crate::config::ConfigStore;
use crate::error::{component_error, SoonlyResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Keeps the event feed up to date.
///
/// All refreshes go through this actor, so only one fetch or cache write is
/// ever in flight.
pub struct OverlayActor {
    provider: Arc<dyn CalendarProvider>,
    cache: EventCache,
    settings: Arc<dyn ConfigStore>,
    event_count: usize,
    feed_tx: watch::Sender<Arc<EventFeed>>,
    command_rx: mpsc::Receiver<OverlayCommand>,
}

/// Commands that can be sent to the overlay actor
pub enum OverlayCommand {
    Refresh {
        force: bool,
        response_tx: mpsc::Sender<SoonlyResult<RefreshOutcome>>,
    },
    Shutdown,
}

/// Handle for communicating with the overlay actor
#[derive(Clone)]
pub struct OverlayActorHandle {
    command_tx: mpsc::Sender<OverlayCommand>,
}

impl OverlayActorHandle {
    /// Ask for a refresh, optionally bypassing the cache
    pub async fn refresh(&self, force: bool) -> SoonlyResult<RefreshOutcome> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(OverlayCommand::Refresh { force, response_tx })
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SoonlyResult<()> {
        let _ = self.command_tx.send(OverlayCommand::Shutdown).await;
        Ok(())
    }
}

impl OverlayActor {
    /// Create a new actor, its handle and the feed receiver
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        cache: EventCache,
        settings: Arc<dyn ConfigStore>,
        event_count: usize,
    ) -> (Self, OverlayActorHandle, watch::Receiver<Arc<EventFeed>>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (feed_tx, feed_rx) = watch::channel(Arc::new(EventFeed::empty()));

        let actor = Self {
            provider,
            cache,
            settings,
            event_count,
            feed_tx,
            command_rx,
        };

        (actor, OverlayActorHandle { command_tx }, feed_rx)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Overlay actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                OverlayCommand::Refresh { force, response_tx } => {
                    // Fold refresh requests that queued up meanwhile into this one
                    let mut force = force;
                    let mut waiters = vec![response_tx];
                    let mut shutdown = false;
                    while let Ok(next) = self.command_rx.try_recv() {
                        match next {
                            OverlayCommand::Refresh { force: f, response_tx } => {
                                force |= f;
                                waiters.push(response_tx);
                            }
                            OverlayCommand::Shutdown => {
                                shutdown = true;
                                break;
                            }
                        }
                    }

                    let result = self.refresh(force).await;
                    for response_tx in waiters {
                        let _ = response_tx.send(share(&result)).await;
                    }

                    if shutdown {
                        info!("Overlay actor shutting down");
                        break;
                    }
                }
                OverlayCommand::Shutdown => {
                    info!("Overlay actor shutting down");
                    break;
                }
            }
        }

        info!("Overlay actor shut down");
    }

    async fn refresh(&self, force: bool) -> SoonlyResult<RefreshOutcome> {
        let now = Utc::now();
        let excluded_titles = self.excluded_titles();

        if force {
            if let Some(age) = self.cache.age(now) {
                info!("Dropping {} min old event cache for a manual refresh", age);
            }
            if let Err(e) = self.cache.invalidate() {
                warn!("Failed to invalidate event cache: {}", e);
            }
        } else if let Some(entry) = self.cache.load(now) {
            return Ok(self.publish(entry.events, entry.cached_at, FeedSource::Cache, excluded_titles));
        }

        let events = self.provider.upcoming_events(self.event_count).await?;
        if let Err(e) = self.cache.store(&events, now) {
            warn!("Failed to cache events: {}", e);
        }

        Ok(self.publish(events, now, FeedSource::Provider, excluded_titles))
    }

    fn excluded_titles(&self) -> HashSet<String> {
        match self.settings.load() {
            Ok(settings) => excluded_title_set(&settings.excluded_titles),
            Err(e) => {
                warn!("Keeping previous excluded titles: {}", e);
                self.feed_tx.borrow().excluded_titles.clone()
            }
        }
    }

    fn publish(
        &self,
        events: Vec<RawEvent>,
        cached_at: DateTime<Utc>,
        source: FeedSource,
        excluded_titles: HashSet<String>,
    ) -> RefreshOutcome {
        let timeline = compute_timeline(&events, &excluded_titles, Utc::now());
        for skipped in &timeline.skipped {
            warn!(
                "Skipping event #{} '{}': {}",
                skipped.index, skipped.summary, skipped.error
            );
        }

        let outcome = RefreshOutcome {
            source,
            event_count: events.len(),
        };
        info!("Loaded {} events from {:?}", outcome.event_count, source);

        self.feed_tx.send_replace(Arc::new(EventFeed {
            events,
            cached_at: Some(cached_at),
            source,
            excluded_titles,
        }));

        outcome
    }
}

/// Copy a refresh result for another waiter
fn share(result: &SoonlyResult<RefreshOutcome>) -> SoonlyResult<RefreshOutcome> {
    match result {
        Ok(outcome) => Ok(*outcome),
        Err(e) => Err(component_error(&format!("Refresh failed: {}", e))),
    }
}
