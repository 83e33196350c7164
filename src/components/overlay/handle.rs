use super::actor::{OverlayActor, OverlayActorHandle};
use super::models::{EventFeed, RefreshOutcome};
use crate::components::event_cache::EventCache;
use crate::components::CalendarProvider;
use crate::config::ConfigStore;
use crate::error::SoonlyResult;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle for interacting with the overlay actor
#[derive(Clone)]
pub struct OverlayHandle {
    actor_handle: OverlayActorHandle,
    feed_rx: watch::Receiver<Arc<EventFeed>>,
    _actor_task: Arc<JoinHandle<()>>,
}

impl OverlayHandle {
    /// Create a new OverlayHandle and spawn the actor
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        cache: EventCache,
        settings: Arc<dyn ConfigStore>,
        event_count: usize,
    ) -> Self {
        let (mut actor, handle, feed_rx) = OverlayActor::new(provider, cache, settings, event_count);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            feed_rx,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Periodic refresh: serve from the cache while it is fresh
    pub async fn refresh(&self) -> SoonlyResult<RefreshOutcome> {
        self.actor_handle.refresh(false).await
    }

    /// User-requested refresh: drop the cache and fetch
    pub async fn manual_refresh(&self) -> SoonlyResult<RefreshOutcome> {
        self.actor_handle.refresh(true).await
    }

    /// The feed currently on display
    pub fn current_feed(&self) -> Arc<EventFeed> {
        Arc::clone(&self.feed_rx.borrow())
    }

    /// Receiver that is notified whenever the feed is replaced
    pub fn subscribe(&self) -> watch::Receiver<Arc<EventFeed>> {
        self.feed_rx.clone()
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SoonlyResult<()> {
        self.actor_handle.shutdown().await
    }
}
