//! Time-limited cache of the last fetched event list.

pub mod models;
mod store;
mod time;

pub use models::CacheEntry;
pub use store::{parse_cache_document, render_cache_document, InMemoryCacheStore, JsonFileCacheStore};
pub use time::{age_minutes, cache_expiry, is_fresh};

use crate::components::schedule::RawEvent;
use crate::error::SoonlyResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where cache entries are kept
pub trait CacheStore: Send + Sync {
    /// The stored entry, `None` when nothing is stored
    fn read(&self) -> SoonlyResult<Option<CacheEntry>>;

    /// Replace whatever is stored
    fn write(&self, entry: &CacheEntry) -> SoonlyResult<()>;

    /// Forget the stored entry
    fn remove(&self) -> SoonlyResult<()>;
}

/// Freshness policy on top of a [`CacheStore`]
#[derive(Clone)]
pub struct EventCache {
    store: Arc<dyn CacheStore>,
}

impl EventCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// The stored entry if it can be read, whatever its age
    pub fn entry(&self) -> Option<CacheEntry> {
        match self.store.read() {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable event cache: {}", e);
                None
            }
        }
    }

    /// Cached events, only while they are fresh
    pub fn load(&self, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = self.entry()?;

        if is_fresh(entry.cached_at, now) {
            debug!("Using {} cached events", entry.events.len());
            Some(entry)
        } else {
            debug!("Event cache from {} is stale", entry.cached_at);
            None
        }
    }

    /// Overwrite the cache with a freshly fetched list
    pub fn store(&self, events: &[RawEvent], now: DateTime<Utc>) -> SoonlyResult<()> {
        self.store.write(&CacheEntry::new(events.to_vec(), now))
    }

    /// Make the next [`load`](Self::load) miss
    pub fn invalidate(&self) -> SoonlyResult<()> {
        self.store.remove()
    }

    /// Minutes since the stored entry was captured
    pub fn age(&self, now: DateTime<Utc>) -> Option<i64> {
        self.entry().map(|entry| age_minutes(entry.cached_at, now))
    }
}
