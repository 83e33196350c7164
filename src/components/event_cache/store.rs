use super::models::CacheEntry;
use super::CacheStore;
use crate::components::schedule::RawEvent;
use crate::error::{cache_error, SoonlyResult};
use crate::utils::time::parse_event_time;
use chrono::Local;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// On-disk layout of the cache document
#[derive(serde::Serialize, serde::Deserialize)]
struct CacheDocument {
    timestamp: String,
    events: Vec<Value>,
}

/// Cache kept in a JSON file, preceded by a `# Cached at ...` comment line
#[derive(Debug, Clone)]
pub struct JsonFileCacheStore {
    path: PathBuf,
}

impl JsonFileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "events_cache.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Decode a cache document, tolerating a leading comment line
pub fn parse_cache_document(content: &str) -> SoonlyResult<CacheEntry> {
    let body = match content.split_once('\n') {
        Some((first, rest)) if first.trim_start().starts_with('#') => rest,
        None if content.trim_start().starts_with('#') => "",
        _ => content,
    };

    let document: CacheDocument = serde_json::from_str(body)
        .map_err(|e| cache_error(&format!("Failed to parse cache document: {}", e)))?;

    let cached_at = parse_event_time(&document.timestamp).ok_or_else(|| {
        cache_error(&format!("Invalid cache timestamp: {}", document.timestamp))
    })?;

    let mut events = Vec::with_capacity(document.events.len());
    for (index, value) in document.events.into_iter().enumerate() {
        match serde_json::from_value::<RawEvent>(value) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Dropping cached event #{}: {}", index, e),
        }
    }

    Ok(CacheEntry { events, cached_at })
}

/// Encode a cache document with its comment line
pub fn render_cache_document(entry: &CacheEntry) -> SoonlyResult<String> {
    let events = entry
        .events
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let document = CacheDocument {
        timestamp: entry.cached_at.to_rfc3339(),
        events,
    };

    Ok(format!(
        "# Cached at {}\n{}",
        Local::now().to_rfc3339(),
        serde_json::to_string_pretty(&document)?
    ))
}

impl CacheStore for JsonFileCacheStore {
    fn read(&self) -> SoonlyResult<Option<CacheEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        parse_cache_document(&content).map(Some)
    }

    fn write(&self, entry: &CacheEntry) -> SoonlyResult<()> {
        let document = render_cache_document(entry)?;

        // Write next to the target and rename so readers never see half a file
        let temp = self.temp_path();
        fs::write(&temp, document)?;
        fs::rename(&temp, &self.path)?;

        debug!("Cached {} events in {}", entry.events.len(), self.path.display());
        Ok(())
    }

    fn remove(&self) -> SoonlyResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Cache that lives only as long as the process
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entry: Mutex<Option<CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SoonlyResult<std::sync::MutexGuard<'_, Option<CacheEntry>>> {
        self.entry
            .lock()
            .map_err(|e| cache_error(&format!("Cache lock poisoned: {}", e)))
    }
}

impl CacheStore for InMemoryCacheStore {
    fn read(&self) -> SoonlyResult<Option<CacheEntry>> {
        Ok(self.lock()?.clone())
    }

    fn write(&self, entry: &CacheEntry) -> SoonlyResult<()> {
        *self.lock()? = Some(entry.clone());
        Ok(())
    }

    fn remove(&self) -> SoonlyResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry() -> CacheEntry {
        CacheEntry::new(
            vec![RawEvent::new(
                "Standup",
                "2024-05-01T10:00:00+03:00",
                "2024-05-01T10:15:00+03:00",
            )],
            Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_document_starts_with_comment_line() {
        let document = render_cache_document(&entry()).unwrap();
        assert!(document.starts_with("# Cached at "));
        assert_eq!(parse_cache_document(&document).unwrap(), entry());
    }

    #[test]
    fn test_parse_without_comment_line() {
        let content = r#"{"timestamp": "2024-05-01T07:00:00+00:00", "events": []}"#;
        let parsed = parse_cache_document(content).unwrap();
        assert!(parsed.events.is_empty());
        assert_eq!(parsed.cached_at, Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let content = "# Cached at whenever\n{\"timestamp\": \"2024-05-01T07:00:00\", \"events\": []}";
        let parsed = parse_cache_document(content).unwrap();
        assert_eq!(parsed.cached_at, Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_events_are_dropped_individually() {
        let content = r#"{
            "timestamp": "2024-05-01T07:00:00Z",
            "events": [
                {"summary": "Kept", "start": "2024-05-01T10:00:00Z", "end": "2024-05-01T11:00:00Z"},
                {"summary": "No end", "start": "2024-05-01T10:00:00Z"},
                42
            ]
        }"#;
        let parsed = parse_cache_document(content).unwrap();
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].summary, "Kept");
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let content = r#"{"timestamp": "yesterday", "events": []}"#;
        assert!(parse_cache_document(content).is_err());
        assert!(parse_cache_document("# only a comment").is_err());
        assert!(parse_cache_document("").is_err());
    }

    #[test]
    fn test_file_store_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCacheStore::new(dir.path().join("events_cache.json"));

        assert_eq!(store.read().unwrap(), None);
        store.write(&entry()).unwrap();
        assert_eq!(store.read().unwrap(), Some(entry()));
        assert!(!store.temp_path().exists());

        store.remove().unwrap();
        assert_eq!(store.read().unwrap(), None);
        // Removing twice is fine
        store.remove().unwrap();
    }
}
