//! Calendar provider backed by a single JSON document.
//!
//! Every write reloads the document, applies the change and replaces the
//! file through a temporary sibling and a rename, so readers never observe
//! a half-written store. A missing file reads as an empty calendar.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use learnslot_core::EventId;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{
    BoxFuture, CalendarProvider, EventUpdate, FetchOptions, FetchResult, NewEvent,
};
use crate::store::EventStore;

const NAME: &str = "json";

/// A provider persisting events to a JSON file.
#[derive(Debug)]
pub struct JsonFileProvider {
    path: PathBuf,
    write_lock: Mutex<()>,
    changes: watch::Sender<u64>,
}

impl JsonFileProvider {
    /// Creates a provider for the document at `path`.
    ///
    /// The file is not touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ProviderResult<EventStore> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store missing, starting empty");
                return Ok(EventStore::default());
            }
            Err(e) => return Err(io_error(ProviderErrorCode::ProviderError, "read", &self.path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            ProviderError::provider(format!("malformed store {}: {e}", self.path.display()))
                .with_provider(NAME)
                .with_source(e)
        })
    }

    async fn save(&self, store: &EventStore, code: ProviderErrorCode) -> ProviderResult<()> {
        let json = serde_json::to_vec_pretty(store).map_err(|e| {
            ProviderError::new(code, "failed to serialize store")
                .with_provider(NAME)
                .with_source(e)
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(code, "create directory for", &self.path, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| io_error(code, "write", &tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary store");
            }
            return Err(io_error(code, "replace", &self.path, e));
        }

        self.changes.send_modify(|revision| *revision += 1);
        debug!(path = %self.path.display(), events = store.len(), "Saved store");
        Ok(())
    }

    /// Loads, mutates and saves the store under the write lock.
    async fn modify<T>(
        &self,
        code: ProviderErrorCode,
        change: impl FnOnce(&mut EventStore) -> ProviderResult<T> + Send,
    ) -> ProviderResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut store = self.load().await?;
        let out = change(&mut store).map_err(|e| e.with_provider(NAME))?;
        self.save(&store, code).await?;
        Ok(out)
    }
}

fn io_error(
    code: ProviderErrorCode,
    action: &str,
    path: &Path,
    err: std::io::Error,
) -> ProviderError {
    let code = if err.kind() == ErrorKind::PermissionDenied {
        ProviderErrorCode::AccessDenied
    } else {
        code
    };
    ProviderError::new(code, format!("failed to {action} {}: {err}", path.display()))
        .with_provider(NAME)
        .with_source(err)
}

impl CalendarProvider for JsonFileProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
        Box::pin(async move {
            let store = self.load().await?;
            let events = store.query(&options);
            debug!(count = events.len(), path = %self.path.display(), "Fetched events from file");
            Ok(FetchResult::with_events(events).with_revision(*self.changes.borrow()))
        })
    }

    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, ProviderResult<EventId>> {
        Box::pin(async move {
            let id = EventId::new(Uuid::new_v4().to_string());
            let created = id.clone();
            self.modify(ProviderErrorCode::CreateFailed, move |store| {
                store.insert(created, event)
            })
            .await?;
            debug!(%id, "Created event");
            Ok(id)
        })
    }

    fn update_event(&self, id: EventId, update: EventUpdate) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.modify(ProviderErrorCode::UpdateFailed, |store| store.update(&id, update))
                .await
        })
    }

    fn delete_event(&self, id: EventId) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.modify(ProviderErrorCode::DeleteFailed, |store| {
                store.remove(&id).map(|_| ())
            })
            .await
        })
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        Some(self.changes.subscribe())
    }

    fn suggested_poll_interval(&self) -> std::time::Duration {
        // Other processes may edit the file; the counter only sees our writes.
        std::time::Duration::from_secs(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use learnslot_core::{CalendarEvent, TimeInterval, TimeWindow};

    fn utc(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, min, 0).unwrap()
    }

    fn span(start: (u32, u32), end: (u32, u32)) -> TimeInterval {
        TimeInterval::new(utc(start.0, start.1), utc(end.0, end.1)).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path().join("calendar.json"));
        let result = provider.fetch_events(FetchOptions::new()).await.unwrap();
        assert!(result.events.is_empty());
    }

    #[tokio::test]
    async fn writes_survive_a_new_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("calendar.json");

        let provider = JsonFileProvider::new(&path);
        let id = provider
            .create_event(NewEvent::new("Read", span((9, 1), (9, 16)), "Learning Plan"))
            .await
            .unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileProvider::new(&path);
        let window = TimeWindow::new(utc(0, 0), utc(23, 0)).unwrap();
        let events = reopened
            .fetch_events(FetchOptions::new().with_time_window(window))
            .await
            .unwrap()
            .events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].start(), utc(9, 1));
        assert_eq!(events[0].end(), utc(9, 16));
    }

    #[tokio::test]
    async fn update_delete_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path().join("calendar.json"));
        let id = provider
            .create_event(NewEvent::new("Read", span((9, 0), (9, 15)), "Learning Plan"))
            .await
            .unwrap();

        provider
            .update_event(id.clone(), EventUpdate::new("Write", span((11, 0), (11, 45))))
            .await
            .unwrap();
        let events = provider.fetch_events(FetchOptions::new()).await.unwrap().events;
        assert_eq!(events[0].title, "Write");
        assert_eq!(events[0].duration_minutes(), 45);

        provider.delete_event(id.clone()).await.unwrap();
        let err = provider.delete_event(id).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(err.provider_name(), Some("json"));
    }

    #[tokio::test]
    async fn malformed_file_is_a_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileProvider::new(&path)
            .fetch_events(FetchOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ProviderError);
    }

    #[tokio::test]
    async fn invalid_events_in_file_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        let doc = serde_json::json!({
            "version": 1,
            "events": [{
                "id": "x",
                "title": "inverted",
                "interval": {"start": "2026-10-16T10:00:00Z", "end": "2026-10-16T09:00:00Z"},
                "calendar": "Work"
            }]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = JsonFileProvider::new(&path)
            .fetch_events(FetchOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ProviderError);
    }

    #[tokio::test]
    async fn reads_hand_written_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        let event =
            CalendarEvent::new("standup", "Standup", utc(9, 0), utc(9, 15), "Work").unwrap();
        let doc = EventStore::with_events(vec![event.clone()]);
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let events = JsonFileProvider::new(&path)
            .fetch_events(FetchOptions::new().with_calendar("Work"))
            .await
            .unwrap()
            .events;
        assert_eq!(events, vec![event]);
    }

    #[tokio::test]
    async fn saves_bump_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path().join("calendar.json"));
        let changes = provider.subscribe().unwrap();
        provider
            .create_event(NewEvent::new("Read", span((9, 0), (9, 15)), "Learning Plan"))
            .await
            .unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow(), 1);
    }
}
