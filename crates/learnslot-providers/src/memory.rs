//! In-memory calendar provider.
//!
//! Holds events in a [`tokio::sync::RwLock`] and publishes a change counter
//! on every successful write. Failures can be injected to exercise the
//! planner's error paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use learnslot_core::{CalendarEvent, EventId};
use tokio::sync::{RwLock, watch};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    BoxFuture, CalendarProvider, EventUpdate, FetchOptions, FetchResult, NewEvent,
};
use crate::store::EventStore;

const NAME: &str = "memory";
const UNLIMITED: usize = usize::MAX;

/// A provider keeping events in process memory.
#[derive(Debug)]
pub struct InMemoryProvider {
    store: RwLock<EventStore>,
    changes: watch::Sender<u64>,
    access_denied: AtomicBool,
    create_budget: AtomicUsize,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::with_events(Vec::new())
    }

    /// Creates a provider seeded with `events`.
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            store: RwLock::new(EventStore::with_events(events)),
            changes,
            access_denied: AtomicBool::new(false),
            create_budget: AtomicUsize::new(UNLIMITED),
            fail_updates: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Makes every call fail with `AccessDenied` while `denied` is set.
    pub fn set_access_denied(&self, denied: bool) {
        self.access_denied.store(denied, Ordering::SeqCst);
    }

    /// Lets the next `count` creates succeed and fails every later one.
    pub fn fail_creates_after(&self, count: usize) {
        self.create_budget.store(count, Ordering::SeqCst);
    }

    /// Makes updates fail with `UpdateFailed`.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes deletes fail with `DeleteFailed`.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Returns every stored event ordered by start.
    pub async fn snapshot(&self) -> Vec<CalendarEvent> {
        self.store.read().await.query(&FetchOptions::new())
    }

    /// Current value of the change counter.
    pub fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    fn check_access(&self) -> ProviderResult<()> {
        if self.access_denied.load(Ordering::SeqCst) {
            let error = ProviderError::access_denied("calendar access not granted");
            return Err(error.with_provider(NAME));
        }
        Ok(())
    }

    fn take_create_permit(&self) -> bool {
        self.create_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }

    fn bump(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }
}

impl CalendarProvider for InMemoryProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
        Box::pin(async move {
            self.check_access()?;
            let events = self.store.read().await.query(&options);
            debug!(count = events.len(), "Fetched events from memory");
            Ok(FetchResult::with_events(events).with_revision(self.revision()))
        })
    }

    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, ProviderResult<EventId>> {
        Box::pin(async move {
            self.check_access()?;
            if !self.take_create_permit() {
                return Err(ProviderError::create_failed(format!(
                    "refused to create '{}'",
                    event.title
                ))
                .with_provider(NAME));
            }
            let id = EventId::new(format!("mem-{}", Uuid::new_v4()));
            self.store
                .write()
                .await
                .insert(id.clone(), event)
                .map_err(|e| e.with_provider(NAME))?;
            self.bump();
            debug!(%id, "Created event");
            Ok(id)
        })
    }

    fn update_event(&self, id: EventId, update: EventUpdate) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.check_access()?;
            let mut store = self.store.write().await;
            if store.get(&id).is_none() {
                let message = format!("no event with id {id}");
                return Err(ProviderError::not_found(message).with_provider(NAME));
            }
            if self.fail_updates.load(Ordering::SeqCst) {
                let message = format!("refused to update {id}");
                return Err(ProviderError::update_failed(message).with_provider(NAME));
            }
            store.update(&id, update).map_err(|e| e.with_provider(NAME))?;
            drop(store);
            self.bump();
            debug!(%id, "Updated event");
            Ok(())
        })
    }

    fn delete_event(&self, id: EventId) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            self.check_access()?;
            let mut store = self.store.write().await;
            if store.get(&id).is_none() {
                let message = format!("no event with id {id}");
                return Err(ProviderError::not_found(message).with_provider(NAME));
            }
            if self.fail_deletes.load(Ordering::SeqCst) {
                let message = format!("refused to delete {id}");
                return Err(ProviderError::delete_failed(message).with_provider(NAME));
            }
            store.remove(&id).map_err(|e| e.with_provider(NAME))?;
            drop(store);
            self.bump();
            debug!(%id, "Deleted event");
            Ok(())
        })
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        Some(self.changes.subscribe())
    }
}
