//! CalendarProvider trait definition.
//!
//! A provider owns the user's events. The planner reads snapshots through
//! [`CalendarProvider::fetch_events`] and writes learning sessions back with
//! the create/update/delete operations.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use learnslot_core::{CalendarEvent, CandidateSlot, EventId, TimeInterval, TimeWindow};
use tokio::sync::watch;

use crate::error::{ProviderError, ProviderResult};

/// An event to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Title of the new event.
    pub title: String,
    /// Its span.
    pub interval: TimeInterval,
    /// Label of the calendar to create it in.
    pub calendar: String,
}

impl NewEvent {
    /// Creates a new event description.
    pub fn new(
        title: impl Into<String>,
        interval: TimeInterval,
        calendar: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            interval,
            calendar: calendar.into(),
        }
    }

    /// Describes an event covering exactly `slot`.
    pub fn from_slot(
        slot: &CandidateSlot,
        title: impl Into<String>,
        calendar: impl Into<String>,
    ) -> Self {
        Self::new(title, slot.interval, calendar)
    }
}

/// New title and span for an existing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpdate {
    /// Replacement title.
    pub title: String,
    /// Replacement span.
    pub interval: TimeInterval,
}

impl EventUpdate {
    /// Creates an update.
    pub fn new(title: impl Into<String>, interval: TimeInterval) -> Self {
        Self {
            title: title.into(),
            interval,
        }
    }
}

/// Options for fetching events.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Only return events overlapping this window.
    pub time_window: Option<TimeWindow>,
    /// Only return events of this calendar.
    pub calendar: Option<String>,
}

impl FetchOptions {
    /// Creates new fetch options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set time window.
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    /// Builder method to restrict to one calendar.
    pub fn with_calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = Some(calendar.into());
        self
    }

    /// Checks whether `event` passes these options.
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        let in_window = self
            .time_window
            .is_none_or(|window| window.overlaps(&event.interval()));
        let in_calendar = self
            .calendar
            .as_deref()
            .is_none_or(|label| event.is_in_calendar(label));
        in_window && in_calendar
    }
}

/// Events returned by a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// The fetched events, ordered by start.
    pub events: Vec<CalendarEvent>,
    /// Change counter of the provider when the snapshot was taken.
    pub revision: u64,
}

impl FetchResult {
    /// Creates a fetch result with events.
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            revision: 0,
        }
    }

    /// Builder method to set the revision.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The contract between the planner and a calendar backend.
///
/// Implementations must be `Send + Sync`. Providers never retry on their
/// own; errors go straight back to the caller.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "memory", "json").
    fn name(&self) -> &str;

    /// Fetches a snapshot of the events matching `options`.
    ///
    /// # Errors
    ///
    /// `AccessDenied` when calendar access is not granted, `ProviderError`
    /// for any other backend failure.
    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>>;

    /// Creates an event and returns its new identifier.
    ///
    /// # Errors
    ///
    /// `CreateFailed` when the backend refuses the event.
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, ProviderResult<EventId>>;

    /// Replaces the title and span of an existing event.
    ///
    /// # Errors
    ///
    /// `NotFound` when no event has this id, `UpdateFailed` otherwise.
    fn update_event(&self, id: EventId, update: EventUpdate)
    -> BoxFuture<'_, ProviderResult<()>>;

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// `NotFound` when no event has this id, `DeleteFailed` otherwise.
    fn delete_event(&self, id: EventId) -> BoxFuture<'_, ProviderResult<()>>;

    /// Subscribes to the provider's change counter.
    ///
    /// The counter increases after every successful write. Providers that
    /// cannot notify return `None` and are polled instead.
    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        None
    }

    /// How often callers without a subscription should refetch.
    fn suggested_poll_interval(&self) -> Duration {
        Duration::from_secs(60)
    }
}

/// A provider that always returns an error.
///
/// Used as a placeholder when a provider fails to initialize.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, ProviderResult<T>> {
        let error = self.error.detached().with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl CalendarProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events(&self, _options: FetchOptions) -> BoxFuture<'_, ProviderResult<FetchResult>> {
        self.fail()
    }

    fn create_event(&self, _event: NewEvent) -> BoxFuture<'_, ProviderResult<EventId>> {
        self.fail()
    }

    fn update_event(
        &self,
        _id: EventId,
        _update: EventUpdate,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        self.fail()
    }

    fn delete_event(&self, _id: EventId) -> BoxFuture<'_, ProviderResult<()>> {
        self.fail()
    }
}
