//! Event list shared by the bundled providers.

use learnslot_core::{CalendarEvent, CoreError, EventId};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{EventUpdate, FetchOptions, NewEvent};

/// Current on-disk document version.
pub const STORE_VERSION: u32 = 1;

/// A flat list of events plus a format version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStore {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Stored events, in insertion order.
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

fn default_version() -> u32 {
    STORE_VERSION
}

impl Default for EventStore {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            events: Vec::new(),
        }
    }
}

impl EventStore {
    /// Creates a store holding `events`.
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Returns the matching events ordered by start.
    pub fn query(&self, options: &FetchOptions) -> Vec<CalendarEvent> {
        let mut events: Vec<CalendarEvent> = self
            .events
            .iter()
            .filter(|event| options.matches(event))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.start());
        events
    }

    /// Appends a new event under `id`.
    pub fn insert(&mut self, id: EventId, event: NewEvent) -> ProviderResult<()> {
        if self.position(&id).is_some() {
            return Err(ProviderError::create_failed(format!(
                "an event with id {id} already exists"
            )));
        }
        let created = CalendarEvent::from_interval(id, event.title, event.interval, event.calendar)
            .map_err(|e| invalid_event(ProviderErrorCode::CreateFailed, e))?;
        self.events.push(created);
        Ok(())
    }

    /// Replaces the title and span of event `id`.
    pub fn update(&mut self, id: &EventId, update: EventUpdate) -> ProviderResult<()> {
        let index = self
            .position(id)
            .ok_or_else(|| ProviderError::not_found(format!("no event with id {id}")))?;
        let current = &self.events[index];
        let updated = CalendarEvent::from_interval(
            id.clone(),
            update.title,
            update.interval,
            current.calendar.clone(),
        )
        .map_err(|e| invalid_event(ProviderErrorCode::UpdateFailed, e))?;
        self.events[index] = updated;
        Ok(())
    }

    /// Removes event `id` and returns it.
    pub fn remove(&mut self, id: &EventId) -> ProviderResult<CalendarEvent> {
        let index = self
            .position(id)
            .ok_or_else(|| ProviderError::not_found(format!("no event with id {id}")))?;
        Ok(self.events.remove(index))
    }

    /// Returns the event with `id`, if present.
    pub fn get(&self, id: &EventId) -> Option<&CalendarEvent> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|event| &event.id == id)
    }
}

fn invalid_event(code: ProviderErrorCode, err: CoreError) -> ProviderError {
    ProviderError::new(code, format!("invalid event: {err}")).with_source(err)
}
