//! Calendar event snapshots read by the pipeline.
//!
//! Events are owned by the calendar provider; the pipeline only reads
//! immutable [`CalendarEvent`] values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::time::TimeInterval;

/// Opaque identifier assigned to an event by its calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps a provider identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A calendar event as seen by the pipeline.
///
/// `start < end` always holds; zero-length and inverted events are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventRepr")]
pub struct CalendarEvent {
    /// Provider-assigned identifier.
    pub id: EventId,
    /// Event title.
    pub title: String,
    interval: TimeInterval,
    /// Label of the calendar the event belongs to.
    pub calendar: String,
}

#[derive(Deserialize)]
struct EventRepr {
    id: EventId,
    title: String,
    interval: TimeInterval,
    calendar: String,
}

impl TryFrom<EventRepr> for CalendarEvent {
    type Error = CoreError;

    fn try_from(repr: EventRepr) -> CoreResult<Self> {
        Self::from_interval(repr.id, repr.title, repr.interval, repr.calendar)
    }
}

impl CalendarEvent {
    /// Creates an event, failing unless `start < end`.
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        calendar: impl Into<String>,
    ) -> CoreResult<Self> {
        Self::from_interval(id, title, TimeInterval::new(start, end)?, calendar)
    }

    /// Creates an event spanning `interval`, failing if it has zero length.
    pub fn from_interval(
        id: impl Into<EventId>,
        title: impl Into<String>,
        interval: TimeInterval,
        calendar: impl Into<String>,
    ) -> CoreResult<Self> {
        if interval.start() == interval.end() {
            return Err(CoreError::InvalidInterval {
                start: interval.start(),
                end: interval.end(),
            });
        }
        Ok(Self {
            id: id.into(),
            title: title.into(),
            interval,
            calendar: calendar.into(),
        })
    }

    /// Start instant.
    pub fn start(&self) -> DateTime<Utc> {
        self.interval.start()
    }

    /// End instant.
    pub fn end(&self) -> DateTime<Utc> {
        self.interval.end()
    }

    /// The span of the event.
    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    /// Length of the event in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        self.interval.whole_minutes()
    }

    /// Checks whether this event belongs to the calendar labelled `label`.
    pub fn is_in_calendar(&self, label: &str) -> bool {
        self.calendar == label
    }
}
