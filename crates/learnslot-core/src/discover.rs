//! Composition of the pipeline stages.
//!
//! ```text
//! events ─▶ filter_events ─▶ group_by_day ─▶ calculate_buffers ─▶ day_slots ─▶ slots per day
//! ```
//!
//! Everything here is a pure function of its inputs. Rerunning with a new
//! `now` or new events recomputes from scratch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::calculate_buffers;
use crate::error::CoreResult;
use crate::event::CalendarEvent;
use crate::filter::filter_events;
use crate::group::{DayGroup, group_by_day, total_items};
use crate::slot::{CandidateSlot, day_slots, validate_duration};
use crate::time::{DateRange, FocusWindow, ReferenceZone};

/// What the user is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    /// Days to search.
    pub range: DateRange,
    /// Daily focus window.
    pub window: FocusWindow,
    /// Session length in minutes.
    pub duration_minutes: i64,
}

impl DiscoveryRequest {
    /// Creates a request, rejecting a non-positive duration up front.
    pub fn new(range: DateRange, window: FocusWindow, duration_minutes: i64) -> CoreResult<Self> {
        validate_duration(duration_minutes)?;
        Ok(Self {
            range,
            window,
            duration_minutes,
        })
    }
}

/// Runs the whole pipeline and returns the candidate slots of each day.
///
/// Every day that still has events after filtering gets a group, even when
/// none of its buffers can hold a session.
pub fn discover_slots(
    events: &[CalendarEvent],
    request: &DiscoveryRequest,
    zone: &ReferenceZone,
    now: DateTime<Utc>,
) -> CoreResult<Vec<DayGroup<CandidateSlot>>> {
    validate_duration(request.duration_minutes)?;

    let filtered = filter_events(events, &request.range, &request.window, zone);
    let days = group_by_day(&filtered, zone);
    let buffers = calculate_buffers(&days)?;
    let slots = buffers
        .iter()
        .map(|day| day_slots(day, request.duration_minutes, now))
        .collect::<CoreResult<Vec<_>>>()?;

    debug!(
        events = events.len(),
        days = slots.len(),
        slots = total_items(&slots),
        duration = request.duration_minutes,
        "Discovered slots"
    );
    Ok(slots)
}

/// Groups the events of the learning calendar by day.
pub fn learning_plan(
    events: &[CalendarEvent],
    calendar_label: &str,
    zone: &ReferenceZone,
) -> Vec<DayGroup<CalendarEvent>> {
    let planned: Vec<CalendarEvent> = events
        .iter()
        .filter(|event| event.is_in_calendar(calendar_label))
        .cloned()
        .collect();
    group_by_day(&planned, zone)
}
