//! Free intervals between consecutive events of a day.
//!
//! A buffer starts one minute after an event ends and stops one minute
//! before the next one begins. Nothing is produced before the first event
//! of a day or after its last one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::CoreResult;
use crate::event::CalendarEvent;
use crate::group::{DayGroup, Timed};
use crate::time::{TimeInterval, add_minutes};

/// Free time between two consecutive events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferInterval {
    /// The free span, both ends inclusive.
    pub interval: TimeInterval,
    /// Length of the span in whole minutes, rounded down.
    pub duration_minutes: i64,
}

impl BufferInterval {
    /// Builds a buffer from a span, deriving its duration.
    pub fn new(interval: TimeInterval) -> Self {
        Self {
            interval,
            duration_minutes: interval.whole_minutes(),
        }
    }

    /// Start of the free span.
    pub fn start(&self) -> DateTime<Utc> {
        self.interval.start()
    }

    /// End of the free span.
    pub fn end(&self) -> DateTime<Utc> {
        self.interval.end()
    }
}

impl Timed for BufferInterval {
    fn start_instant(&self) -> DateTime<Utc> {
        self.start()
    }
}

/// Returns the buffer between `current` and `next`, or `None` when they are
/// less than two minutes apart.
pub fn buffer_between(
    current: &CalendarEvent,
    next: &CalendarEvent,
) -> CoreResult<Option<BufferInterval>> {
    let start = add_minutes(current.end(), 1)?;
    let end = add_minutes(next.start(), -1)?;
    if end < start {
        trace!(
            after = %current.id,
            before = %next.id,
            "Events too close for a buffer"
        );
        return Ok(None);
    }
    Ok(Some(BufferInterval::new(TimeInterval::new(start, end)?)))
}

/// Computes the buffers of one day group.
pub fn day_buffers(group: &DayGroup<CalendarEvent>) -> CoreResult<DayGroup<BufferInterval>> {
    let mut buffers = Vec::with_capacity(group.items.len().saturating_sub(1));
    for pair in group.items.windows(2) {
        if let Some(buffer) = buffer_between(&pair[0], &pair[1])? {
            buffers.push(buffer);
        }
    }
    Ok(DayGroup::new(group.date, buffers))
}

/// Computes the buffers of every day group, keeping the dates.
pub fn calculate_buffers(
    groups: &[DayGroup<CalendarEvent>],
) -> CoreResult<Vec<DayGroup<BufferInterval>>> {
    let buffers = groups.iter().map(day_buffers).collect::<CoreResult<Vec<_>>>()?;
    debug!(
        days = buffers.len(),
        buffers = crate::group::total_items(&buffers),
        "Calculated buffers"
    );
    Ok(buffers)
}
