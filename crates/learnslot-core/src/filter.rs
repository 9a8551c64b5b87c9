//! Date-range and focus-window filtering of raw events.

use tracing::debug;

use crate::event::CalendarEvent;
use crate::time::{DateRange, FocusWindow, ReferenceZone};

/// Keeps the events that start on a day inside `range` and whose start and
/// end times-of-day both fall inside `window`.
///
/// Events that stick out of the window on either side are dropped whole,
/// never clipped. Surviving events keep their input order. A [`DateRange`]
/// cannot be inverted, so filtering itself cannot fail.
pub fn filter_events(
    events: &[CalendarEvent],
    range: &DateRange,
    window: &FocusWindow,
    zone: &ReferenceZone,
) -> Vec<CalendarEvent> {
    let kept: Vec<CalendarEvent> = events
        .iter()
        .filter(|event| in_window(event, range, window, zone))
        .cloned()
        .collect();

    debug!(
        input = events.len(),
        kept = kept.len(),
        range_start = %range.start(),
        range_end = %range.end(),
        window_start = %window.start(),
        window_end = %window.end(),
        "Filtered events"
    );
    kept
}

fn in_window(
    event: &CalendarEvent,
    range: &DateRange,
    window: &FocusWindow,
    zone: &ReferenceZone,
) -> bool {
    range.contains(zone.date_of(event.start()))
        && window.contains(zone.time_of(event.start()), zone.time_of(event.end()))
}
