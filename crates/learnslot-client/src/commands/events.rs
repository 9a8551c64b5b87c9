//! Add, reschedule and remove commands.

use chrono::{NaiveDateTime, Utc};
use learnslot_core::{CalendarEvent, EventId, JsonSession, TimeInterval};
use learnslot_providers::NewEvent;
use serde_json::json;

use crate::cli::PreferenceArgs;
use crate::commands::{App, suggest};
use crate::error::ClientResult;

/// Stores a new event given in reference-zone local times.
pub async fn add(
    app: &App,
    title: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    calendar: &str,
) -> ClientResult<()> {
    let zone = app.planner.config().zone;
    let interval = TimeInterval::new(
        zone.at(start.date(), start.time())?,
        zone.at(end.date(), end.time())?,
    )?;
    let id = app
        .planner
        .add_event(NewEvent::new(title, interval, calendar))
        .await?;
    let event = CalendarEvent::from_interval(id, title, interval, calendar)?;
    app.emit(
        || format!("Added {}", app.formatter.format_event_line(&event)),
        &session_json(app, &event),
    )
}

/// Moves an event to the slot numbered `select`, or only lists the candidate
/// slots on `dry_run`.
///
/// The search starts from the event's own day, duration and times of day.
/// That window is exactly the event's current span, which stays blocked, so
/// without `--start`, `--end` or `--focus` in `args` there is never a slot to
/// move to.
pub async fn reschedule(
    app: &App,
    id: &str,
    select: usize,
    title: Option<&str>,
    dry_run: bool,
    args: &PreferenceArgs,
) -> ClientResult<()> {
    let id = EventId::from(id);
    let prefs = args.apply(app.planner.preferences_for(&id).await?)?;
    let result = app.planner.suggest(&prefs, Utc::now()).await?;
    if dry_run {
        return suggest::render(app, &result);
    }

    app.planner.reschedule_selection(&id, select, title).await?;
    let event = app.planner.find_event(&id).await?;
    app.emit(
        || format!("Moved {}", app.formatter.format_event_line(&event)),
        &session_json(app, &event),
    )
}

/// Deletes an event.
pub async fn remove(app: &App, id: &str) -> ClientResult<()> {
    let id = EventId::from(id);
    app.planner.remove(&id).await?;
    app.emit(|| format!("Removed {}", id), &json!({ "removed": id.as_str() }))
}

fn session_json(app: &App, event: &CalendarEvent) -> JsonSession {
    let zone = app.planner.config().zone;
    JsonSession {
        id: event.id.to_string(),
        title: event.title.clone(),
        start: zone.to_local(event.start()),
        end: zone.to_local(event.end()),
    }
}
