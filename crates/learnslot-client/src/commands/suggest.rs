//! Suggest and book commands.

use chrono::Utc;
use learnslot_core::{CalendarEvent, CandidateSlot, JsonSession, JsonSlot};
use learnslot_planner::{BatchOutcome, Suggestions};
use serde::Serialize;
use tracing::info;

use crate::cli::PreferenceArgs;
use crate::commands::App;
use crate::error::ClientResult;

/// Result of a booking, as printed in JSON mode.
#[derive(Debug, Serialize)]
pub struct BookingReport {
    /// Sessions that were created.
    pub booked: Vec<JsonSession>,
    /// Slots that could not be booked.
    pub failures: Vec<JsonFailure>,
}

/// A slot that could not be booked.
#[derive(Debug, Serialize)]
pub struct JsonFailure {
    /// Slot number as passed to `--select`.
    pub slot: usize,
    /// Error code.
    pub code: String,
    /// Error message.
    pub error: String,
}

/// Computes and prints the free slots.
pub async fn suggest(app: &App, args: &PreferenceArgs) -> ClientResult<()> {
    let prefs = args.apply(app.base_preferences()?)?;
    let result = app.planner.suggest(&prefs, Utc::now()).await?;
    render(app, &result)
}

/// Prints one suggestion result.
pub fn render(app: &App, result: &Suggestions) -> ClientResult<()> {
    app.emit(
        || app.formatter.format_slots_tty(&result.days),
        &app.formatter.format_slots_json(&result.days),
    )
}

/// Recomputes the suggestions and books the selected slots.
///
/// Slot numbers are resolved against the current time, so they can differ
/// from an earlier `suggest` once a slot has started. `dry_run` only prints
/// what the numbers resolve to.
pub async fn book(
    app: &App,
    select: &[usize],
    title: Option<&str>,
    dry_run: bool,
    args: &PreferenceArgs,
) -> ClientResult<()> {
    let prefs = args.apply(app.base_preferences()?)?;
    let result = app.planner.suggest(&prefs, Utc::now()).await?;
    let slots = result.select(select)?;
    let chosen = chosen_slots(app, select, &slots);
    if dry_run {
        return app.emit(|| chosen_text(&chosen), &chosen);
    }

    for choice in &chosen {
        info!(slot = choice.index, start = %choice.start, end = %choice.end, "Booking slot");
    }
    let outcome = app.planner.book(&slots, title).await?;

    let title = match title.map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => app.planner.config().default_title.clone(),
    };
    let report = booking_report(app, select, &slots, &outcome, &title)?;
    app.emit(|| booking_text(app, &report, &slots, &title), &report)
}

fn chosen_slots(app: &App, select: &[usize], slots: &[CandidateSlot]) -> Vec<JsonSlot> {
    let zone = app.planner.config().zone;
    select
        .iter()
        .zip(slots)
        .map(|(&index, slot)| JsonSlot {
            index,
            start: zone.to_local(slot.start()),
            end: zone.to_local(slot.end()),
            minutes: slot.minutes(),
        })
        .collect()
}

fn chosen_text(chosen: &[JsonSlot]) -> String {
    let mut lines = vec!["Would book:".to_string()];
    for choice in chosen {
        lines.push(format!(
            "  [{}] {} - {}",
            choice.index,
            choice.start.format("%a %Y-%m-%d %H:%M"),
            choice.end.format("%H:%M")
        ));
    }
    lines.join("\n")
}

fn booking_report(
    app: &App,
    select: &[usize],
    slots: &[CandidateSlot],
    outcome: &BatchOutcome,
    title: &str,
) -> ClientResult<BookingReport> {
    let zone = app.planner.config().zone;
    let booked_slots = slots
        .iter()
        .enumerate()
        .filter(|(position, _)| !outcome.failures.iter().any(|f| f.slot == position + 1))
        .map(|(_, slot)| slot);

    let booked = outcome
        .created
        .iter()
        .zip(booked_slots)
        .map(|(id, slot)| JsonSession {
            id: id.to_string(),
            title: title.to_string(),
            start: zone.to_local(slot.start()),
            end: zone.to_local(slot.end()),
        })
        .collect();

    let failures = outcome
        .failures
        .iter()
        .map(|failure| JsonFailure {
            slot: select.get(failure.slot - 1).copied().unwrap_or(failure.slot),
            code: failure.error.code().to_string(),
            error: failure.error.message().to_string(),
        })
        .collect();

    Ok(BookingReport { booked, failures })
}

fn booking_text(app: &App, report: &BookingReport, slots: &[CandidateSlot], title: &str) -> String {
    let mut lines = vec![format!(
        "Booked {} of {} sessions in \"{}\"",
        report.booked.len(),
        slots.len(),
        app.planner.config().calendar_label
    )];
    for session in &report.booked {
        let line = CalendarEvent::new(
            session.id.as_str(),
            title,
            session.start.to_utc(),
            session.end.to_utc(),
            &app.planner.config().calendar_label,
        )
        .map(|event| app.formatter.format_event_line(&event))
        .unwrap_or_else(|_| session.id.clone());
        lines.push(format!("  {}", line));
    }
    for failure in &report.failures {
        lines.push(format!("  [{}] failed: {}", failure.slot, failure.error));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{app, app_with, busy_day};
    use crate::config::ClientConfig;
    use chrono::Timelike;
    use learnslot_planner::BatchPolicy;
    use learnslot_providers::InMemoryProvider;
    use std::sync::Arc;

    fn tomorrow_args(app: &App) -> PreferenceArgs {
        PreferenceArgs {
            from: Some(app.today() + chrono::Duration::days(1)),
            duration: Some(30),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn book_creates_selected_sessions() {
        let provider = Arc::new(InMemoryProvider::with_events(busy_day()));
        let app = app(provider.clone());
        let args = tomorrow_args(&app);

        book(&app, &[1, 3], Some("Rust"), false, &args).await.unwrap();

        let events = provider.snapshot().await;
        let booked: Vec<_> = events
            .iter()
            .filter(|e| e.is_in_calendar("Learning Plan"))
            .collect();
        assert_eq!(booked.len(), 2);
        assert!(booked.iter().all(|e| e.title == "Rust"));
        // 08:31-09:01 and 09:33-10:03 between the 08:00 and 11:00 meetings.
        let mut starts: Vec<_> = booked
            .iter()
            .map(|e| (e.start().hour(), e.start().minute()))
            .collect();
        starts.sort();
        assert_eq!(starts, vec![(8, 31), (9, 33)]);
    }

    #[tokio::test]
    async fn dry_run_shows_chosen_slots_without_booking() {
        let provider = Arc::new(InMemoryProvider::with_events(busy_day()));
        let app = app(provider.clone());
        let args = tomorrow_args(&app);

        book(&app, &[3, 1], None, true, &args).await.unwrap();
        assert_eq!(provider.snapshot().await.len(), 2);

        let result = app.planner.last_result().await.unwrap();
        let chosen = chosen_slots(&app, &[3, 1], &result.select(&[3, 1]).unwrap());
        let picked: Vec<_> = chosen
            .iter()
            .map(|c| (c.index, c.start.hour(), c.start.minute()))
            .collect();
        assert_eq!(picked, vec![(3, 9, 33), (1, 8, 31)]);

        let text = chosen_text(&chosen);
        assert!(text.contains("[3]"));
        assert!(text.contains("09:33 - 10:03"));
    }

    #[tokio::test]
    async fn book_rejects_unknown_slot_number() {
        let provider = Arc::new(InMemoryProvider::with_events(busy_day()));
        let app = app(provider.clone());
        let args = tomorrow_args(&app);

        assert!(book(&app, &[99], None, false, &args).await.is_err());
        assert_eq!(provider.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn report_maps_failures_to_selected_numbers() {
        let provider = Arc::new(InMemoryProvider::with_events(busy_day()));
        let mut config = ClientConfig::default();
        config.planner.batch_policy = BatchPolicy::BestEffort;
        let app = app_with(config, provider.clone());
        let args = tomorrow_args(&app);
        let prefs = args.apply(app.base_preferences().unwrap()).unwrap();
        let result = app.planner.suggest(&prefs, Utc::now()).await.unwrap();
        let slots = result.select(&[2, 3]).unwrap();

        provider.fail_creates_after(1);
        let outcome = app.planner.book(&slots, None).await.unwrap();
        let report = booking_report(&app, &[2, 3], &slots, &outcome, "Learning session").unwrap();

        assert_eq!(report.booked.len(), 1);
        assert_eq!(report.booked[0].start.to_utc(), slots[0].start());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].slot, 3);
        assert_eq!(report.failures[0].code, "create_failed");
    }
}
