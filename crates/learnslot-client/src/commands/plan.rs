//! Plan and watch commands.

use chrono::Utc;
use learnslot_core::OutputFormat;
use learnslot_planner::{RefreshTrigger, Refresher, Suggestions};
use tracing::{info, warn};

use crate::cli::PreferenceArgs;
use crate::commands::App;
use crate::error::ClientResult;

/// Prints the learning sessions of the coming days.
pub async fn plan(app: &App) -> ClientResult<()> {
    let days = app.planner.learning_plan(Utc::now()).await?;
    app.emit(
        || app.formatter.format_plan_tty(&days),
        &app.formatter.format_plan_json(&days),
    )
}

/// Prints suggestions and reprints them whenever the calendar changes,
/// until interrupted.
pub async fn watch(app: &App, args: &PreferenceArgs) -> ClientResult<()> {
    let prefs = args.apply(app.base_preferences()?)?;
    let refresher = Refresher::new(app.planner.clone(), prefs);

    let run = refresher.run(|trigger, result: &Suggestions| {
        if let Err(e) = print_update(app, trigger, result) {
            warn!(error = %e, "Could not print suggestions");
        }
    });

    tokio::select! {
        _ = run => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Interrupted, stopping watch");
        }
    }
    Ok(())
}

fn print_update(app: &App, trigger: RefreshTrigger, result: &Suggestions) -> ClientResult<()> {
    match app.format {
        OutputFormat::Tty => {
            let local = app.planner.config().zone.to_local(result.computed_for);
            println!("# {} ({:?})", local.format("%Y-%m-%d %H:%M"), trigger);
            println!("{}\n", app.formatter.format_slots_tty(&result.days));
        }
        // One document per line so the stream can be consumed incrementally.
        OutputFormat::Json => {
            let json = app.formatter.format_slots_json(&result.days);
            println!("{}", serde_json::to_string(&json)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{app, busy_day};
    use learnslot_core::TimeInterval;
    use learnslot_providers::{CalendarProvider, InMemoryProvider, NewEvent};
    use std::sync::Arc;

    #[tokio::test]
    async fn plan_lists_only_learning_sessions() {
        let provider = Arc::new(InMemoryProvider::with_events(busy_day()));
        let app = app(provider.clone());
        let meeting = &busy_day()[0];
        let session = TimeInterval::new(
            meeting.end() + chrono::Duration::minutes(1),
            meeting.end() + chrono::Duration::minutes(31),
        )
        .unwrap();
        provider
            .create_event(NewEvent::new("Rust", session, "Learning Plan"))
            .await
            .unwrap();

        plan(&app).await.unwrap();
        let days = app.planner.learning_plan(Utc::now()).await.unwrap();
        let titles: Vec<_> = days
            .iter()
            .flat_map(|day| day.items.iter().map(|e| e.title.as_str()))
            .collect();
        assert_eq!(titles, vec!["Rust"]);
    }

    #[tokio::test]
    async fn watch_output_handles_both_formats() {
        let provider = Arc::new(InMemoryProvider::with_events(busy_day()));
        let mut app = app(provider);
        let prefs = PreferenceArgs {
            from: Some(app.today() + chrono::Duration::days(1)),
            ..Default::default()
        }
        .apply(app.base_preferences().unwrap())
        .unwrap();
        let result = app.planner.suggest(&prefs, Utc::now()).await.unwrap();

        print_update(&app, RefreshTrigger::Startup, &result).unwrap();
        app.format = OutputFormat::Tty;
        print_update(&app, RefreshTrigger::CalendarChanged, &result).unwrap();
    }
}
