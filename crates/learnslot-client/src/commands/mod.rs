//! Command implementations.

pub mod config;
pub mod events;
pub mod plan;
pub mod suggest;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use learnslot_core::{OutputFormat, OutputFormatter};
use learnslot_planner::{Planner, SessionPreferences};
use learnslot_providers::{CalendarProvider, JsonFileProvider};
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Everything a command needs: the planner, the formatter and the settings.
pub struct App {
    /// Planner over the configured store.
    pub planner: Arc<Planner>,
    /// Output formatter in the reference zone.
    pub formatter: OutputFormatter,
    /// TTY or JSON.
    pub format: OutputFormat,
    /// Loaded configuration.
    pub config: ClientConfig,
}

impl App {
    /// Builds the app over the JSON store at `store`, or the configured one.
    pub fn new(
        config: ClientConfig,
        store: Option<PathBuf>,
        format: OutputFormat,
    ) -> ClientResult<Self> {
        let path = store.unwrap_or_else(|| config.store_path());
        debug!(store = %path.display(), "Using JSON event store");
        Self::with_provider(config, Arc::new(JsonFileProvider::new(path)), format)
    }

    /// Builds the app over any provider.
    pub fn with_provider(
        config: ClientConfig,
        provider: Arc<dyn CalendarProvider>,
        format: OutputFormat,
    ) -> ClientResult<Self> {
        let planner_config = config.planner_config().map_err(ClientError::Config)?;
        let formatter = OutputFormatter::new(config.format_options(), planner_config.zone);
        Ok(Self {
            planner: Arc::new(Planner::new(provider, planner_config)),
            formatter,
            format,
            config,
        })
    }

    /// Today in the reference zone.
    pub fn today(&self) -> NaiveDate {
        self.planner.config().zone.date_of(Utc::now())
    }

    /// Preferences from the configuration, for today.
    pub fn base_preferences(&self) -> ClientResult<SessionPreferences> {
        let settings = &self.config.preferences;
        let window = self.config.custom_window().map_err(ClientError::Config)?;
        Ok(SessionPreferences::for_day(self.today())
            .with_title(&settings.title)
            .with_custom_window(window)
            .with_focus(settings.focus)
            .with_duration(settings.duration_minutes))
    }

    /// Prints `tty` or the JSON rendering of `json`, depending on the format.
    pub fn emit<T: Serialize>(&self, tty: impl FnOnce() -> String, json: &T) -> ClientResult<()> {
        match self.format {
            OutputFormat::Tty => println!("{}", tty()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(json)?),
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{DateTime, Duration, NaiveTime};
    use learnslot_core::{CalendarEvent, ReferenceZone};
    use learnslot_providers::InMemoryProvider;

    /// An app over an in-memory calendar, in UTC.
    pub fn app(provider: Arc<InMemoryProvider>) -> App {
        app_with(ClientConfig::default(), provider)
    }

    /// Same as [`app`] with a custom configuration.
    pub fn app_with(mut config: ClientConfig, provider: Arc<InMemoryProvider>) -> App {
        config.calendar.utc_offset_minutes = Some(0);
        App::with_provider(config, provider, OutputFormat::Json).unwrap()
    }

    /// Meetings at 08:00-08:30 and 11:00-11:30 tomorrow (UTC).
    pub fn busy_day() -> Vec<CalendarEvent> {
        let tomorrow = ReferenceZone::utc().date_of(Utc::now()) + Duration::days(1);
        let at = |h: u32, m: u32| -> DateTime<Utc> {
            tomorrow
                .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
                .and_utc()
        };
        vec![
            CalendarEvent::new("standup", "Standup", at(8, 0), at(8, 30), "Work").unwrap(),
            CalendarEvent::new("review", "Review", at(11, 0), at(11, 30), "Work").unwrap(),
        ]
    }
}
