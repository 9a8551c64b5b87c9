//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/learnslot/config.toml` by default. Every section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use learnslot_core::{
    FocusPreset, FocusWindow, FormatOptions, ReferenceZone, TimeFormat, time::parse_time_of_day,
};
use learnslot_planner::{
    BatchPolicy, DEFAULT_CALENDAR_LABEL, DEFAULT_DURATION_MINUTES, DEFAULT_SESSION_TITLE,
    PlannerConfig,
};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "learnslot";

/// Configuration for the learnslot client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Defaults for suggestion runs.
    pub preferences: PreferenceSettings,

    /// Where events live.
    pub calendar: CalendarSettings,

    /// Booking and refresh behaviour.
    pub planner: PlannerSettings,

    /// Output formatting.
    pub display: DisplaySettings,
}

/// Defaults for suggestion runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSettings {
    /// Title of booked sessions.
    pub title: String,
    /// Preferred focus time.
    pub focus: FocusPreset,
    /// Start of the custom focus window (`HH:MM`).
    pub custom_start: String,
    /// End of the custom focus window (`HH:MM`).
    pub custom_end: String,
    /// Session length in minutes.
    pub duration_minutes: i64,
    /// Days shown by `plan`.
    pub horizon_days: u64,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_SESSION_TITLE.to_string(),
            focus: FocusPreset::default(),
            custom_start: "09:00".to_string(),
            custom_end: "17:00".to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            horizon_days: learnslot_core::DEFAULT_HORIZON_DAYS,
        }
    }
}

/// Calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar holding learning sessions.
    pub label: String,
    /// JSON store path. Defaults to the data directory.
    pub store_path: Option<PathBuf>,
    /// Reference zone offset. Defaults to the local offset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            label: DEFAULT_CALENDAR_LABEL.to_string(),
            store_path: None,
            utc_offset_minutes: None,
        }
    }
}

/// Planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// What to do when one booking of a batch fails.
    pub batch_policy: BatchPolicy,
    /// Refetch interval for `watch`, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            batch_policy: BatchPolicy::default(),
            poll_interval_secs: 60,
        }
    }
}

/// Display settings for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// 24 or 12 hour clock.
    pub time_format: TimeFormat,

    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,

    /// Text to show when there are no suggestions.
    pub no_suggestion_text: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            max_title_length: None,
            no_suggestion_text: FormatOptions::default().no_suggestion_text,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Path of the JSON event store, with `~/` expanded.
    pub fn store_path(&self) -> PathBuf {
        match self.calendar.store_path {
            Some(ref path) => expand_home(path),
            None => Self::default_data_dir().join("calendar.json"),
        }
    }

    /// The reference zone.
    pub fn zone(&self) -> Result<ReferenceZone, String> {
        match self.calendar.utc_offset_minutes {
            Some(minutes) => ReferenceZone::from_offset_minutes(minutes)
                .map_err(|_| format!("utc_offset_minutes {} is out of range", minutes)),
            None => Ok(ReferenceZone::local()),
        }
    }

    /// The configured custom focus window.
    pub fn custom_window(&self) -> Result<FocusWindow, String> {
        let parse = |field: &str, value: &str| {
            parse_time_of_day(value)
                .ok_or_else(|| format!("{} '{}' is not a time of day (HH:MM)", field, value))
        };
        let start = parse("custom_start", &self.preferences.custom_start)?;
        let end = parse("custom_end", &self.preferences.custom_end)?;
        FocusWindow::new(start, end).map_err(|e| e.to_string())
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), String> {
        self.zone()?;
        self.custom_window()?;
        if self.preferences.duration_minutes <= 0 {
            return Err(format!(
                "duration_minutes must be positive, got {}",
                self.preferences.duration_minutes
            ));
        }
        if self.calendar.label.trim().is_empty() {
            return Err("calendar label must not be empty".to_string());
        }
        if self.planner.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be at least 1".to_string());
        }
        Ok(())
    }

    /// Builds the planner configuration.
    pub fn planner_config(&self) -> Result<PlannerConfig, String> {
        Ok(PlannerConfig::new(self.zone()?)
            .with_calendar_label(&self.calendar.label)
            .with_default_title(&self.preferences.title)
            .with_horizon_days(self.preferences.horizon_days)
            .with_batch_policy(self.planner.batch_policy)
            .with_poll_interval(Duration::from_secs(self.planner.poll_interval_secs.max(1))))
    }

    /// Builds the output formatting options.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            time_format: self.display.time_format,
            max_title_length: self.display.max_title_length,
            no_suggestion_text: self.display.no_suggestion_text.clone(),
            ..FormatOptions::default()
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
