//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use learnslot_core::{
    DateRange, FocusPreset, FocusWindow, OutputFormat, TracingConfig, time::parse_time_of_day,
};
use learnslot_planner::SessionPreferences;
use tracing::Level;

use crate::error::ClientResult;

/// learnslot - Find free time for learning sessions between your events
#[derive(Debug, Parser)]
#[command(name = "learnslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "LEARNSLOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the JSON event store
    #[arg(long, env = "LEARNSLOT_STORE", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Returns the output format based on CLI flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Tty
        }
    }

    /// Logging preset for the command: JSON lines for `watch`, compact
    /// otherwise. `--debug` or `debug = true` in the config raise the level.
    pub fn tracing_config(&self, config_debug: bool) -> TracingConfig {
        let debug = self.debug || config_debug;
        match self.command {
            Command::Watch { .. } if debug => TracingConfig::daemon().with_level(Level::DEBUG),
            Command::Watch { .. } => TracingConfig::daemon(),
            _ if debug => TracingConfig::cli_debug(),
            _ => TracingConfig::cli(),
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show free slots for learning sessions
    Suggest {
        #[command(flatten)]
        prefs: PreferenceArgs,
    },

    /// Book suggested slots in the learning calendar
    Book {
        /// Slot numbers as shown by `suggest`, comma separated
        #[arg(long, short, value_delimiter = ',', required = true)]
        select: Vec<usize>,

        /// Session title
        #[arg(long, short)]
        title: Option<String>,

        /// Only print the slots the numbers resolve to
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        prefs: PreferenceArgs,
    },

    /// Show the learning plan for the coming days
    Plan,

    /// Record an event, such as a meeting, in the store
    Add {
        /// Event title
        #[arg(long, short)]
        title: String,

        /// Start, `YYYY-MM-DD HH:MM` in the reference zone
        #[arg(long, value_parser = parse_date_time)]
        start: NaiveDateTime,

        /// End, `YYYY-MM-DD HH:MM` in the reference zone
        #[arg(long, value_parser = parse_date_time)]
        end: NaiveDateTime,

        /// Calendar label
        #[arg(long, default_value = "Calendar")]
        calendar: String,
    },

    /// Move a learning session to a new slot
    ///
    /// The search defaults to the event's own day and times, which it already
    /// occupies. Pass --start/--end or --focus to search a wider window.
    Reschedule {
        /// Id of the event to move
        #[arg(long)]
        id: String,

        /// Slot number to move to, as listed with `--dry-run`
        #[arg(long, short, default_value_t = 1)]
        select: usize,

        /// New title (keeps the current one by default)
        #[arg(long, short)]
        title: Option<String>,

        /// Only list the candidate slots
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        prefs: PreferenceArgs,
    },

    /// Delete an event
    Remove {
        /// Id of the event to delete
        #[arg(long)]
        id: String,
    },

    /// Keep suggestions up to date as the calendar changes
    Watch {
        #[command(flatten)]
        prefs: PreferenceArgs,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for the configured preferences.
#[derive(Debug, Clone, Default, Args)]
pub struct PreferenceArgs {
    /// First day to search (default: today)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to search (default: same as --from)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Focus time: morning, afternoon, evening or custom
    #[arg(long)]
    pub focus: Option<FocusPreset>,

    /// Custom focus window start (HH:MM), implies --focus custom
    #[arg(long, value_parser = parse_time)]
    pub start: Option<NaiveTime>,

    /// Custom focus window end (HH:MM), implies --focus custom
    #[arg(long, value_parser = parse_time)]
    pub end: Option<NaiveTime>,

    /// Session length in minutes (offered: 15, 30, 45 or 60)
    #[arg(long, short)]
    pub duration: Option<i64>,
}

impl PreferenceArgs {
    /// Applies the overrides on top of `base`.
    ///
    /// `--to` without `--from` keeps the base start day. `--start` or `--end`
    /// switch to a custom window, taking the missing bound from `base`.
    pub fn apply(&self, base: SessionPreferences) -> ClientResult<SessionPreferences> {
        let mut prefs = base;
        let range = match (self.from, self.to) {
            (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
            (Some(from), None) => Some(DateRange::single(from)),
            (None, Some(to)) => Some(DateRange::new(prefs.range.start(), to)?),
            (None, None) => None,
        };
        if let Some(range) = range {
            prefs = prefs.with_range(range);
        }

        if self.start.is_some() || self.end.is_some() {
            let current = prefs.window();
            let window = FocusWindow::new(
                self.start.unwrap_or(current.start()),
                self.end.unwrap_or(current.end()),
            )?;
            prefs = prefs.with_custom_window(window);
        } else if let Some(focus) = self.focus {
            prefs = prefs.with_focus(focus);
        }

        if let Some(minutes) = self.duration {
            prefs = prefs.with_duration(minutes);
        }
        Ok(prefs)
    }
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Dump,
    /// Check the configuration for unusable values
    Validate,
    /// Print the configuration file path
    Path,
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    parse_time_of_day(s).ok_or_else(|| format!("'{}' is not a time of day (HH:MM)", s))
}

fn parse_date_time(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s.trim(), fmt).ok())
        .ok_or_else(|| format!("'{}' is not a date and time (YYYY-MM-DD HH:MM)", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use learnslot_core::TracingOutputFormat;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_logs_json_lines() {
        let cli = Cli::parse_from(["learnslot", "watch"]);
        let config = cli.tracing_config(false);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.default_level, Level::INFO);

        let cli = Cli::parse_from(["learnslot", "--debug", "watch"]);
        assert_eq!(cli.tracing_config(false).default_level, Level::DEBUG);
        assert_eq!(cli.tracing_config(false).output_format, TracingOutputFormat::Json);
    }

    #[test]
    fn one_shot_commands_log_compact() {
        let cli = Cli::parse_from(["learnslot", "suggest"]);
        let config = cli.tracing_config(false);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(cli.tracing_config(true).default_level, Level::DEBUG);
    }

    #[test]
    fn book_parses_selection_list() {
        let cli = Cli::parse_from([
            "learnslot", "book", "--select", "1,3", "--title", "Rust", "--duration", "30",
        ]);
        match cli.command {
            Command::Book { select, title, dry_run, prefs } => {
                assert_eq!(select, vec![1, 3]);
                assert!(!dry_run);
                assert_eq!(title.as_deref(), Some("Rust"));
                assert_eq!(prefs.duration, Some(30));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn suggest_parses_preferences() {
        let cli = Cli::parse_from([
            "learnslot",
            "--json",
            "suggest",
            "--from",
            "2026-10-16",
            "--to",
            "2026-10-18",
            "--focus",
            "evening",
            "--start",
            "07:30",
        ]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
        let Command::Suggest { prefs } = cli.command else {
            panic!("expected suggest");
        };
        assert_eq!(prefs.from, NaiveDate::from_ymd_opt(2026, 10, 16));
        assert_eq!(prefs.to, NaiveDate::from_ymd_opt(2026, 10, 18));
        assert_eq!(prefs.focus, Some(FocusPreset::Evening));
        assert_eq!(prefs.start, NaiveTime::from_hms_opt(7, 30, 0));
    }

    #[test]
    fn add_parses_date_times() {
        let cli = Cli::parse_from([
            "learnslot",
            "add",
            "--title",
            "Standup",
            "--start",
            "2026-10-16 09:00",
            "--end",
            "2026-10-16T09:15",
        ]);
        let Command::Add { start, end, calendar, .. } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(end - start, chrono::Duration::minutes(15));
        assert_eq!(calendar, "Calendar");
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn apply_without_overrides_keeps_base() {
        let base = SessionPreferences::for_day(day(16)).with_title("Rust");
        let prefs = PreferenceArgs::default().apply(base.clone()).unwrap();
        assert_eq!(prefs, base);
    }

    #[test]
    fn apply_overrides() {
        let base = SessionPreferences::for_day(day(16));
        let args = PreferenceArgs {
            from: Some(day(17)),
            focus: Some(FocusPreset::Evening),
            duration: Some(45),
            ..Default::default()
        };
        let prefs = args.apply(base).unwrap();
        assert_eq!(prefs.range, DateRange::single(day(17)));
        assert_eq!(prefs.focus, FocusPreset::Evening);
        assert_eq!(prefs.duration_minutes, 45);

        let args = PreferenceArgs {
            to: Some(day(20)),
            ..Default::default()
        };
        let prefs = args.apply(SessionPreferences::for_day(day(16))).unwrap();
        assert_eq!(prefs.range, DateRange::new(day(16), day(20)).unwrap());
    }

    #[test]
    fn custom_bounds_take_precedence_over_focus() {
        let args = PreferenceArgs {
            focus: Some(FocusPreset::Evening),
            start: Some(time(7, 0)),
            ..Default::default()
        };
        let prefs = args.apply(SessionPreferences::for_day(day(16))).unwrap();
        assert_eq!(prefs.focus, FocusPreset::Custom);
        let morning = FocusPreset::Morning.window().unwrap();
        assert_eq!(prefs.window(), FocusWindow::new(time(7, 0), morning.end()).unwrap());
    }

    #[test]
    fn apply_rejects_inverted_input() {
        let args = PreferenceArgs {
            from: Some(day(18)),
            to: Some(day(16)),
            ..Default::default()
        };
        assert!(args.apply(SessionPreferences::for_day(day(16))).is_err());

        let args = PreferenceArgs {
            start: Some(time(18, 0)),
            end: Some(time(8, 0)),
            ..Default::default()
        };
        assert!(args.apply(SessionPreferences::for_day(day(16))).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["learnslot", "suggest", "--focus", "noon"]).is_err());
        assert!(Cli::try_parse_from(["learnslot", "suggest", "--start", "25:00"]).is_err());
        assert!(Cli::try_parse_from(["learnslot", "book"]).is_err());
    }
}
