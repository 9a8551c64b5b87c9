//! Output formatting for candidate slots and the learning plan.
//!
//! This module provides formatters for two output targets:
//! - **TTY**: Human-readable terminal output, one header per day
//! - **JSON**: Machine-readable JSON output
//!
//! Slots are numbered from 1 across all days in display order. The same
//! numbering is used when the user selects slots to book.
//!
//! # Example
//!
//! ```rust
//! use learnslot_core::format::{FormatOptions, OutputFormatter};
//! use learnslot_core::ReferenceZone;
//!
//! let formatter = OutputFormatter::new(FormatOptions::default(), ReferenceZone::utc());
//! assert_eq!(formatter.format_slots_tty(&[]), "No time suggestions");
//! ```

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;
use crate::group::DayGroup;
use crate::slot::CandidateSlot;
use crate::time::ReferenceZone;


/// The output format for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Tty,
    /// Machine-readable JSON output.
    Json,
}

/// Time format preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// 24-hour format (e.g., "14:30").
    #[default]
    H24,
    /// 12-hour format with AM/PM (e.g., "02:30 PM").
    H12,
}

/// Configuration options for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Time format preference.
    pub time_format: TimeFormat,
    /// Hour separator character (e.g., ":", "h").
    pub hour_separator: String,
    /// `strftime` pattern for day headers.
    pub date_header_format: String,
    /// Maximum length for event titles (truncated with ellipsis).
    pub max_title_length: Option<usize>,
    /// Text shown when there are no suggestions at all.
    pub no_suggestion_text: String,
    /// Text shown under a day that has no suggestions.
    pub empty_day_text: String,
    /// Text shown when the learning plan is empty.
    pub no_plan_text: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::H24,
            hour_separator: ":".to_string(),
            date_header_format: "%a, %b %d %Y".to_string(),
            max_title_length: None,
            no_suggestion_text: "No time suggestions".to_string(),
            empty_day_text: "(no suggestions)".to_string(),
            no_plan_text: "No learning sessions planned".to_string(),
        }
    }
}

/// JSON output for a set of suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSuggestions {
    /// Suggestions per day.
    pub days: Vec<JsonDay>,
    /// Total number of slots.
    pub count: usize,
}

/// One day of suggestions in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDay {
    /// The day.
    pub date: NaiveDate,
    /// Slots of the day.
    pub slots: Vec<JsonSlot>,
}

/// A single slot in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSlot {
    /// Selection number, starting at 1.
    pub index: usize,
    /// Start in the reference zone (RFC 3339).
    pub start: DateTime<FixedOffset>,
    /// End in the reference zone (RFC 3339).
    pub end: DateTime<FixedOffset>,
    /// Length in minutes.
    pub minutes: i64,
}

/// JSON output for the learning plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPlan {
    /// Planned sessions per day.
    pub days: Vec<JsonPlanDay>,
    /// Total number of sessions.
    pub count: usize,
}

/// One day of the learning plan in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPlanDay {
    /// The day.
    pub date: NaiveDate,
    /// Sessions of the day.
    pub sessions: Vec<JsonSession>,
}

/// A planned session in JSON format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSession {
    /// Event ID.
    pub id: String,
    /// Session title.
    pub title: String,
    /// Start in the reference zone (RFC 3339).
    pub start: DateTime<FixedOffset>,
    /// End in the reference zone (RFC 3339).
    pub end: DateTime<FixedOffset>,
}

/// Output formatter for suggestions and plans.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    options: FormatOptions,
    zone: ReferenceZone,
}

impl OutputFormatter {
    /// Creates a new OutputFormatter rendering times in `zone`.
    pub fn new(options: FormatOptions, zone: ReferenceZone) -> Self {
        Self { options, zone }
    }

    /// Creates a new OutputFormatter with default options in UTC.
    pub fn with_defaults() -> Self {
        Self::new(FormatOptions::default(), ReferenceZone::utc())
    }

    /// Formats suggestions for terminal display.
    pub fn format_slots_tty(&self, days: &[DayGroup<CandidateSlot>]) -> String {
        if days.is_empty() {
            return self.options.no_suggestion_text.clone();
        }

        let mut lines = Vec::new();
        let mut index = 0;
        for day in days {
            lines.push(self.format_date_header(day.date));
            if day.is_empty() {
                lines.push(format!("  {}", self.options.empty_day_text));
            }
            for slot in &day.items {
                index += 1;
                lines.push(format!(
                    "  [{}] {} - {}",
                    index,
                    self.format_time(slot.start()),
                    self.format_time(slot.end())
                ));
            }
        }
        lines.join("\n")
    }

    /// Builds the JSON structure for suggestions.
    pub fn format_slots_json(&self, days: &[DayGroup<CandidateSlot>]) -> JsonSuggestions {
        let mut index = 0;
        let days: Vec<JsonDay> = days
            .iter()
            .map(|day| JsonDay {
                date: day.date,
                slots: day
                    .items
                    .iter()
                    .map(|slot| {
                        index += 1;
                        JsonSlot {
                            index,
                            start: self.zone.to_local(slot.start()),
                            end: self.zone.to_local(slot.end()),
                            minutes: slot.minutes(),
                        }
                    })
                    .collect(),
            })
            .collect();

        JsonSuggestions { count: index, days }
    }

    /// Formats the learning plan for terminal display.
    pub fn format_plan_tty(&self, days: &[DayGroup<CalendarEvent>]) -> String {
        if days.iter().all(DayGroup::is_empty) {
            return self.options.no_plan_text.clone();
        }

        let mut lines = Vec::new();
        for day in days.iter().filter(|day| !day.is_empty()) {
            lines.push(self.format_date_header(day.date));
            for event in &day.items {
                lines.push(format!(
                    "  {} - {}  {}",
                    self.format_time(event.start()),
                    self.format_time(event.end()),
                    self.truncate_title(&event.title)
                ));
            }
        }
        lines.join("\n")
    }

    /// Builds the JSON structure for the learning plan.
    pub fn format_plan_json(&self, days: &[DayGroup<CalendarEvent>]) -> JsonPlan {
        let days: Vec<JsonPlanDay> = days
            .iter()
            .filter(|day| !day.is_empty())
            .map(|day| JsonPlanDay {
                date: day.date,
                sessions: day
                    .items
                    .iter()
                    .map(|event| JsonSession {
                        id: event.id.to_string(),
                        title: event.title.clone(),
                        start: self.zone.to_local(event.start()),
                        end: self.zone.to_local(event.end()),
                    })
                    .collect(),
            })
            .collect();
        let count = days.iter().map(|day| day.sessions.len()).sum();
        JsonPlan { days, count }
    }

    /// Formats a single event line, as used after booking or rescheduling.
    pub fn format_event_line(&self, event: &CalendarEvent) -> String {
        format!(
            "{} {} - {}  {} ({})",
            self.zone.date_of(event.start()),
            self.format_time(event.start()),
            self.format_time(event.end()),
            self.truncate_title(&event.title),
            event.id
        )
    }

    fn format_date_header(&self, date: NaiveDate) -> String {
        date.format(&self.options.date_header_format).to_string()
    }

    fn format_time(&self, instant: DateTime<Utc>) -> String {
        let local = self.zone.to_local(instant);
        let sep = &self.options.hour_separator;
        match self.options.time_format {
            TimeFormat::H24 => local.format(&format!("%H{}%M", sep)).to_string(),
            TimeFormat::H12 => local.format(&format!("%I{}%M %p", sep)).to_string(),
        }
    }

    fn truncate_title<'a>(&self, title: &'a str) -> Cow<'a, str> {
        match self.options.max_title_length {
            Some(max) => ellipsis(title, max),
            None => Cow::Borrowed(title),
        }
    }
}

/// Truncates a string to `max_len` characters, adding "..." if truncated.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsis_truncates() {
        assert_eq!(ellipsis("Short", 10), "Short");
        assert_eq!(ellipsis("A rather long title", 10), "A rathe...");
        assert_eq!(ellipsis("anything", 0), "");
    }

    #[test]
    fn empty_inputs_use_placeholder_text() {
        let formatter = OutputFormatter::with_defaults();
        assert_eq!(formatter.format_slots_tty(&[]), "No time suggestions");
        assert_eq!(formatter.format_plan_tty(&[]), "No learning sessions planned");

        let json = formatter.format_slots_json(&[]);
        assert_eq!(json.count, 0);
        assert!(json.days.is_empty());
    }

    #[test]
    fn output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
        let parsed: TimeFormat = serde_json::from_str("\"h12\"").unwrap();
        assert_eq!(parsed, TimeFormat::H12);
    }
}
