//! What the user asked for: dates, focus time and session length.

use chrono::NaiveDate;
use learnslot_core::{
    CalendarEvent, CoreResult, DateRange, DiscoveryRequest, FocusPreset, FocusWindow,
    ReferenceZone,
};
use serde::{Deserialize, Serialize};

/// Default session length in minutes.
pub const DEFAULT_DURATION_MINUTES: i64 = 15;

/// Inputs of one suggestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreferences {
    /// Title given to booked sessions.
    pub title: String,
    /// Days to search.
    pub range: DateRange,
    /// Preferred focus time.
    pub focus: FocusPreset,
    /// Window used when `focus` is [`FocusPreset::Custom`].
    pub custom_window: FocusWindow,
    /// Session length in minutes.
    pub duration_minutes: i64,
}

impl SessionPreferences {
    /// Morning sessions of 15 minutes on `today`.
    pub fn for_day(today: NaiveDate) -> Self {
        let focus = FocusPreset::default();
        Self {
            title: String::new(),
            range: DateRange::single(today),
            focus,
            custom_window: focus.window().unwrap_or_else(FocusWindow::full_day),
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    /// Preferences describing an existing event, used when rescheduling it.
    ///
    /// The focus becomes custom and spans the event's own times of day.
    /// An event crossing midnight gets a full-day window.
    pub fn from_event(event: &CalendarEvent, zone: &ReferenceZone) -> CoreResult<Self> {
        let start_date = zone.date_of(event.start());
        let end_date = zone.date_of(event.end());
        let custom_window = FocusWindow::new(zone.time_of(event.start()), zone.time_of(event.end()))
            .unwrap_or_else(|_| FocusWindow::full_day());
        Ok(Self {
            title: event.title.clone(),
            range: DateRange::new(start_date, end_date)?,
            focus: FocusPreset::Custom,
            custom_window,
            duration_minutes: event.duration_minutes(),
        })
    }

    /// Builder: set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set the date range.
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Builder: use a preset focus time.
    pub fn with_focus(mut self, focus: FocusPreset) -> Self {
        self.focus = focus;
        self
    }

    /// Builder: use a custom focus window.
    pub fn with_custom_window(mut self, window: FocusWindow) -> Self {
        self.focus = FocusPreset::Custom;
        self.custom_window = window;
        self
    }

    /// Builder: set the session length.
    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// The effective focus window.
    pub fn window(&self) -> FocusWindow {
        self.focus.window().unwrap_or(self.custom_window)
    }

    /// Builds the discovery request, validating the duration.
    pub fn to_request(&self) -> CoreResult<DiscoveryRequest> {
        DiscoveryRequest::new(self.range, self.window(), self.duration_minutes)
    }
}
