//! Time types for the discovery pipeline.
//!
//! Instants are always stored in UTC. Calendar days and times-of-day are
//! derived through a [`ReferenceZone`], a fixed UTC offset, so every
//! computation is made against one clock that never jumps for daylight
//! saving.
//!
//! - [`TimeInterval`]: a closed `[start, end]` span between two instants
//! - [`TimeWindow`]: a half-open `[start, end)` window used for fetches
//! - [`DateRange`]: an inclusive range of calendar days
//! - [`FocusWindow`]: a daily time-of-day window, with [`FocusPreset`]s

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Days, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Session lengths offered to the user, in minutes.
pub const SESSION_DURATIONS: [i64; 4] = [15, 30, 45, 60];

/// Default planning horizon in days, counted from today.
pub const DEFAULT_HORIZON_DAYS: u64 = 7;

/// Parses a time-of-day written as `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

// ---------------------------------------------------------------------------
// ReferenceZone
// ---------------------------------------------------------------------------

/// The single reference zone used to split instants into day and time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone(FixedOffset);

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl ReferenceZone {
    /// The UTC reference zone.
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    /// The local offset at this moment.
    ///
    /// The offset is captured once; later daylight-saving changes do not
    /// affect a zone created before them.
    pub fn local() -> Self {
        Self(Local::now().offset().fix())
    }

    /// Creates a zone `minutes` east of UTC.
    pub fn from_offset_minutes(minutes: i32) -> CoreResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self)
            .ok_or(CoreError::out_of_range("utc offset"))
    }

    /// Returns the underlying offset.
    pub fn offset(&self) -> FixedOffset {
        self.0
    }

    /// Returns the offset in minutes east of UTC.
    pub fn offset_minutes(&self) -> i32 {
        self.0.local_minus_utc() / 60
    }

    /// Converts an instant into this zone.
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.0)
    }

    /// Returns the calendar day of an instant.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// Returns the time-of-day of an instant.
    pub fn time_of(&self, instant: DateTime<Utc>) -> NaiveTime {
        self.to_local(instant).time()
    }

    /// Returns the instant for `time` on `date` in this zone.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> CoreResult<DateTime<Utc>> {
        self.0
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(CoreError::out_of_range("local date-time"))
    }

    /// Returns the instant of midnight starting `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> CoreResult<DateTime<Utc>> {
        self.at(date, NaiveTime::MIN)
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UTC{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TimeInterval
// ---------------------------------------------------------------------------

/// A closed span of time between two instants.
///
/// `start <= end` always holds; construction rejects inverted spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct IntervalRepr {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<IntervalRepr> for TimeInterval {
    type Error = CoreError;

    fn try_from(repr: IntervalRepr) -> CoreResult<Self> {
        Self::new(repr.start, repr.end)
    }
}

impl TimeInterval {
    /// Creates an interval, failing if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates an interval of `minutes` starting at `start`.
    pub fn from_start(start: DateTime<Utc>, minutes: i64) -> CoreResult<Self> {
        let end = add_minutes(start, minutes)?;
        Self::new(start, end)
    }

    /// Start instant.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End instant.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length of the interval in whole minutes, rounded down.
    pub fn whole_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Checks whether an instant lies within `[start, end]`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Checks whether both ends lie at or after `now`.
    pub fn is_at_or_after(&self, now: DateTime<Utc>) -> bool {
        self.start >= now && self.end >= now
    }
}

/// Adds a signed number of minutes to an instant, failing on overflow.
pub fn add_minutes(instant: DateTime<Utc>, minutes: i64) -> CoreResult<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|delta| instant.checked_add_signed(delta))
        .ok_or(CoreError::out_of_range("minute arithmetic"))
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window, failing if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window covering every day of `range` in `zone`.
    pub fn for_range(range: &DateRange, zone: &ReferenceZone) -> CoreResult<Self> {
        let start = zone.start_of_day(range.start())?;
        let after_end = range
            .end()
            .checked_add_days(Days::new(1))
            .ok_or(CoreError::out_of_range("date range end"))?;
        Self::new(start, zone.start_of_day(after_end)?)
    }

    /// Creates a window starting at `now` and lasting `days` days.
    pub fn upcoming(now: DateTime<Utc>, days: u64) -> CoreResult<Self> {
        let end = now
            .checked_add_days(Days::new(days))
            .ok_or(CoreError::out_of_range("upcoming window"))?;
        Self::new(now, end)
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window (`[start, end)`).
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if an interval overlaps this window.
    pub fn overlaps(&self, interval: &TimeInterval) -> bool {
        interval.start() < self.end && interval.end() > self.start
    }
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateRangeRepr")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct DateRangeRepr {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateRangeRepr> for DateRange {
    type Error = CoreError;

    fn try_from(repr: DateRangeRepr) -> CoreResult<Self> {
        Self::new(repr.start, repr.end)
    }
}

impl DateRange {
    /// Creates a range, failing with `InvalidRange` if `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if end < start {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// A range from `today` through `today + days`.
    pub fn upcoming(today: NaiveDate, days: u64) -> CoreResult<Self> {
        let end = today
            .checked_add_days(Days::new(days))
            .ok_or(CoreError::out_of_range("planning horizon"))?;
        Self::new(today, end)
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Checks if `date` falls within the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

// ---------------------------------------------------------------------------
// FocusWindow / FocusPreset
// ---------------------------------------------------------------------------

/// A daily time-of-day window with no date component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FocusWindowRepr")]
pub struct FocusWindow {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct FocusWindowRepr {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<FocusWindowRepr> for FocusWindow {
    type Error = CoreError;

    fn try_from(repr: FocusWindowRepr) -> CoreResult<Self> {
        Self::new(repr.start, repr.end)
    }
}

impl FocusWindow {
    /// Creates a focus window, failing if `start` is after `end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidFocusWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The whole day, `00:00:00` to `23:59:59`.
    pub fn full_day() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Window start time-of-day.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Window end time-of-day.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Checks whether a span starting at `start` and ending at `end`
    /// (both times-of-day) lies inside the window.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start >= self.start && end <= self.end
    }
}

/// The user's preferred part of the day for sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusPreset {
    /// 04:00 to 11:59:59.
    #[default]
    Morning,
    /// 13:00 to 17:59:59.
    Afternoon,
    /// 18:00 to 22:59:59.
    Evening,
    /// A user-chosen window.
    Custom,
}

impl FocusPreset {
    /// All presets, in display order.
    pub const ALL: [FocusPreset; 4] = [
        Self::Morning,
        Self::Afternoon,
        Self::Evening,
        Self::Custom,
    ];

    /// Returns the preset's window, or `None` for [`FocusPreset::Custom`].
    pub fn window(&self) -> Option<FocusWindow> {
        let (start, end) = match self {
            Self::Morning => ((4, 0, 0), (11, 59, 59)),
            Self::Afternoon => ((13, 0, 0), (17, 59, 59)),
            Self::Evening => ((18, 0, 0), (22, 59, 59)),
            Self::Custom => return None,
        };
        let start = NaiveTime::from_hms_opt(start.0, start.1, start.2)?;
        let end = NaiveTime::from_hms_opt(end.0, end.1, end.2)?;
        FocusWindow::new(start, end).ok()
    }

    /// Returns the lowercase name of this preset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for FocusPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "custom" => Ok(Self::Custom),
            other => Err(format!(
                "unknown focus time '{other}' (expected morning, afternoon, evening or custom)"
            )),
        }
    }
}
