//! Core types and the free-time discovery pipeline: filter, group, buffers, slots

pub mod buffer;
pub mod discover;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod group;
pub mod slot;
pub mod time;
pub mod tracing;

pub use buffer::{BufferInterval, calculate_buffers};
pub use discover::{DiscoveryRequest, discover_slots, learning_plan};
pub use error::{CoreError, CoreResult};
pub use event::{CalendarEvent, EventId};
pub use filter::filter_events;
pub use format::{
    FormatOptions, JsonDay, JsonPlan, JsonPlanDay, JsonSession, JsonSlot, JsonSuggestions,
    OutputFormat, OutputFormatter, TimeFormat, ellipsis,
};
pub use group::{DayGroup, Timed, group_by_day, total_items};
pub use slot::{CandidateSlot, generate_slots, validate_duration};
pub use time::{
    DEFAULT_HORIZON_DAYS, DateRange, FocusPreset, FocusWindow, ReferenceZone, SESSION_DURATIONS,
    TimeInterval, TimeWindow,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
