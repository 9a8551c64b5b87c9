//! Planner driver: suggestions, batch booking, refresh loop.
//!
//! The planner sits between a [`CalendarProvider`](learnslot_providers::CalendarProvider)
//! and the pure discovery pipeline of `learnslot-core`:
//!
//! - fetches the events of the requested days and computes candidate slots
//! - keeps the latest result so slots can be booked by display number
//! - books several slots under an explicit [`BatchPolicy`]
//! - reschedules or removes existing sessions
//! - recomputes in the background when the calendar changes ([`Refresher`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use learnslot_core::ReferenceZone;
//! use learnslot_planner::{Planner, PlannerConfig, SessionPreferences};
//! use learnslot_providers::JsonFileProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(JsonFileProvider::new("calendar.json"));
//!     let planner = Planner::new(provider, PlannerConfig::new(ReferenceZone::local()));
//!
//!     let prefs = SessionPreferences::for_day(Utc::now().date_naive());
//!     let suggestions = planner.suggest(&prefs, Utc::now()).await?;
//!     planner.book_selection(&[1], Some("Rust book")).await?;
//!     println!("{} slots", suggestions.count());
//!     Ok(())
//! }
//! ```

mod batch;
mod config;
mod error;
mod preferences;
mod refresh;
mod session;

pub use batch::{BatchOutcome, BatchPolicy, SlotFailure, create_batch};
pub use config::{DEFAULT_CALENDAR_LABEL, DEFAULT_SESSION_TITLE, PlannerConfig};
pub use error::{PlannerError, PlannerResult};
pub use preferences::{DEFAULT_DURATION_MINUTES, SessionPreferences};
pub use refresh::{Clock, RefreshCommand, RefreshHandle, RefreshTrigger, Refresher};
pub use session::{Planner, PlannerState, SharedPlannerState, Suggestions};
