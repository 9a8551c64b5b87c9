//! CalendarProvider trait and implementations.
//!
//! - [`CalendarProvider`] - the contract between the planner and a calendar
//! - [`InMemoryProvider`] - process-local events with failure injection
//! - [`JsonFileProvider`] - events persisted in one JSON document
//! - [`ProviderError`] - error type for provider operations
//!
//! # Example
//!
//! ```ignore
//! use learnslot_providers::{CalendarProvider, FetchOptions, JsonFileProvider};
//!
//! let provider = JsonFileProvider::new("calendar.json");
//! let events = provider.fetch_events(FetchOptions::new()).await?.events;
//! ```

pub mod error;
pub mod json_file;
pub mod memory;
pub mod provider;
pub mod store;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use json_file::JsonFileProvider;
pub use memory::InMemoryProvider;
pub use provider::{
    BoxFuture, CalendarProvider, ErrorProvider, EventUpdate, FetchOptions, FetchResult, NewEvent,
};
pub use store::{EventStore, STORE_VERSION};
