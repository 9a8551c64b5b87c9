//! Planner error types.

use learnslot_core::{CoreError, EventId};
use learnslot_providers::ProviderError;
use thiserror::Error;

/// Result type for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Errors surfaced by the planner.
///
/// Core and provider errors pass through unchanged; the planner never
/// retries.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Invalid input to the discovery pipeline.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The calendar collaborator failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// An all-or-nothing batch stopped at a failed create.
    #[error(
        "booking aborted at slot {failed_slot}: {cause} (rolled back {rolled_back}, {} left behind)",
        .left_behind.len()
    )]
    BatchAborted {
        /// 1-based position of the failed slot in the batch.
        failed_slot: usize,
        /// Why the create failed.
        #[source]
        cause: ProviderError,
        /// Number of events deleted during rollback.
        rolled_back: usize,
        /// Events the rollback could not delete.
        left_behind: Vec<EventId>,
    },

    /// A selection index does not name a suggestion.
    #[error("invalid selection {index}: choose between 1 and {available}")]
    InvalidSelection { index: usize, available: usize },

    /// An empty selection was given.
    #[error("no slot selected")]
    NothingSelected,

    /// Booking was requested before any suggestions were computed.
    #[error("no suggestions computed yet")]
    NoSuggestions,
}

impl PlannerError {
    /// Creates an invalid selection error.
    pub fn invalid_selection(index: usize, available: usize) -> Self {
        Self::InvalidSelection { index, available }
    }
}
