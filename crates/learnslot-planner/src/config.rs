//! Planner configuration.

use std::time::Duration;

use learnslot_core::{DEFAULT_HORIZON_DAYS, ReferenceZone};

use crate::batch::BatchPolicy;

/// Label of the calendar holding learning sessions.
pub const DEFAULT_CALENDAR_LABEL: &str = "Learning Plan";

/// Title used when a booking does not name one.
pub const DEFAULT_SESSION_TITLE: &str = "Learning session";

/// Planner configuration.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Calendar that booked sessions go to and the learning plan reads.
    pub calendar_label: String,
    /// Title for sessions booked without one.
    pub default_title: String,
    /// Days covered by the learning plan.
    pub horizon_days: u64,
    /// Policy for batch bookings.
    pub batch_policy: BatchPolicy,
    /// Zone used for calendar days and times of day.
    pub zone: ReferenceZone,
    /// Refetch interval when the provider cannot notify.
    pub poll_interval: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            calendar_label: DEFAULT_CALENDAR_LABEL.to_string(),
            default_title: DEFAULT_SESSION_TITLE.to_string(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            batch_policy: BatchPolicy::default(),
            zone: ReferenceZone::local(),
            poll_interval: Duration::from_secs(60),
        }
    }
}

impl PlannerConfig {
    /// Creates a configuration for `zone` with defaults elsewhere.
    pub fn new(zone: ReferenceZone) -> Self {
        Self {
            zone,
            ..Default::default()
        }
    }

    /// Builder: set the learning calendar label.
    pub fn with_calendar_label(mut self, label: impl Into<String>) -> Self {
        self.calendar_label = label.into();
        self
    }

    /// Builder: set the default session title.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Builder: set the plan horizon.
    pub fn with_horizon_days(mut self, days: u64) -> Self {
        self.horizon_days = days;
        self
    }

    /// Builder: set the batch policy.
    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    /// Builder: set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
