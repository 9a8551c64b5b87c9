//! Booking several slots at once.

use std::fmt;
use std::str::FromStr;

use learnslot_core::EventId;
use learnslot_providers::{CalendarProvider, NewEvent, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PlannerError, PlannerResult};

/// What to do when one create of a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Undo the creates done so far and fail the whole batch.
    #[default]
    AllOrNothing,
    /// Try every slot and report the failures.
    BestEffort,
}

impl BatchPolicy {
    /// Config name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllOrNothing => "all_or_nothing",
            Self::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all_or_nothing" => Ok(Self::AllOrNothing),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(format!(
                "unknown batch policy '{other}' (expected all_or_nothing or best_effort)"
            )),
        }
    }
}

/// A create that failed under [`BatchPolicy::BestEffort`].
#[derive(Debug)]
pub struct SlotFailure {
    /// 1-based position in the batch.
    pub slot: usize,
    /// Why it failed.
    pub error: ProviderError,
}

/// Result of a batch that did not abort.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Ids of the created events, in batch order.
    pub created: Vec<EventId>,
    /// Creates that failed.
    pub failures: Vec<SlotFailure>,
}

impl BatchOutcome {
    /// True when every create succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Creates `events` in order under `policy`.
pub async fn create_batch(
    provider: &dyn CalendarProvider,
    events: Vec<NewEvent>,
    policy: BatchPolicy,
) -> PlannerResult<BatchOutcome> {
    if events.is_empty() {
        return Err(PlannerError::NothingSelected);
    }

    let total = events.len();
    let mut outcome = BatchOutcome::default();
    for (position, event) in events.into_iter().enumerate() {
        let slot = position + 1;
        match provider.create_event(event).await {
            Ok(id) => {
                debug!(slot, %id, "Booked slot");
                outcome.created.push(id);
            }
            Err(error) => match policy {
                BatchPolicy::AllOrNothing => {
                    warn!(slot, %error, "Create failed, rolling back batch");
                    return Err(rollback(provider, outcome.created, slot, error).await);
                }
                BatchPolicy::BestEffort => {
                    warn!(slot, %error, "Create failed, continuing");
                    outcome.failures.push(SlotFailure { slot, error });
                }
            },
        }
    }

    info!(
        policy = %policy,
        requested = total,
        created = outcome.created.len(),
        failed = outcome.failures.len(),
        "Batch finished"
    );
    Ok(outcome)
}

async fn rollback(
    provider: &dyn CalendarProvider,
    created: Vec<EventId>,
    failed_slot: usize,
    cause: ProviderError,
) -> PlannerError {
    let mut rolled_back = 0;
    let mut left_behind = Vec::new();
    for id in created.into_iter().rev() {
        match provider.delete_event(id.clone()).await {
            Ok(()) => rolled_back += 1,
            Err(error) => {
                warn!(%id, %error, "Rollback could not delete event");
                left_behind.push(id);
            }
        }
    }
    PlannerError::BatchAborted {
        failed_slot,
        cause,
        rolled_back,
        left_behind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use learnslot_core::TimeInterval;
    use learnslot_providers::{InMemoryProvider, ProviderErrorCode};

    fn utc(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, min, 0).unwrap()
    }

    fn events(n: u32) -> Vec<NewEvent> {
        (0..n)
            .map(|i| {
                let interval = TimeInterval::new(utc(9 + i, 0), utc(9 + i, 15)).unwrap();
                NewEvent::new(format!("session {i}"), interval, "Learning Plan")
            })
            .collect()
    }

    #[tokio::test]
    async fn all_or_nothing_rolls_back() {
        let provider = InMemoryProvider::new();
        provider.fail_creates_after(2);

        let err = create_batch(&provider, events(4), BatchPolicy::AllOrNothing)
            .await
            .unwrap_err();
        match err {
            PlannerError::BatchAborted {
                failed_slot,
                cause,
                rolled_back,
                left_behind,
            } => {
                assert_eq!(failed_slot, 3);
                assert_eq!(cause.code(), ProviderErrorCode::CreateFailed);
                assert_eq!(rolled_back, 2);
                assert!(left_behind.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(provider.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn rollback_reports_undeletable_events() {
        let provider = InMemoryProvider::new();
        provider.fail_creates_after(1);
        provider.set_fail_deletes(true);

        let err = create_batch(&provider, events(2), BatchPolicy::AllOrNothing)
            .await
            .unwrap_err();
        let PlannerError::BatchAborted {
            rolled_back,
            left_behind,
            ..
        } = err
        else {
            panic!("expected BatchAborted");
        };
        assert_eq!(rolled_back, 0);
        assert_eq!(left_behind.len(), 1);
        assert_eq!(provider.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn best_effort_keeps_successes() {
        let provider = InMemoryProvider::new();
        provider.fail_creates_after(2);

        let outcome = create_batch(&provider, events(3), BatchPolicy::BestEffort)
            .await
            .unwrap();
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].slot, 3);
        assert!(!outcome.is_complete());
        assert_eq!(provider.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let provider = InMemoryProvider::new();
        let err = create_batch(&provider, Vec::new(), BatchPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::NothingSelected));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("best-effort".parse::<BatchPolicy>(), Ok(BatchPolicy::BestEffort));
        assert_eq!("ALL_OR_NOTHING".parse::<BatchPolicy>(), Ok(BatchPolicy::AllOrNothing));
        assert!("sometimes".parse::<BatchPolicy>().is_err());
        assert_eq!(
            serde_json::to_string(&BatchPolicy::BestEffort).unwrap(),
            "\"best_effort\""
        );
    }
}
