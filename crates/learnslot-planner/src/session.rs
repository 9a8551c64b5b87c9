//! The planner session: fetch events, run discovery, write sessions back.
//!
//! The planner is the only stateful part of learnslot. It remembers the
//! latest suggestions so a later booking can refer to them by number.
//! Whichever computation completes last owns that state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use learnslot_core::{
    CalendarEvent, CandidateSlot, DayGroup, EventId, TimeWindow, discover_slots, learning_plan,
    total_items,
};
use learnslot_providers::{CalendarProvider, EventUpdate, FetchOptions, NewEvent, ProviderError};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::batch::{BatchOutcome, create_batch};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, PlannerResult};
use crate::preferences::SessionPreferences;

/// One completed suggestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    /// Candidate slots per day, ordered by date.
    pub days: Vec<DayGroup<CandidateSlot>>,
    /// Preferences the run used.
    pub preferences: SessionPreferences,
    /// The `now` the run filtered against.
    pub computed_for: DateTime<Utc>,
    /// Provider change counter of the calendar snapshot the run used.
    pub revision: u64,
    /// Completion number, increasing per planner. Zero for a run that was
    /// not stored because a newer calendar snapshot had already been seen.
    pub sequence: u64,
}

impl Suggestions {
    /// Total number of slots.
    pub fn count(&self) -> usize {
        total_items(&self.days)
    }

    /// Checks whether no slot was found.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Slots in display order, across days.
    pub fn slots(&self) -> impl Iterator<Item = &CandidateSlot> {
        self.days.iter().flat_map(|day| day.items.iter())
    }

    /// Resolves 1-based display numbers to slots.
    pub fn select(&self, numbers: &[usize]) -> PlannerResult<Vec<CandidateSlot>> {
        if numbers.is_empty() {
            return Err(PlannerError::NothingSelected);
        }
        let slots: Vec<&CandidateSlot> = self.slots().collect();
        numbers
            .iter()
            .map(|&n| {
                n.checked_sub(1)
                    .and_then(|i| slots.get(i))
                    .map(|slot| **slot)
                    .ok_or_else(|| PlannerError::invalid_selection(n, slots.len()))
            })
            .collect()
    }
}

/// Mutable planner state.
#[derive(Debug, Default)]
pub struct PlannerState {
    /// Latest completed suggestions.
    pub last_result: Option<Suggestions>,
    /// `now` of the latest completed run.
    pub last_now: Option<DateTime<Utc>>,
    /// Number of completed runs.
    pub completed: u64,
    /// Consecutive failed runs.
    pub consecutive_failures: u32,
    /// Message of the latest failure.
    pub last_error: Option<String>,
}

impl PlannerState {
    /// Stores a finished run, replacing any earlier one unless that one saw
    /// a newer calendar revision.
    fn publish(&mut self, mut result: Suggestions) -> Suggestions {
        let stale = self
            .last_result
            .as_ref()
            .is_some_and(|last| result.revision < last.revision);
        if stale {
            debug!(
                revision = result.revision,
                "Dropping suggestions computed from an older calendar"
            );
            return result;
        }
        self.completed += 1;
        result.sequence = self.completed;
        self.last_now = Some(result.computed_for);
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_result = Some(result.clone());
        result
    }

    /// Records a failed run. The previous result stays available.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.consecutive_failures += 1;
        self.last_error = Some(error.into());
    }
}

/// Shared planner state.
pub type SharedPlannerState = Arc<RwLock<PlannerState>>;

/// Drives the discovery pipeline against a calendar provider.
pub struct Planner {
    provider: Arc<dyn CalendarProvider>,
    config: PlannerConfig,
    state: SharedPlannerState,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Planner {
    /// Creates a planner over `provider`.
    pub fn new(provider: Arc<dyn CalendarProvider>, config: PlannerConfig) -> Self {
        Self {
            provider,
            config,
            state: Arc::new(RwLock::new(PlannerState::default())),
        }
    }

    /// The planner configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The calendar provider.
    pub fn provider(&self) -> &Arc<dyn CalendarProvider> {
        &self.provider
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedPlannerState {
        self.state.clone()
    }

    /// The latest completed suggestions, if any.
    pub async fn last_result(&self) -> Option<Suggestions> {
        self.state.read().await.last_result.clone()
    }

    /// Fetches the events of `prefs.range` and computes candidate slots.
    ///
    /// Invalid preferences fail before the provider is called. Every failed
    /// run is recorded in the state and keeps the previous result.
    pub async fn suggest(
        &self,
        prefs: &SessionPreferences,
        now: DateTime<Utc>,
    ) -> PlannerResult<Suggestions> {
        let run = self.compute(prefs, now).await;
        let mut state = self.state.write().await;
        match run {
            Ok(result) => {
                let result = state.publish(result);
                debug!(
                    sequence = result.sequence,
                    slots = result.count(),
                    "Suggestions ready"
                );
                Ok(result)
            }
            Err(e) => {
                state.record_failure(e.to_string());
                Err(e)
            }
        }
    }

    async fn compute(
        &self,
        prefs: &SessionPreferences,
        now: DateTime<Utc>,
    ) -> PlannerResult<Suggestions> {
        let request = prefs.to_request()?;
        let window = TimeWindow::for_range(&request.range, &self.config.zone)?;
        let fetched = self
            .provider
            .fetch_events(FetchOptions::new().with_time_window(window))
            .await?;
        let days = discover_slots(&fetched.events, &request, &self.config.zone, now)?;
        Ok(Suggestions {
            days,
            preferences: prefs.clone(),
            computed_for: now,
            revision: fetched.revision,
            sequence: 0,
        })
    }

    /// Events of the learning calendar from `now` through the horizon.
    pub async fn learning_plan(
        &self,
        now: DateTime<Utc>,
    ) -> PlannerResult<Vec<DayGroup<CalendarEvent>>> {
        let window = TimeWindow::upcoming(now, self.config.horizon_days)?;
        let events = self
            .provider
            .fetch_events(
                FetchOptions::new()
                    .with_time_window(window)
                    .with_calendar(&self.config.calendar_label),
            )
            .await?
            .events;
        Ok(learning_plan(
            &events,
            &self.config.calendar_label,
            &self.config.zone,
        ))
    }

    /// Books the slots numbered `selection` in the latest suggestions.
    pub async fn book_selection(
        &self,
        selection: &[usize],
        title: Option<&str>,
    ) -> PlannerResult<BatchOutcome> {
        let slots = {
            let state = self.state.read().await;
            let last = state.last_result.as_ref().ok_or(PlannerError::NoSuggestions)?;
            last.select(selection)?
        };
        self.book(&slots, title).await
    }

    /// Creates one learning session per slot using the configured policy.
    pub async fn book(
        &self,
        slots: &[CandidateSlot],
        title: Option<&str>,
    ) -> PlannerResult<BatchOutcome> {
        let title = self.session_title(title);
        let events = slots
            .iter()
            .map(|slot| NewEvent::from_slot(slot, title.clone(), &self.config.calendar_label))
            .collect();
        let outcome =
            create_batch(self.provider.as_ref(), events, self.config.batch_policy).await?;
        info!(created = outcome.created.len(), "Booked learning sessions");
        Ok(outcome)
    }

    /// Adds an arbitrary event, e.g. a commitment, to `calendar`.
    pub async fn add_event(&self, event: NewEvent) -> PlannerResult<EventId> {
        Ok(self.provider.create_event(event).await?)
    }

    /// Looks an event up by id.
    pub async fn find_event(&self, id: &EventId) -> PlannerResult<CalendarEvent> {
        self.provider
            .fetch_events(FetchOptions::new())
            .await?
            .events
            .into_iter()
            .find(|event| &event.id == id)
            .ok_or_else(|| ProviderError::not_found(format!("no event with id {id}")).into())
    }

    /// Preferences describing event `id`, the starting point of a reschedule.
    pub async fn preferences_for(&self, id: &EventId) -> PlannerResult<SessionPreferences> {
        let event = self.find_event(id).await?;
        Ok(SessionPreferences::from_event(&event, &self.config.zone)?)
    }

    /// Moves event `id` to the first of `slots`.
    ///
    /// Extra slots are ignored.
    pub async fn reschedule(
        &self,
        id: &EventId,
        slots: &[CandidateSlot],
        title: Option<&str>,
    ) -> PlannerResult<CandidateSlot> {
        let slot = *slots.first().ok_or(PlannerError::NothingSelected)?;
        let title = match title {
            Some(title) => title.to_string(),
            None => self.find_event(id).await?.title,
        };
        self.provider
            .update_event(id.clone(), EventUpdate::new(title, slot.interval))
            .await?;
        info!(%id, start = %slot.start(), "Rescheduled session");
        Ok(slot)
    }

    /// Moves event `id` to the slot numbered `number` in the latest suggestions.
    pub async fn reschedule_selection(
        &self,
        id: &EventId,
        number: usize,
        title: Option<&str>,
    ) -> PlannerResult<CandidateSlot> {
        let slots = {
            let state = self.state.read().await;
            let last = state.last_result.as_ref().ok_or(PlannerError::NoSuggestions)?;
            last.select(&[number])?
        };
        self.reschedule(id, &slots, title).await
    }

    /// Deletes event `id`.
    pub async fn remove(&self, id: &EventId) -> PlannerResult<()> {
        self.provider.delete_event(id.clone()).await?;
        info!(%id, "Removed event");
        Ok(())
    }

    fn session_title(&self, title: Option<&str>) -> String {
        match title.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.config.default_title.clone(),
        }
    }
}
