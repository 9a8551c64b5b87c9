//! Background recomputation of suggestions.
//!
//! The refresher recomputes whenever the provider reports a change, when
//! the poll interval elapses, or on request. Each run goes through
//! [`Planner::suggest`], so the last completed run is what callers see.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::preferences::SessionPreferences;
use crate::session::{Planner, Suggestions};

/// Commands that can be sent to a running refresher.
#[derive(Debug, Clone)]
pub enum RefreshCommand {
    /// Recompute immediately.
    RefreshNow,
    /// Replace the preferences and recompute.
    SetPreferences(Box<SessionPreferences>),
    /// Stop the loop.
    Stop,
}

/// Why a run happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First run after start.
    Startup,
    /// The provider's change counter moved.
    CalendarChanged,
    /// The poll interval elapsed.
    Poll,
    /// A command asked for it.
    Requested,
}

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Recomputes suggestions as the calendar changes.
pub struct Refresher {
    planner: Arc<Planner>,
    preferences: SessionPreferences,
    poll_interval: Duration,
    clock: Clock,
    command_tx: mpsc::Sender<RefreshCommand>,
    command_rx: mpsc::Receiver<RefreshCommand>,
}

impl Refresher {
    /// Creates a refresher for `preferences`, polling at the planner's
    /// configured interval or the provider's suggestion, whichever is shorter.
    pub fn new(planner: Arc<Planner>, preferences: SessionPreferences) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let poll_interval = planner
            .config()
            .poll_interval
            .min(planner.provider().suggested_poll_interval());
        Self {
            planner,
            preferences,
            poll_interval,
            clock: Arc::new(Utc::now),
            command_tx,
            command_rx,
        }
    }

    /// Builder: set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder: set the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a handle for sending commands to the refresher.
    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Runs until stopped, calling `on_update` after every successful run.
    ///
    /// Failed runs are logged and leave the previous result in place.
    pub async fn run<F>(mut self, mut on_update: F)
    where
        F: FnMut(RefreshTrigger, &Suggestions) + Send,
    {
        let mut changes = self.planner.provider().subscribe();
        info!(
            poll_secs = self.poll_interval.as_secs(),
            subscribed = changes.is_some(),
            "Refresher started"
        );

        self.run_once(RefreshTrigger::Startup, &mut on_update).await;

        loop {
            let trigger = tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => RefreshTrigger::Poll,
                changed = next_change(&mut changes) => {
                    if !changed {
                        warn!("Change feed closed, falling back to polling");
                        changes = None;
                        continue;
                    }
                    RefreshTrigger::CalendarChanged
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(RefreshCommand::RefreshNow) => RefreshTrigger::Requested,
                    Some(RefreshCommand::SetPreferences(prefs)) => {
                        self.preferences = *prefs;
                        RefreshTrigger::Requested
                    }
                    Some(RefreshCommand::Stop) | None => {
                        info!("Refresher stopping");
                        break;
                    }
                },
            };
            self.run_once(trigger, &mut on_update).await;
        }
    }

    async fn run_once<F>(&self, trigger: RefreshTrigger, on_update: &mut F)
    where
        F: FnMut(RefreshTrigger, &Suggestions) + Send,
    {
        let now = (self.clock)();
        debug!(?trigger, %now, "Recomputing suggestions");
        match self.planner.suggest(&self.preferences, now).await {
            Ok(result) => on_update(trigger, &result),
            Err(e) => warn!(?trigger, error = %e, "Refresh failed"),
        }
    }
}

/// Waits for the next change; resolves to `false` once the feed is closed.
/// Without a feed it never resolves.
async fn next_change(changes: &mut Option<watch::Receiver<u64>>) -> bool {
    match changes {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}

/// Handle for sending commands to a running refresher.
#[derive(Clone, Debug)]
pub struct RefreshHandle {
    command_tx: mpsc::Sender<RefreshCommand>,
}

impl RefreshHandle {
    /// Requests an immediate recomputation.
    pub async fn refresh_now(&self) -> Result<(), mpsc::error::SendError<RefreshCommand>> {
        self.command_tx.send(RefreshCommand::RefreshNow).await
    }

    /// Replaces the preferences of the running refresher.
    pub async fn set_preferences(
        &self,
        preferences: SessionPreferences,
    ) -> Result<(), mpsc::error::SendError<RefreshCommand>> {
        self.command_tx
            .send(RefreshCommand::SetPreferences(Box::new(preferences)))
            .await
    }

    /// Stops the refresher.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<RefreshCommand>> {
        self.command_tx.send(RefreshCommand::Stop).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use chrono::{NaiveDate, TimeZone};
    use learnslot_core::{CalendarEvent, ReferenceZone, TimeInterval};
    use learnslot_providers::{
        CalendarProvider, ErrorProvider, InMemoryProvider, NewEvent, ProviderError,
    };

    fn utc(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, min, 0).unwrap()
    }

    fn fixed_clock() -> Clock {
        Arc::new(|| Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap())
    }

    fn setup() -> (Arc<InMemoryProvider>, Arc<Planner>, SessionPreferences) {
        let events = vec![
            CalendarEvent::new("a", "a", utc(8, 0), utc(8, 30), "Work").unwrap(),
            CalendarEvent::new("b", "b", utc(11, 0), utc(11, 30), "Work").unwrap(),
        ];
        let provider = Arc::new(InMemoryProvider::with_events(events));
        let planner = Arc::new(Planner::new(
            provider.clone(),
            PlannerConfig::new(ReferenceZone::utc()),
        ));
        let prefs = SessionPreferences::for_day(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
            .with_duration(30);
        (provider, planner, prefs)
    }

    #[tokio::test]
    async fn recomputes_on_calendar_change() {
        let (provider, planner, prefs) = setup();
        let refresher = Refresher::new(planner.clone(), prefs)
            .with_poll_interval(Duration::from_secs(3600))
            .with_clock(fixed_clock());
        let handle = refresher.handle();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(refresher.run(move |trigger, result: &Suggestions| {
            let _ = tx.send((trigger, result.count(), result.sequence));
        }));

        let (trigger, count, seq) = rx.recv().await.unwrap();
        assert_eq!(trigger, RefreshTrigger::Startup);
        // 08:31..10:59 holds four 30 minute slots.
        assert_eq!((count, seq), (4, 1));

        let blocker = TimeInterval::new(utc(9, 0), utc(10, 0)).unwrap();
        provider
            .create_event(NewEvent::new("meeting", blocker, "Work"))
            .await
            .unwrap();

        let (trigger, count, seq) = rx.recv().await.unwrap();
        assert_eq!(trigger, RefreshTrigger::CalendarChanged);
        assert_eq!(seq, 2);
        assert!(count < 4);

        handle.stop().await.unwrap();
        task.await.unwrap();
        assert_eq!(planner.last_result().await.unwrap().sequence, 2);
    }

    #[tokio::test]
    async fn commands_trigger_runs() {
        let (_, planner, prefs) = setup();
        let refresher = Refresher::new(planner, prefs.clone())
            .with_poll_interval(Duration::from_secs(3600))
            .with_clock(fixed_clock());
        let handle = refresher.handle();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(refresher.run(move |trigger, result: &Suggestions| {
            let _ = tx.send((trigger, result.preferences.duration_minutes));
        }));

        assert_eq!(rx.recv().await.unwrap(), (RefreshTrigger::Startup, 30));
        handle.refresh_now().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), (RefreshTrigger::Requested, 30));
        handle.set_preferences(prefs.with_duration(60)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), (RefreshTrigger::Requested, 60));

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn polls_without_a_change_feed() {
        let provider: Arc<dyn CalendarProvider> =
            Arc::new(ErrorProvider::new("broken", ProviderError::access_denied("no")));
        let planner = Arc::new(Planner::new(provider, PlannerConfig::new(ReferenceZone::utc())));
        let prefs = SessionPreferences::for_day(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        let refresher = Refresher::new(planner.clone(), prefs)
            .with_poll_interval(Duration::from_secs(10))
            .with_clock(fixed_clock());
        let handle = refresher.handle();
        let task = tokio::spawn(refresher.run(|_, _: &Suggestions| {}));

        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.stop().await.unwrap();
        task.await.unwrap();

        let state = planner.state();
        let state = state.read().await;
        // Startup plus two polls, all failing.
        assert_eq!(state.consecutive_failures, 3);
        assert!(state.last_result.is_none());
    }
}
