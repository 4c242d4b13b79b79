//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use super::{FocusTimer, RunState, TickOutcome, TimerConfig, TimerSnapshot};
use crate::{tasks::ticker_task, utils::format_uptime};

/// Outcome of a user intent applied to the timer
#[derive(Debug, Clone)]
pub struct Transition {
    /// Whether the intent changed the timer or was ignored
    pub changed: bool,
    pub snapshot: TimerSnapshot,
}

/// Handle of the ticker task currently driving the timer
#[derive(Debug)]
struct Ticker {
    id: u64,
    handle: JoinHandle<()>,
}

/// Timer and its ticker, locked together so a transition and the ticker
/// bookkeeping it implies happen atomically
#[derive(Debug)]
struct TimerSlot {
    timer: FocusTimer,
    ticker: Option<Ticker>,
    next_ticker_id: u64,
}

impl TimerSlot {
    /// Replace any ticker with a fresh one. Only called when the timer runs.
    fn spawn_ticker(&mut self, state: &Arc<AppState>) {
        self.stop_ticker();
        self.next_ticker_id += 1;
        let id = self.next_ticker_id;
        let handle = tokio::spawn(ticker_task(Arc::downgrade(state), id));
        debug!("Spawned ticker #{}", id);
        self.ticker = Some(Ticker { id, handle });
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
            debug!("Stopped ticker #{}", ticker.id);
        }
    }
}

/// Main application state hosting the focus timer
#[derive(Debug)]
pub struct AppState {
    slot: Mutex<TimerSlot>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Latest snapshot, republished after every transition
    pub snapshot_tx: watch::Sender<TimerSnapshot>,
}

impl AppState {
    /// Create a new AppState with an idle timer
    pub fn new(port: u16, host: String, config: TimerConfig) -> Self {
        let timer = FocusTimer::new(config);
        let (snapshot_tx, _) = watch::channel(timer.snapshot());

        Self {
            slot: Mutex::new(TimerSlot {
                timer,
                ticker: None,
                next_ticker_id: 0,
            }),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            snapshot_tx,
        }
    }

    fn lock_slot(&self) -> Result<MutexGuard<'_, TimerSlot>, String> {
        self.slot.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Publish the snapshot to watchers. Called with the slot locked so
    /// watchers see transitions in order.
    fn publish(&self, snapshot: &TimerSnapshot) {
        self.snapshot_tx.send_replace(snapshot.clone());
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Start or resume the countdown, spawning the ticker
    pub fn start(self: &Arc<Self>) -> Result<Transition, String> {
        let mut slot = self.lock_slot()?;

        let changed = slot.timer.start();
        if changed {
            slot.spawn_ticker(self);
            info!("Timer started: {:?}, {}s remaining",
                  slot.timer.phase(), slot.timer.remaining_seconds());
        } else {
            debug!("Start ignored, timer already running");
        }

        let snapshot = slot.timer.snapshot();
        if changed {
            self.publish(&snapshot);
        }
        drop(slot);

        self.record_action("start");
        Ok(Transition { changed, snapshot })
    }

    /// Toggle between running and paused, stopping or respawning the ticker
    pub fn pause(self: &Arc<Self>) -> Result<Transition, String> {
        let mut slot = self.lock_slot()?;

        let changed = slot.timer.pause();
        match (changed, slot.timer.state()) {
            (true, RunState::Paused) => {
                slot.stop_ticker();
                info!("Timer paused at {}s", slot.timer.remaining_seconds());
            }
            (true, RunState::Running) => {
                slot.spawn_ticker(self);
                info!("Timer resumed at {}s", slot.timer.remaining_seconds());
            }
            _ => debug!("Pause ignored, timer is idle"),
        }

        let snapshot = slot.timer.snapshot();
        if changed {
            self.publish(&snapshot);
        }
        drop(slot);

        self.record_action("pause");
        Ok(Transition { changed, snapshot })
    }

    /// Stop the ticker and return to a fresh Focus phase
    pub fn reset(&self) -> Result<Transition, String> {
        let mut slot = self.lock_slot()?;

        slot.stop_ticker();
        slot.timer.reset();
        info!("Timer reset, {} sessions completed so far", slot.timer.completed_sessions());

        let snapshot = slot.timer.snapshot();
        self.publish(&snapshot);
        drop(slot);

        self.record_action("reset");
        Ok(Transition { changed: true, snapshot })
    }

    /// Apply one tick on behalf of ticker `ticker_id`.
    ///
    /// Ticks from a ticker that has since been replaced or stopped are
    /// ignored, so a ticker racing an abort can never count twice.
    pub fn tick(&self, ticker_id: u64) -> Result<TickOutcome, String> {
        let mut slot = self.lock_slot()?;

        if slot.ticker.as_ref().map(|t| t.id) != Some(ticker_id) {
            return Ok(TickOutcome::Ignored);
        }

        let outcome = slot.timer.tick();
        match outcome {
            TickOutcome::Ignored => return Ok(outcome),
            TickOutcome::PhaseCompleted { .. } => {
                // The ticker returns on its own after this tick
                slot.ticker = None;
            }
            TickOutcome::Counted { .. } => {}
        }

        let snapshot = slot.timer.snapshot();
        self.publish(&snapshot);
        Ok(outcome)
    }

    /// Get a snapshot of the timer
    pub fn get_snapshot(&self) -> Result<TimerSnapshot, String> {
        self.lock_slot().map(|slot| slot.timer.snapshot())
    }

    /// Watch snapshots, starting from the current one
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether a ticker task is currently attached to the timer
    pub fn ticker_active(&self) -> Result<bool, String> {
        self.lock_slot().map(|slot| slot.ticker.is_some())
    }

    /// Tear down the ticker without touching the timer
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.stop_ticker();
        }
        info!("Timer ticker shut down");
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Ok(slot) = self.slot.get_mut() {
            slot.stop_ticker();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::sleep;

    use super::*;
    use crate::state::Phase;

    fn app(focus_secs: u64, break_secs: u64) -> Arc<AppState> {
        Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            TimerConfig::new(focus_secs, break_secs),
        ))
    }

    fn remaining(state: &AppState) -> u64 {
        state.get_snapshot().unwrap().remaining_seconds
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_once_per_second() {
        let state = app(5, 3);
        assert!(state.start().unwrap().changed);

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(remaining(&state), 3);
        assert!(state.ticker_active().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticker_while_idle() {
        let state = app(5, 3);
        assert!(!state.ticker_active().unwrap());

        sleep(Duration::from_secs(3)).await;
        assert_eq!(remaining(&state), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_completion_stops_ticker() {
        let state = app(5, 3);
        state.start().unwrap();

        sleep(Duration::from_millis(5500)).await;
        let snap = state.get_snapshot().unwrap();
        assert_eq!(snap.phase, Phase::Break);
        assert_eq!(snap.state, RunState::Idle);
        assert_eq!(snap.remaining_seconds, 3);
        assert_eq!(snap.completed_sessions, 1);
        assert!(!state.ticker_active().unwrap());

        sleep(Duration::from_secs(4)).await;
        assert_eq!(remaining(&state), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_and_resume_continues() {
        let state = app(10, 3);
        state.start().unwrap();
        sleep(Duration::from_millis(1500)).await;

        let paused = state.pause().unwrap();
        assert!(paused.changed);
        assert_eq!(paused.snapshot.state, RunState::Paused);
        assert!(!state.ticker_active().unwrap());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(remaining(&state), 9);

        let resumed = state.pause().unwrap();
        assert_eq!(resumed.snapshot.state, RunState::Running);
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(remaining(&state), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_pause_cycles_keep_one_ticker() {
        let state = app(100, 3);
        state.start().unwrap();
        for _ in 0..10 {
            state.pause().unwrap();
            state.start().unwrap();
            state.start().unwrap();
        }
        assert_eq!(state.get_snapshot().unwrap().state, RunState::Running);

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(remaining(&state), 98);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticker_ids_are_ignored() {
        let state = app(10, 3);
        state.start().unwrap();
        state.pause().unwrap();
        state.pause().unwrap();

        assert_eq!(state.tick(1).unwrap(), TickOutcome::Ignored);
        assert_eq!(remaining(&state), 10);
        assert_eq!(
            state.tick(2).unwrap(),
            TickOutcome::Counted { remaining_seconds: 9 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_ticker_and_keeps_sessions() {
        let state = app(2, 5);
        state.start().unwrap();
        sleep(Duration::from_millis(2500)).await;
        state.start().unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(remaining(&state), 4);

        let reset = state.reset().unwrap();
        assert_eq!(reset.snapshot.phase, Phase::Focus);
        assert_eq!(reset.snapshot.remaining_seconds, 2);
        assert_eq!(reset.snapshot.state, RunState::Idle);
        assert_eq!(reset.snapshot.completed_sessions, 1);
        assert!(!state.ticker_active().unwrap());

        sleep(Duration::from_secs(3)).await;
        assert_eq!(remaining(&state), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_intents_report_unchanged() {
        let state = app(5, 3);
        assert!(!state.pause().unwrap().changed);
        assert!(state.start().unwrap().changed);
        assert!(!state.start().unwrap().changed);
        assert_eq!(state.get_last_action().0.as_deref(), Some("start"));
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_see_every_transition() {
        let state = app(5, 3);
        let mut rx = state.subscribe();
        assert_eq!(rx.borrow_and_update().state, RunState::Idle);

        state.start().unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, RunState::Running);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().remaining_seconds, 4);

        state.pause().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().paused);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_does_not_keep_state_alive() {
        let state = app(5, 3);
        state.start().unwrap();
        let weak = Arc::downgrade(&state);

        drop(state);
        assert!(weak.upgrade().is_none());
        sleep(Duration::from_secs(2)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_detaches_ticker() {
        let state = app(5, 3);
        state.start().unwrap();
        state.shutdown();
        assert!(!state.ticker_active().unwrap());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(remaining(&state), 5);
    }
}
