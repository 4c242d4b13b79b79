//! One-second ticker driving the focus timer

use std::{sync::Weak, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{AppState, TickOutcome};

/// Period between two timer ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that ticks the timer once per second while it runs.
///
/// Holds only a weak reference so the state can be dropped under it. The
/// task ends on its own when the phase completes or the state is gone; pause
/// and reset abort it through the handle kept in `AppState`.
pub async fn ticker_task(state: Weak<AppState>, ticker_id: u64) {
    debug!("Ticker #{} started", ticker_id);

    let mut interval = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        interval.tick().await;

        let Some(state) = state.upgrade() else {
            debug!("Timer state dropped, ticker #{} exiting", ticker_id);
            return;
        };

        match state.tick(ticker_id) {
            Ok(TickOutcome::Counted { remaining_seconds }) => {
                debug!("Tick: {}s remaining", remaining_seconds);
            }
            Ok(TickOutcome::PhaseCompleted { completed, next }) => {
                info!("{:?} phase completed, next phase {:?} waits for start", completed, next);
                return;
            }
            Ok(TickOutcome::Ignored) => {
                debug!("Ticker #{} superseded or timer stopped, exiting", ticker_id);
                return;
            }
            Err(e) => {
                error!("Failed to tick timer: {}", e);
                return;
            }
        }
    }
}
