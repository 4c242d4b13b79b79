//! Focus timer state machine
//!
//! A single countdown alternating between a Focus and a Break phase. The
//! machine owns no clock: the host calls `tick()` once per elapsed second
//! while the timer is running.
//!
//! ```text
//! Idle --start--> Running <--pause--> Paused
//!   ^                |                  |
//!   +--phase ends----+                  |
//!   +--reset (from any state)-----------+
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::format_clock;

/// Default Focus phase length (25 minutes)
pub const FOCUS_DURATION_SECS: u64 = 25 * 60;
/// Default Break phase length (5 minutes)
pub const BREAK_DURATION_SECS: u64 = 5 * 60;

/// Which interval of the cycle is counting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    /// The phase that follows this one
    pub fn other(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    /// Human readable label for display
    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus Time",
            Phase::Break => "Break Time",
        }
    }
}

/// Run state of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
        }
    }
}

/// Phase durations in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub focus_secs: u64,
    pub break_secs: u64,
}

impl TimerConfig {
    pub fn new(focus_secs: u64, break_secs: u64) -> Self {
        Self { focus_secs, break_secs }
    }

    pub fn phase_duration(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_secs,
            Phase::Break => self.break_secs,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new(FOCUS_DURATION_SECS, BREAK_DURATION_SECS)
    }
}

/// Result of a single `tick()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running, nothing changed
    Ignored,
    /// One second was counted off the current phase
    Counted { remaining_seconds: u64 },
    /// The phase ran out; the timer stopped on the next phase
    PhaseCompleted { completed: Phase, next: Phase },
}

/// Read-only copy of the timer for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub phase_label: String,
    pub state: RunState,
    pub running: bool,
    pub paused: bool,
    pub remaining_seconds: u64,
    /// `remaining_seconds` as `MM:SS`
    pub display: String,
    pub completed_sessions: u64,
}

/// The focus/break countdown
#[derive(Debug, Clone)]
pub struct FocusTimer {
    config: TimerConfig,
    phase: Phase,
    state: RunState,
    remaining_seconds: u64,
    completed_sessions: u64,
}

impl FocusTimer {
    /// Create an idle timer at the start of a Focus phase
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            phase: Phase::Focus,
            state: RunState::Idle,
            remaining_seconds: config.focus_secs,
            completed_sessions: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn completed_sessions(&self) -> u64 {
        self.completed_sessions
    }

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Begin or resume counting down the current phase.
    ///
    /// Returns `false` if the timer was already running.
    pub fn start(&mut self) -> bool {
        match self.state {
            RunState::Idle | RunState::Paused => {
                self.state = RunState::Running;
                true
            }
            RunState::Running => false,
        }
    }

    /// Toggle between running and paused.
    ///
    /// Returns `false` when idle, where pausing means nothing.
    pub fn pause(&mut self) -> bool {
        match self.state {
            RunState::Running => {
                self.state = RunState::Paused;
                true
            }
            RunState::Paused => {
                self.state = RunState::Running;
                true
            }
            RunState::Idle => false,
        }
    }

    /// Stop and return to a fresh Focus phase. Completed sessions are kept.
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.phase = Phase::Focus;
        self.remaining_seconds = self.config.focus_secs;
    }

    /// Count off one second of the running phase.
    ///
    /// A phase completes on the tick that brings it to zero, or on the next
    /// tick if it was already at zero; it never counts below zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != RunState::Running {
            return TickOutcome::Ignored;
        }

        if self.remaining_seconds == 0 {
            return self.complete_phase();
        }

        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            return self.complete_phase();
        }

        TickOutcome::Counted {
            remaining_seconds: self.remaining_seconds,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            state: self.state,
            running: self.state != RunState::Idle,
            paused: self.state == RunState::Paused,
            remaining_seconds: self.remaining_seconds,
            display: format_clock(self.remaining_seconds),
            completed_sessions: self.completed_sessions,
        }
    }

    fn complete_phase(&mut self) -> TickOutcome {
        let completed = self.phase;
        if completed == Phase::Focus {
            self.completed_sessions += 1;
        }
        self.phase = completed.other();
        self.remaining_seconds = self.config.phase_duration(self.phase);
        self.state = RunState::Idle;

        TickOutcome::PhaseCompleted {
            completed,
            next: self.phase,
        }
    }
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}
