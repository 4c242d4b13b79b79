//! State management module
//! 
//! This module contains the focus timer state machine and the shared
//! application state that hosts it.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, Transition};
pub use timer_state::{
    FocusTimer, Phase, RunState, TickOutcome, TimerConfig, TimerSnapshot,
    BREAK_DURATION_SECS, FOCUS_DURATION_SECS,
};
