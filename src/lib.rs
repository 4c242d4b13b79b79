//! Focus Timer - A state-managed HTTP server hosting a Pomodoro timer
//! 
//! This library provides the focus/break countdown state machine, the shared
//! state that owns its one-second ticker, and the HTTP API that drives it.

pub mod config;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, FocusTimer, Phase, RunState, TimerConfig, TimerSnapshot};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
