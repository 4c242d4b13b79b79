//! Configuration and CLI argument handling

use clap::Parser;

use crate::state::{TimerConfig, BREAK_DURATION_SECS, FOCUS_DURATION_SECS};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focus-timer")]
#[command(about = "A state-managed HTTP server hosting a Pomodoro focus timer")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Focus phase duration in seconds
    #[arg(short, long, default_value_t = FOCUS_DURATION_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub focus_secs: u64,

    /// Break phase duration in seconds
    #[arg(short, long, default_value_t = BREAK_DURATION_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub break_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Phase durations for the hosted timer
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::new(self.focus_secs, self.break_secs)
    }
}
