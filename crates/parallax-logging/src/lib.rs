// ABOUTME: Public API for Parallax logging infrastructure built on tracing
// ABOUTME: Provides centralized configuration and initialization for structured logging

pub mod config;
pub mod layers;
pub mod performance;
pub mod subscriber;

#[cfg(test)]
mod structured_tests;

// Re-export tracing macros for convenience
pub use tracing::{Level, Span, debug, error, info, instrument, span, trace, warn};

pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use performance::PerfTimer;
pub use subscriber::init_subscriber;

use anyhow::Result;

/// Initialize logging from file settings, then environment overrides, then
/// `-v` flags.
pub fn init_logging(mut config: LoggingConfig, verbosity: u8) -> Result<()> {
    config.apply_env_overrides()?;
    init_subscriber(config.with_verbosity(verbosity))
}
