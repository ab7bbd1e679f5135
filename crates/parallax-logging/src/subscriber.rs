// ABOUTME: Global tracing subscriber installation
// ABOUTME: Stacks the environment filter under the configured output layers

use anyhow::{Context, Result};
use std::sync::OnceLock;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;

use crate::config::LoggingConfig;
use crate::layers::{create_env_filter, create_file_writer, output_layers};

/// Keeps the non-blocking file writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber described by `config`.
pub fn init_subscriber(config: LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config)?;
    let file_writer = open_file_writer(&config)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(output_layers(config.format, file_writer))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        filter = %config.filter_directives(),
        format = ?config.format,
        file = ?config.file,
        "Logging initialized"
    );
    Ok(())
}

fn open_file_writer(config: &LoggingConfig) -> Result<Option<NonBlocking>> {
    let Some(path) = &config.file else {
        return Ok(None);
    };

    let (writer, guard) = create_file_writer(path)?;
    // A second installation attempt fails in try_init; its guard is simply dropped
    let _ = FILE_GUARD.set(guard);
    Ok(Some(writer))
}
