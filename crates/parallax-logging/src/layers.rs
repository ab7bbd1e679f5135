// ABOUTME: Output layer construction for stderr and the optional log file
// ABOUTME: Layers are generic over the subscriber so they stack on any filter

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    registry::LookupSpan,
};

use crate::config::{LogFormat, LoggingConfig};

/// A type-erased output layer for subscriber `S`.
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Build the stderr layer plus a file layer when a writer is given.
///
/// Console output goes to stderr so that stdout stays free for command
/// output such as rendered HTML.
pub fn output_layers<S>(format: LogFormat, file_writer: Option<NonBlocking>) -> Vec<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let mut layers = vec![match format {
        LogFormat::Compact => console.compact().boxed(),
        LogFormat::Pretty => console.with_span_events(FmtSpan::CLOSE).pretty().boxed(),
        LogFormat::Json => console.json().with_file(true).with_line_number(true).boxed(),
    }];

    if let Some(writer) = file_writer {
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        );
    }

    layers
}

/// Open a non-blocking writer appending to `path`.
///
/// The returned guard flushes pending lines when dropped and must be kept
/// alive for as long as logging is active.
pub fn create_file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).with_context(|| {
        format!("Failed to create log directory: {}", directory.display())
    })?;

    let file_name = path
        .file_name()
        .context(format!("Log file path has no file name: {}", path.display()))?;

    let appender = rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Create an environment filter from the logging configuration.
pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = config.filter_directives();
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives '{directives}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use tempfile::tempdir;
    use tracing::Level;
    use tracing_subscriber::Registry;

    #[test]
    fn test_file_layer_only_with_writer() {
        let layers: Vec<BoxedLayer<Registry>> = output_layers(LogFormat::Json, None);
        assert_eq!(layers.len(), 1);

        let temp_dir = tempdir().unwrap();
        let (writer, _guard) = create_file_writer(&temp_dir.path().join("parallax.log")).unwrap();
        let layers: Vec<BoxedLayer<Registry>> = output_layers(LogFormat::Pretty, Some(writer));
        assert_eq!(layers.len(), 2);
    }

    #[test]
    fn test_create_file_writer_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let log_path = temp_dir.path().join("nested").join("parallax.log");

        assert!(create_file_writer(&log_path).is_ok());
        assert!(temp_dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_create_env_filter() {
        let mut config = LoggingConfig {
            level: LogLevel(Level::DEBUG),
            ..Default::default()
        };
        config
            .modules
            .insert("parallax_editor".to_string(), LogLevel(Level::TRACE));

        let rendered = create_env_filter(&config).unwrap().to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("parallax_editor=trace"));
    }
}
