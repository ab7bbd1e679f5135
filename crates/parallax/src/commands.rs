// ABOUTME: Operations behind the command line subcommands
// ABOUTME: Renders documents, reports anchor tables and checks documents for errors

use anyhow::{Context, Result};
use parallax_compiler::{CompileError, DocumentCompiler, RenderFailure, clean, extract};
use parallax_core::{AppEvent, EventAggregatorHandle};
use parallax_editor::LiveSession;
use parallax_logging::{debug, info};
use parallax_types::AnchorTable;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::ParallaxConfig;
use crate::events::EventLog;

/// A rendered preview and the session events that produced it
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub html: String,
    pub events: Vec<AppEvent>,
    /// Messages of render errors shown in place of the document
    pub render_failures: Vec<String>,
}

/// Start a session wired to `log` and compile `raw` in it.
async fn open_session(
    raw: &str,
    config: &ParallaxConfig,
    log: &EventLog,
) -> Result<(LiveSession, EventAggregatorHandle)> {
    let bus = log.bus();
    let mut session = LiveSession::new(config.session_config()).with_event_bus(Arc::new(bus.clone()));
    session
        .set_raw(raw)
        .await
        .context("Compilation task failed")?;
    Ok((session, bus))
}

/// Render `raw` to preview HTML, style block included.
pub async fn render(raw: &str, config: &ParallaxConfig) -> Result<RenderOutput> {
    let log = EventLog::new();
    let (mut session, bus) = open_session(raw, config, &log).await?;
    let html = session.preview_html();
    bus.process_events();
    Ok(RenderOutput {
        html,
        events: log.events(),
        render_failures: log.render_failures(),
    })
}

/// Lay out the rendered document and compute its anchor table.
pub async fn anchors(raw: &str, config: &ParallaxConfig) -> Result<AnchorTable> {
    let log = EventLog::new();
    let (mut session, bus) = open_session(raw, config, &log).await?;
    let table = session.refresh_with_layout(None).clone();
    bus.process_events();
    Ok(table)
}

/// One `line<TAB>offset` row per source line.
pub fn format_anchors(table: &AnchorTable) -> String {
    let mut out = String::new();
    for (index, offset) in table.iter().enumerate() {
        let _ = writeln!(out, "{}\t{}", index + 1, offset);
    }
    out
}

/// Problems found in a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckReport {
    pub compile: Option<CompileError>,
    pub render: Option<RenderFailure>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.compile.is_none() && self.render.is_none()
    }

    /// Human readable diagnostics, one per line.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(error) = &self.compile {
            lines.push(format!("error: {error}"));
        }
        if let Some(failure) = &self.render {
            lines.push(format!("render error: {}", failure.error));
            lines.extend(
                failure
                    .component_stack
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| format!("  {line}")),
            );
        }
        lines
    }
}

/// Compile and render `raw` without a session, collecting every failure.
///
/// Documents with unsupported imports are rejected before evaluation.
pub fn check(raw: &str, config: &ParallaxConfig) -> CheckReport {
    let content = extract(raw).content;
    let cleaned = clean(&content);
    let compiler = DocumentCompiler::new(config.compiler.clone());

    let component = match compiler.compile_now(&cleaned.cleaned, &cleaned.imports) {
        Ok(component) => component,
        Err(error) => {
            info!(error = %error, "Document failed to compile");
            return CheckReport {
                compile: Some(error),
                render: None,
            };
        }
    };

    match component.render_traced(&[]) {
        Ok(_) => {
            debug!("Document compiled and rendered");
            CheckReport::default()
        }
        Err(failure) => {
            info!(error = %failure.error, "Document failed to render");
            CheckReport {
                compile: None,
                render: Some(failure),
            }
        }
    }
}
