// ABOUTME: Render-time guard that swaps failing renders for a fallback view
// ABOUTME: Catches render errors and panics and clears them when the document changes

use parallax_compiler::{CompileOutcome, DomNode, RenderError, RenderFailure};
use parallax_events::EventBus;
use parallax_events::preview::Event as PreviewEvent;
use parallax_logging::{debug, warn};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

const FALLBACK_STYLE: &str = "padding:12px;color:#900;background:#fff6f6;border-radius:6px";
const MESSAGE_STYLE: &str = "white-space:pre-wrap;margin-top:8px;font-family:monospace";

/// Where a render failure happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub component_stack: String,
    pub revision: u64,
}

/// Shows a fallback instead of a failing render until the reset key changes
#[derive(Default)]
pub struct ErrorIsolationBoundary {
    error: Option<RenderError>,
    info: Option<ErrorInfo>,
    reset_key: Option<u64>,
    event_bus: Option<Arc<dyn EventBus + Send + Sync>>,
}

impl ErrorIsolationBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus + Send + Sync>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn error(&self) -> Option<&RenderError> {
        self.error.as_ref()
    }

    pub fn info(&self) -> Option<&ErrorInfo> {
        self.info.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Render a compile outcome under this boundary.
    pub fn render(&mut self, outcome: &CompileOutcome, reset_key: u64) -> DomNode {
        self.render_with(|| outcome.render(), reset_key)
    }

    /// Run `render` unless an error is already held for this reset key.
    pub fn render_with<F>(&mut self, render: F, reset_key: u64) -> DomNode
    where
        F: FnOnce() -> Result<DomNode, RenderFailure>,
    {
        if self.reset_key != Some(reset_key) {
            if self.error.is_some() {
                debug!(revision = reset_key, "Clearing render error after document change");
                self.error = None;
                self.info = None;
                self.dispatch(PreviewEvent::BoundaryReset {
                    revision: reset_key,
                });
            }
            self.reset_key = Some(reset_key);
        }

        if let Some(error) = &self.error {
            return fallback(error);
        }

        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(node)) => node,
            Ok(Err(failure)) => self.fail(failure.error, failure.component_stack, reset_key),
            Err(payload) => self.fail(
                RenderError::Panicked(panic_message(payload.as_ref())),
                String::new(),
                reset_key,
            ),
        }
    }

    fn fail(&mut self, error: RenderError, component_stack: String, revision: u64) -> DomNode {
        warn!(
            error = %error,
            component_stack = %component_stack,
            revision,
            "Render failed"
        );
        self.dispatch(PreviewEvent::RenderFailed {
            revision,
            message: error.to_string(),
        });
        let node = fallback(&error);
        self.error = Some(error);
        self.info = Some(ErrorInfo {
            component_stack,
            revision,
        });
        node
    }

    fn dispatch(&self, event: PreviewEvent) {
        if let Some(bus) = &self.event_bus {
            bus.dispatch_preview(event);
        }
    }
}

/// The view shown in place of a failed render.
pub fn fallback(error: &RenderError) -> DomNode {
    DomNode::element(
        "div",
        vec![("style".to_string(), FALLBACK_STYLE.to_string())],
        vec![
            DomNode::element("strong", Vec::new(), vec![DomNode::text("Render error:")]),
            DomNode::element(
                "div",
                vec![("style".to_string(), MESSAGE_STYLE.to_string())],
                vec![DomNode::text(error.to_string())],
            ),
        ],
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Render panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_compiler::DocumentCompiler;
    use std::sync::Arc;

    fn compiled(src: &str) -> CompileOutcome {
        DocumentCompiler::outcome(DocumentCompiler::default().compile_now(src, &[]))
    }

    fn ok() -> Result<DomNode, RenderFailure> {
        Ok(DomNode::text("fine"))
    }

    #[test]
    fn test_passes_through_successful_render() {
        let mut boundary = ErrorIsolationBoundary::new();
        let node = boundary.render(&compiled("# Hi"), 1);
        assert_eq!(node.to_html(), "<h1 data-source-line=\"1\">Hi</h1>");
        assert!(!boundary.has_error());
    }

    #[test]
    fn test_render_error_shows_fallback() {
        let mut boundary = ErrorIsolationBoundary::new();
        let node = boundary.render(&compiled("<Missing />"), 1);
        let html = node.to_html();
        assert!(html.starts_with(
            "<div style=\"padding:12px;color:#900;background:#fff6f6;border-radius:6px\"><strong>Render error:</strong>"
        ));
        assert!(html.contains("Expected component `Missing` to be defined"));
        assert_eq!(boundary.info().unwrap().revision, 1);
        assert_eq!(boundary.info().unwrap().component_stack, "\n    in MDXContent");
    }

    #[test]
    fn test_error_is_held_until_reset_key_changes() {
        let mut boundary = ErrorIsolationBoundary::new();
        boundary.render(&compiled("{nope}"), 1);
        assert!(boundary.has_error());

        // Same key: the successful render is not attempted
        let held = boundary.render_with(ok, 1);
        assert_eq!(held.tag(), Some("div"));

        let fresh = boundary.render_with(ok, 2);
        assert_eq!(fresh, DomNode::text("fine"));
        assert!(boundary.error().is_none());
        assert!(boundary.info().is_none());
    }

    #[test]
    fn test_panics_are_caught() {
        let mut boundary = ErrorIsolationBoundary::new();
        let node = boundary.render_with(|| panic!("layout exploded"), 3);
        assert_eq!(
            boundary.error(),
            Some(&RenderError::Panicked("layout exploded".to_string()))
        );
        assert!(node.text_content().contains("layout exploded"));
    }

    #[test]
    fn test_reset_dispatches_event() {
        let bus = Arc::new(parallax_core::EventAggregatorHandle::default());
        let mut boundary = ErrorIsolationBoundary::new().with_event_bus(bus.clone());
        boundary.render(&compiled("{nope}"), 1);
        boundary.render_with(ok, 2);
        assert_eq!(bus.queued_count(), 2);
    }
}
