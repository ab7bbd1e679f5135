// ABOUTME: One live editing session wiring the document, compiler, preview and scroll sync
// ABOUTME: Raw edits re-derive style and content, recompile, and schedule anchor refreshes

use parallax_compiler::{CommitResult, CompileService, DomNode, extract};
use parallax_core::{EditorSurface, PreviewSurface, RenderedSurface};
use parallax_events::EventBus;
use parallax_events::document::Event as DocumentEvent;
use parallax_logging::{debug, info};
use parallax_types::{
    AnchorConfig, AnchorTable, CompilerConfig, Document, LayoutConfig, RefreshTrigger, SyncConfig,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::anchor_index::AnchorIndex;
use crate::debounce::AnchorRefreshScheduler;
use crate::error_boundary::ErrorIsolationBoundary;
use crate::layout::BlockLayout;
use crate::scroll_sync::{ScrollSynchronizer, SyncOutcome};

/// Settings for every part of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    pub compiler: CompilerConfig,
    pub sync: SyncConfig,
    pub anchors: AnchorConfig,
    pub layout: LayoutConfig,
}

/// A document being edited with its live preview.
///
/// Must be created inside a tokio runtime.
pub struct LiveSession {
    config: SessionConfig,
    document: Document,
    compiler: CompileService,
    boundary: ErrorIsolationBoundary,
    anchors: AnchorIndex,
    synchronizer: ScrollSynchronizer,
    scheduler: AnchorRefreshScheduler,
    refresh_rx: mpsc::UnboundedReceiver<RefreshTrigger>,
    rendered: Option<DomNode>,
    event_bus: Option<Arc<dyn EventBus + Send + Sync>>,
}

impl LiveSession {
    pub fn new(config: SessionConfig) -> Self {
        let (scheduler, refresh_rx) = AnchorRefreshScheduler::new(&config.anchors);
        Self {
            compiler: CompileService::new(config.compiler.clone()),
            boundary: ErrorIsolationBoundary::new(),
            anchors: AnchorIndex::new(),
            synchronizer: ScrollSynchronizer::new(&config.sync),
            document: Document::default(),
            scheduler,
            refresh_rx,
            rendered: None,
            event_bus: None,
            config,
        }
    }

    /// Route events from every part of the session to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus + Send + Sync>) -> Self {
        self.compiler = self.compiler.with_event_bus(bus.clone());
        self.boundary = self.boundary.with_event_bus(bus.clone());
        self.synchronizer = self.synchronizer.with_event_bus(bus.clone());
        self.event_bus = Some(bus);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn anchors(&self) -> &AnchorTable {
        self.anchors.table()
    }

    pub fn compiler(&self) -> &CompileService {
        &self.compiler
    }

    pub fn boundary(&self) -> &ErrorIsolationBoundary {
        &self.boundary
    }

    /// Replace the raw text. Returns the handle of the compilation it started.
    pub fn set_raw(&mut self, raw: impl Into<String>) -> JoinHandle<CommitResult> {
        let raw = raw.into();
        let extraction = extract(&raw);
        let revision = self.document.revision() + 1;
        let style_changed = extraction.css != self.document.style();

        self.document = Document::from_parts(raw, extraction.css, extraction.content, revision);
        let line_count = self.document.line_count();
        info!(revision, line_count, style_changed, "Document changed");
        self.dispatch(DocumentEvent::ContentChanged {
            revision,
            line_count,
            style_changed,
        });

        self.scheduler.content_changed();
        self.compiler.request(self.document.content(), revision)
    }

    /// Render the latest compilation under the error boundary.
    ///
    /// The boundary is keyed by the revision of the committed compilation,
    /// so a held error clears only once a newer compile lands. A rendered
    /// tree that differs from the previous one schedules a mutation refresh
    /// of the anchors.
    pub fn render(&mut self) -> DomNode {
        let state = self.compiler.current();
        let node = self.boundary.render(&state.outcome, state.revision);
        if self.rendered.as_ref() != Some(&node) {
            debug!(revision = state.revision, "Rendered tree changed");
            self.scheduler.tree_mutated();
            self.rendered = Some(node.clone());
        }
        node
    }

    /// Rendered HTML including the document's style block.
    pub fn preview_html(&mut self) -> String {
        let body = self.render().to_html();
        let style = self.document.style();
        if style.is_empty() {
            body
        } else {
            format!("<style>{style}</style>{body}")
        }
    }

    /// The window was resized.
    pub fn resized(&self) {
        self.scheduler.resized();
    }

    /// Wait for the next scheduled anchor refresh.
    pub async fn next_refresh(&mut self) -> Option<RefreshTrigger> {
        self.refresh_rx.recv().await
    }

    /// Rebuild anchors from a laid-out rendered tree.
    pub fn refresh_anchors(
        &mut self,
        surface: &impl RenderedSurface,
        trigger: Option<RefreshTrigger>,
    ) -> &AnchorTable {
        let event = self
            .anchors
            .refresh(surface, self.document.line_count(), trigger);
        self.synchronizer.set_anchors(self.anchors.table().clone());
        if let Some(bus) = &self.event_bus {
            bus.dispatch_preview(event);
        }
        self.anchors.table()
    }

    /// Render, lay out with the block estimator and rebuild anchors.
    pub fn refresh_with_layout(&mut self, trigger: Option<RefreshTrigger>) -> &AnchorTable {
        let node = self.render();
        let layout = BlockLayout::compute(&node, &self.config.layout);
        self.refresh_anchors(&layout, trigger)
    }

    pub fn on_editor_scroll(
        &mut self,
        editor: &dyn EditorSurface,
        preview: &mut dyn PreviewSurface,
    ) -> SyncOutcome {
        self.synchronizer.on_editor_scroll(editor, preview)
    }

    pub fn on_preview_scroll(
        &mut self,
        editor: &mut dyn EditorSurface,
        preview: &dyn PreviewSurface,
    ) -> SyncOutcome {
        self.synchronizer.on_preview_scroll(editor, preview)
    }

    fn dispatch(&self, event: DocumentEvent) {
        if let Some(bus) = &self.event_bus {
            bus.dispatch_document(event);
        }
    }
}
