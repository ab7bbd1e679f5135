// ABOUTME: Origin-tagged suppression windows for bidirectional scroll sync
// ABOUTME: A side that drives the other mutes the echo for a short deadline-based window

use parallax_logging::trace;
use parallax_types::{ScrollOrigin, SyncConfig};
use std::time::Duration;
use tokio::time::Instant;

/// Decides whether a scroll event is an echo of one the other side caused.
///
/// When one side drives the other, events originating from the driven side
/// are suppressed until the window's deadline passes. Windows expire on
/// their own; nothing needs to reset them.
#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    window: Duration,
    editor_muted_until: Option<Instant>,
    preview_muted_until: Option<Instant>,
}

impl SyncCoordinator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            editor_muted_until: None,
            preview_muted_until: None,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.suppression_window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record that `origin` just scrolled the other side programmatically.
    pub fn drove(&mut self, origin: ScrollOrigin) {
        let deadline = Instant::now() + self.window;
        let muted = origin.counterpart();
        trace!(origin = ?origin, muted = ?muted, "Opening suppression window");
        *self.slot(muted) = Some(deadline);
    }

    /// Whether events from `origin` should be ignored right now.
    pub fn is_suppressed(&self, origin: ScrollOrigin) -> bool {
        let deadline = match origin {
            ScrollOrigin::EditorOriginated => self.editor_muted_until,
            ScrollOrigin::PreviewOriginated => self.preview_muted_until,
        };
        deadline.is_some_and(|deadline| Instant::now() < deadline)
    }

    /// Close both windows.
    pub fn clear(&mut self) {
        self.editor_muted_until = None;
        self.preview_muted_until = None;
    }

    fn slot(&mut self, origin: ScrollOrigin) -> &mut Option<Instant> {
        match origin {
            ScrollOrigin::EditorOriginated => &mut self.editor_muted_until,
            ScrollOrigin::PreviewOriginated => &mut self.preview_muted_until,
        }
    }
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
