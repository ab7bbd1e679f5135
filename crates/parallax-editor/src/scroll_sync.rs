// ABOUTME: Bidirectional scroll synchronization between the editor and the preview
// ABOUTME: Maps editor lines to preview offsets through the anchor table and back

use parallax_core::{EditorSurface, PreviewSurface};
use parallax_events::EventBus;
use parallax_events::scroll::Event as ScrollEvent;
use parallax_logging::{debug, trace};
use parallax_types::{AnchorTable, ScrollOrigin, SyncConfig};
use std::sync::Arc;

use crate::sync::SyncCoordinator;

/// What a scroll handler did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// The other side was scrolled
    Driven { line: usize, offset: f32 },
    /// The event was an echo of a scroll this side caused
    Suppressed,
    /// Nothing to map against yet
    Skipped,
}

/// Keeps the editor and the preview scrolled to the same source line
pub struct ScrollSynchronizer {
    coordinator: SyncCoordinator,
    anchors: AnchorTable,
    event_bus: Option<Arc<dyn EventBus + Send + Sync>>,
}

impl ScrollSynchronizer {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            coordinator: SyncCoordinator::from_config(config),
            anchors: AnchorTable::empty(),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus + Send + Sync>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn set_anchors(&mut self, anchors: AnchorTable) {
        self.anchors = anchors;
    }

    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// The editor scrolled: move the preview to the first visible line's anchor.
    pub fn on_editor_scroll(
        &mut self,
        editor: &dyn EditorSurface,
        preview: &mut dyn PreviewSurface,
    ) -> SyncOutcome {
        let origin = ScrollOrigin::EditorOriginated;
        if self.anchors.is_empty() {
            return SyncOutcome::Skipped;
        }
        if self.coordinator.is_suppressed(origin) {
            return self.suppressed(origin);
        }

        let line = first_visible_line(editor).clamp(1, self.anchors.len());
        let Some(offset) = self.anchors.offset_for_line(line) else {
            return SyncOutcome::Skipped;
        };

        self.coordinator.drove(origin);
        preview.scroll_to(offset);
        self.driven(origin, line, offset)
    }

    /// The preview scrolled: reveal the first line anchored at or below its top.
    pub fn on_preview_scroll(
        &mut self,
        editor: &mut dyn EditorSurface,
        preview: &dyn PreviewSurface,
    ) -> SyncOutcome {
        let origin = ScrollOrigin::PreviewOriginated;
        if self.coordinator.is_suppressed(origin) {
            return self.suppressed(origin);
        }
        let scroll_top = preview.scroll_top();
        let Some(index) = self.anchors.index_at_or_after(scroll_top) else {
            return SyncOutcome::Skipped;
        };

        let line = (index + 1).clamp(1, self.anchors.len());
        self.coordinator.drove(origin);
        editor.reveal_line_near_top(line);
        self.driven(origin, line, scroll_top)
    }

    fn suppressed(&self, origin: ScrollOrigin) -> SyncOutcome {
        trace!(origin = ?origin, "Scroll suppressed");
        if let Some(bus) = &self.event_bus {
            bus.dispatch_scroll(ScrollEvent::Suppressed { origin });
        }
        SyncOutcome::Suppressed
    }

    fn driven(&self, origin: ScrollOrigin, line: usize, offset: f32) -> SyncOutcome {
        debug!(origin = ?origin, line, offset, "Scroll synced");
        if let Some(bus) = &self.event_bus {
            bus.dispatch_scroll(ScrollEvent::Synced {
                origin,
                line,
                offset,
            });
        }
        SyncOutcome::Driven { line, offset }
    }
}

/// First visible line of the editor, 1-based.
///
/// Uses the visible ranges when the editor reports them, otherwise searches
/// for the lowest line whose top is at or below the scroll offset. Falls
/// back to line 1.
pub fn first_visible_line(editor: &dyn EditorSurface) -> usize {
    if let Some(range) = editor.visible_ranges().and_then(|ranges| ranges.into_iter().next())
        && range.start_line > 0
    {
        return range.start_line;
    }

    let (Some(scroll_top), Some(total)) = (editor.scroll_top(), editor.model_line_count()) else {
        return 1;
    };

    let (mut lo, mut hi, mut found) = (1usize, total, 1usize);
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let Some(top) = editor.top_for_line(mid) else {
            return 1;
        };
        if top < scroll_top {
            lo = mid + 1;
        } else {
            found = mid;
            hi = mid - 1;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_types::LineRange;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeEditor {
        ranges: Option<Vec<LineRange>>,
        scroll_top: Option<f32>,
        line_height: Option<f32>,
        lines: usize,
        revealed: Vec<usize>,
    }

    impl EditorSurface for FakeEditor {
        fn visible_ranges(&self) -> Option<Vec<LineRange>> {
            self.ranges.clone()
        }
        fn scroll_top(&self) -> Option<f32> {
            self.scroll_top
        }
        fn top_for_line(&self, line: usize) -> Option<f32> {
            self.line_height.map(|h| (line - 1) as f32 * h)
        }
        fn model_line_count(&self) -> Option<usize> {
            Some(self.lines)
        }
        fn reveal_line_near_top(&mut self, line: usize) {
            self.revealed.push(line);
        }
    }

    #[derive(Default)]
    struct FakePreview {
        top: f32,
        jumps: Vec<f32>,
    }

    impl PreviewSurface for FakePreview {
        fn scroll_top(&self) -> f32 {
            self.top
        }
        fn scroll_to(&mut self, offset: f32) {
            self.top = offset;
            self.jumps.push(offset);
        }
    }

    fn anchors() -> AnchorTable {
        let mut offsets = vec![0.0; 49];
        offsets.extend(std::iter::repeat_n(2000.0, 31));
        AnchorTable::from_offsets(offsets)
    }

    fn synchronizer() -> ScrollSynchronizer {
        let mut sync = ScrollSynchronizer::new(&SyncConfig::default());
        sync.set_anchors(anchors());
        sync
    }

    #[tokio::test(start_paused = true)]
    async fn test_editor_drives_preview_via_visible_range() {
        let mut sync = synchronizer();
        let editor = FakeEditor {
            ranges: Some(vec![LineRange::new(50, 70)]),
            ..Default::default()
        };
        let mut preview = FakePreview::default();

        let outcome = sync.on_editor_scroll(&editor, &mut preview);
        assert_eq!(
            outcome,
            SyncOutcome::Driven {
                line: 50,
                offset: 2000.0
            }
        );
        assert_eq!(preview.jumps, vec![2000.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_is_suppressed_then_released() {
        let mut sync = synchronizer();
        let mut editor = FakeEditor {
            ranges: Some(vec![LineRange::new(50, 70)]),
            ..Default::default()
        };
        let mut preview = FakePreview::default();

        sync.on_editor_scroll(&editor, &mut preview);
        assert_eq!(
            sync.on_preview_scroll(&mut editor, &preview),
            SyncOutcome::Suppressed
        );
        assert!(editor.revealed.is_empty());

        tokio::time::advance(Duration::from_millis(250)).await;
        assert!(matches!(
            sync.on_preview_scroll(&mut editor, &preview),
            SyncOutcome::Driven { line: 50, .. }
        ));
        assert_eq!(editor.revealed, vec![50]);
        assert_eq!(
            sync.on_editor_scroll(&editor, &mut preview),
            SyncOutcome::Suppressed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_preview_past_last_anchor_uses_last_line() {
        let mut sync = synchronizer();
        let mut editor = FakeEditor::default();
        let preview = FakePreview {
            top: 9000.0,
            ..Default::default()
        };
        sync.on_preview_scroll(&mut editor, &preview);
        assert_eq!(editor.revealed, vec![80]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_table_skips() {
        let mut sync = ScrollSynchronizer::new(&SyncConfig::default());
        let mut editor = FakeEditor::default();
        let mut preview = FakePreview::default();
        assert_eq!(sync.on_editor_scroll(&editor, &mut preview), SyncOutcome::Skipped);
        assert_eq!(sync.on_preview_scroll(&mut editor, &preview), SyncOutcome::Skipped);
        assert!(preview.jumps.is_empty());
    }

    #[test]
    fn test_first_visible_line_binary_search() {
        let editor = FakeEditor {
            scroll_top: Some(190.0),
            line_height: Some(20.0),
            lines: 100,
            ..Default::default()
        };
        // line 10 starts at 180, line 11 at 200
        assert_eq!(first_visible_line(&editor), 11);
    }

    #[test]
    fn test_first_visible_line_defaults_to_one() {
        let editor = FakeEditor {
            scroll_top: Some(190.0),
            lines: 100,
            ..Default::default()
        };
        assert_eq!(first_visible_line(&editor), 1);
        assert_eq!(first_visible_line(&FakeEditor::default()), 1);
    }
}
