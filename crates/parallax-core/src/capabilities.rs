// ABOUTME: Capability traits for the editor widget, preview pane and rendered tree
// ABOUTME: Optional capabilities default to None so hosts implement only what they have

use parallax_types::LineRange;
use std::sync::Arc;

/// Text editor surface as seen by the scroll synchronizer.
///
/// Every query except `reveal_line_near_top` is optional. Hosts that cannot
/// answer return `None` and the synchronizer falls back to the next strategy.
pub trait EditorSurface {
    /// Visible line ranges, top-most first.
    fn visible_ranges(&self) -> Option<Vec<LineRange>> {
        None
    }

    /// Current vertical scroll offset in pixels.
    fn scroll_top(&self) -> Option<f32> {
        None
    }

    /// Pixel offset of the top of a 1-based line.
    fn top_for_line(&self, _line: usize) -> Option<f32> {
        None
    }

    /// Number of lines in the editor's text model.
    fn model_line_count(&self) -> Option<usize> {
        None
    }

    /// Scroll so that `line` (1-based) sits near the top of the viewport.
    fn reveal_line_near_top(&mut self, line: usize);
}

/// Preview pane surface.
pub trait PreviewSurface {
    fn scroll_top(&self) -> f32;

    /// Jump to `offset` without animation.
    fn scroll_to(&mut self, offset: f32);
}

/// A laid-out rendered tree that can report its line stamps.
pub trait RenderedSurface {
    /// `(stamp text, top offset)` for every stamped node, in document order.
    fn stamped_offsets(&self) -> Vec<(String, f32)>;
}

/// Something whose scroll offset can be polled.
pub trait ScrollOffsetSource: Send + Sync {
    fn scroll_top(&self) -> Option<f32>;
}

/// Callback invoked with the new scroll offset.
pub type ScrollCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Identifier of an active scroll subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Editors that can push scroll notifications instead of being polled.
pub trait ScrollEventSource: ScrollOffsetSource {
    /// Register `callback`. `None` means subscriptions are unavailable.
    fn subscribe_scroll(&self, _callback: ScrollCallback) -> Option<SubscriptionId> {
        None
    }

    fn unsubscribe_scroll(&self, _id: SubscriptionId) {}

    /// Whether subscriptions fire for every scroll, including programmatic ones.
    fn is_reliable(&self) -> bool {
        true
    }
}
