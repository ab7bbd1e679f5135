// ABOUTME: Preview domain events for anchor rebuilding and render failures
// ABOUTME: Immutable fact-based events following Domain-Driven Design principles

use parallax_types::RefreshTrigger;
use serde::{Deserialize, Serialize};

/// Preview pane events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The anchor table was rebuilt from the rendered tree
    AnchorsRecomputed {
        trigger: Option<RefreshTrigger>,
        line_count: usize,
        anchored_lines: usize,
    },

    /// Rendering the compiled component failed and the fallback is shown
    RenderFailed { revision: u64, message: String },

    /// A held render error was cleared because the document changed
    BoundaryReset { revision: u64 },
}
