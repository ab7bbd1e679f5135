// ABOUTME: Scroll sync events emitted by the synchronizer
// ABOUTME: Every event is tagged with the side whose scroll started it

use parallax_types::ScrollOrigin;
use serde::{Deserialize, Serialize};

/// Scroll synchronization events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A scroll on one side moved the other side
    Synced {
        origin: ScrollOrigin,
        line: usize,
        offset: f32,
    },

    /// A scroll was ignored because the other side had just caused it
    Suppressed { origin: ScrollOrigin },
}
