// ABOUTME: Core editor data types
// ABOUTME: Pure data structures for scroll origins, refresh triggers and line ranges

use serde::{Deserialize, Serialize};

/// Which side of the split view a scroll event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollOrigin {
    /// The source editor scrolled
    EditorOriginated,
    /// The rendered preview scrolled
    PreviewOriginated,
}

impl ScrollOrigin {
    /// The opposite side, i.e. the one this origin drives
    pub fn counterpart(self) -> Self {
        match self {
            ScrollOrigin::EditorOriginated => ScrollOrigin::PreviewOriginated,
            ScrollOrigin::PreviewOriginated => ScrollOrigin::EditorOriginated,
        }
    }
}

/// Reason the anchor table is being rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshTrigger {
    /// Document content changed
    ContentChanged,
    /// Viewport was resized
    Resize,
    /// The rendered tree changed underneath the preview
    Mutation,
}

/// An inclusive, 1-based range of editor lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl LineRange {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}
