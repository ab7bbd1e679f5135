// ABOUTME: Document domain events for content changes and compilation results
// ABOUTME: Immutable fact-based events following Domain-Driven Design principles

use serde::{Deserialize, Serialize};

/// Document domain events - covers edits and the compile pipeline.
/// All events are immutable facts about what has happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Raw text changed and the style/content views were re-derived
    ContentChanged {
        revision: u64,
        line_count: usize,
        style_changed: bool,
    },

    /// A compilation was requested for the current content
    CompileRequested { generation: u64 },

    /// A compilation finished and its result became visible
    Compiled {
        generation: u64,
        status: CompileStatus,
    },

    /// A compilation finished after a newer one was requested and was dropped
    CompileDiscarded { generation: u64, current: u64 },
}

/// Outcome class of a committed compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompileStatus {
    /// Produced a renderable component
    Succeeded,
    /// Rejected because of imports from an unsupported source
    UnsupportedImports,
    /// Parsing or evaluating the content failed
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_event_creation() {
        let event = Event::Compiled {
            generation: 4,
            status: CompileStatus::UnsupportedImports,
        };

        match event {
            Event::Compiled { generation, status } => {
                assert_eq!(generation, 4);
                assert_eq!(status, CompileStatus::UnsupportedImports);
            }
            _ => panic!("Expected Compiled event"),
        }
    }
}
