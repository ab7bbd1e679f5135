// ABOUTME: Event bus and handler traits for decoupled communication
// ABOUTME: Provides publish-subscribe pattern for cross-crate events

use crate::{
    document::Event as DocumentEvent, preview::Event as PreviewEvent, scroll::Event as ScrollEvent,
};

/// Event bus trait for dispatching domain events
pub trait EventBus {
    /// Dispatch a document event
    fn dispatch_document(&self, event: DocumentEvent);

    /// Dispatch a preview event
    fn dispatch_preview(&self, event: PreviewEvent);

    /// Dispatch a scroll event
    fn dispatch_scroll(&self, event: ScrollEvent);
}

/// Event handler trait for receiving domain events
pub trait EventHandler {
    /// Handle a document event
    fn handle_document(&mut self, _event: &DocumentEvent) {}

    /// Handle a preview event
    fn handle_preview(&mut self, _event: &PreviewEvent) {}

    /// Handle a scroll event
    fn handle_scroll(&mut self, _event: &ScrollEvent) {}
}
