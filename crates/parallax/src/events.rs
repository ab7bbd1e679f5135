// ABOUTME: Session event handling for the command line application
// ABOUTME: Logs every domain event and keeps them for the command's summary

use parallax_core::{AppEvent, EventAggregatorHandle, EventHandler};
use parallax_events::{
    document::Event as DocumentEvent, preview::Event as PreviewEvent, scroll::Event as ScrollEvent,
};
use parallax_logging::{debug, trace, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Events delivered to the command's handler, in dispatch order
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// An aggregator with a handler that logs into this log.
    pub fn bus(&self) -> EventAggregatorHandle {
        let bus = EventAggregatorHandle::default();
        bus.register_handler(LoggingHandler { log: self.clone() });
        bus
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().clone()
    }

    /// Messages of every render failure seen so far.
    pub fn render_failures(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                AppEvent::Preview(PreviewEvent::RenderFailed { message, .. }) => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: AppEvent) {
        self.events.lock().push(event);
    }
}

struct LoggingHandler {
    log: EventLog,
}

impl EventHandler for LoggingHandler {
    fn handle_document(&mut self, event: &DocumentEvent) {
        match event {
            DocumentEvent::CompileDiscarded {
                generation,
                current,
            } => debug!(generation, current, "Stale compilation discarded"),
            other => debug!(event = ?other, "Document event"),
        }
        self.log.push(AppEvent::Document(event.clone()));
    }

    fn handle_preview(&mut self, event: &PreviewEvent) {
        match event {
            PreviewEvent::RenderFailed { revision, message } => {
                warn!(revision, message = %message, "Preview shows a render error")
            }
            other => debug!(event = ?other, "Preview event"),
        }
        self.log.push(AppEvent::Preview(event.clone()));
    }

    fn handle_scroll(&mut self, event: &ScrollEvent) {
        trace!(event = ?event, "Scroll event");
        self.log.push(AppEvent::Scroll(event.clone()));
    }
}
