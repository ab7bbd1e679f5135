// ABOUTME: Event aggregator that queues domain events and dispatches them to handlers
// ABOUTME: Implements the event bus so compiler and editor layers stay decoupled from hosts

use parallax_events::{
    EventBus, EventHandler, document::Event as DocumentEvent, preview::Event as PreviewEvent,
    scroll::Event as ScrollEvent,
};
use parallax_logging::trace;
use parking_lot::Mutex;
use std::sync::Arc;

/// App-level event wrapper for the event aggregator
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Document(DocumentEvent),
    Preview(PreviewEvent),
    Scroll(ScrollEvent),
}

/// Event aggregator that collects events and dispatches them in order
pub struct EventAggregator {
    handlers: Mutex<Vec<Box<dyn EventHandler + Send>>>,
    event_queue: Mutex<Vec<AppEvent>>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            event_queue: Mutex::new(Vec::new()),
        }
    }

    pub fn register_handler<H>(&self, handler: H)
    where
        H: EventHandler + Send + 'static,
    {
        self.handlers.lock().push(Box::new(handler));
    }

    /// Deliver every queued event to every handler, oldest first.
    pub fn process_events(&self) {
        let events = std::mem::take(&mut *self.event_queue.lock());
        if events.is_empty() {
            return;
        }
        trace!(count = events.len(), "Processing queued events");

        let mut handlers = self.handlers.lock();
        for event in &events {
            for handler in handlers.iter_mut() {
                match event {
                    AppEvent::Document(e) => handler.handle_document(e),
                    AppEvent::Preview(e) => handler.handle_preview(e),
                    AppEvent::Scroll(e) => handler.handle_scroll(e),
                }
            }
        }
    }

    pub fn queue_event(&self, event: AppEvent) {
        self.event_queue.lock().push(event);
    }

    pub fn queued_count(&self) -> usize {
        self.event_queue.lock().len()
    }
}

impl EventBus for EventAggregator {
    fn dispatch_document(&self, event: DocumentEvent) {
        self.queue_event(AppEvent::Document(event));
    }

    fn dispatch_preview(&self, event: PreviewEvent) {
        self.queue_event(AppEvent::Preview(event));
    }

    fn dispatch_scroll(&self, event: ScrollEvent) {
        self.queue_event(AppEvent::Scroll(event));
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable handle to a shared event aggregator
#[derive(Clone, Default)]
pub struct EventAggregatorHandle {
    inner: Arc<EventAggregator>,
}

impl EventAggregatorHandle {
    pub fn new(aggregator: EventAggregator) -> Self {
        Self {
            inner: Arc::new(aggregator),
        }
    }

    pub fn register_handler<H>(&self, handler: H)
    where
        H: EventHandler + Send + 'static,
    {
        self.inner.register_handler(handler);
    }

    pub fn process_events(&self) {
        self.inner.process_events();
    }

    pub fn queued_count(&self) -> usize {
        self.inner.queued_count()
    }
}

impl EventBus for EventAggregatorHandle {
    fn dispatch_document(&self, event: DocumentEvent) {
        self.inner.dispatch_document(event);
    }

    fn dispatch_preview(&self, event: PreviewEvent) {
        self.inner.dispatch_preview(event);
    }

    fn dispatch_scroll(&self, event: ScrollEvent) {
        self.inner.dispatch_scroll(event);
    }
}
