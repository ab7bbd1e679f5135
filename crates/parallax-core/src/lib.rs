// ABOUTME: Capability traits for editor and preview surfaces plus event aggregation
// ABOUTME: Lets the editor layer drive any host UI without depending on it

pub mod capabilities;
pub mod event_aggregator;

pub use capabilities::{
    EditorSurface, PreviewSurface, RenderedSurface, ScrollCallback, ScrollEventSource,
    ScrollOffsetSource, SubscriptionId,
};
pub use event_aggregator::{AppEvent, EventAggregator, EventAggregatorHandle};

// Re-export the event layer so hosts need a single dependency
pub use parallax_events::{EventBus, EventHandler};
