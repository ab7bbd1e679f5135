// ABOUTME: Cross-crate event definitions for decoupled communication
// ABOUTME: Bounded contexts for document compilation, preview rendering and scroll sync

pub mod document;
pub mod event_bus;
pub mod preview;
pub mod scroll;

pub use event_bus::{EventBus, EventHandler};
