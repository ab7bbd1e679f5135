// ABOUTME: Live preview layer: anchors, layout estimation, scroll sync and error isolation
// ABOUTME: Depends on capability traits so any host editor and preview can be attached

pub mod anchor_index;
pub mod debounce;
pub mod error_boundary;
pub mod layout;
pub mod scroll_observer;
pub mod scroll_sync;
pub mod session;
pub mod sync;

pub use anchor_index::{AnchorIndex, recompute};
pub use debounce::{AnchorRefreshScheduler, Debouncer};
pub use error_boundary::{ErrorInfo, ErrorIsolationBoundary};
pub use layout::{BlockLayout, LayoutBox};
pub use scroll_observer::{ObserverStrategy, ScrollNotification, ScrollOffsetObserver};
pub use scroll_sync::{ScrollSynchronizer, SyncOutcome, first_visible_line};
pub use session::{LiveSession, SessionConfig};
pub use sync::SyncCoordinator;
