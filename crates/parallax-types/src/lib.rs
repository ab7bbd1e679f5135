// ABOUTME: Pure data types with no cross-crate dependencies
// ABOUTME: Foundation layer for all other parallax crates

pub mod anchors;
pub mod config;
pub mod document;
pub mod editor_types;

// Re-export commonly used types
pub use anchors::AnchorTable;
pub use config::{AliasBinding, AnchorConfig, CompilerConfig, LayoutConfig, SyncConfig};
pub use document::{Document, ImportRecord, line_count};
pub use editor_types::{LineRange, RefreshTrigger, ScrollOrigin};
