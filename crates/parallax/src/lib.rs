// ABOUTME: Library side of the parallax application
// ABOUTME: Exposes configuration loading and the subcommand operations for the binary and tests

pub mod commands;
pub mod config;
pub mod events;

pub use commands::{CheckReport, RenderOutput, anchors, check, format_anchors, render};
pub use config::{CONFIG_FILE_NAME, ConfigError, ParallaxConfig};
pub use events::EventLog;
