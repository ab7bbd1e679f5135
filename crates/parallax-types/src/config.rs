// ABOUTME: Configuration data types
// ABOUTME: Pure data structures for compiler, scroll sync, anchor and layout settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Designated framework source when none is configured
pub const DEFAULT_FRAMEWORK_SOURCE: &str = "react";

/// How `{ original as alias }` named imports are bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum AliasBinding {
    /// Bind the alias to the value named by the original (standard import semantics)
    #[default]
    Alias,
    /// Bind the original name and ignore the alias, matching the legacy in-browser editor
    Original,
}

/// Document compiler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// The only import source allowed in documents
    #[serde(default = "default_framework_source")]
    pub framework_source: String,

    /// Name of the document kind used in diagnostics
    #[serde(default = "default_document_label")]
    pub document_label: String,

    /// Binding rule for aliased named imports
    #[serde(default)]
    pub alias_binding: AliasBinding,

    /// Maximum nesting of component expansions during render
    #[serde(default = "default_max_render_depth")]
    pub max_render_depth: usize,
}

fn default_framework_source() -> String {
    DEFAULT_FRAMEWORK_SOURCE.to_string()
}

fn default_document_label() -> String {
    "MDX".to_string()
}

fn default_max_render_depth() -> usize {
    64
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            framework_source: default_framework_source(),
            document_label: default_document_label(),
            alias_binding: AliasBinding::default(),
            max_render_depth: default_max_render_depth(),
        }
    }
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.framework_source.trim().is_empty() {
            return Err("Framework source must not be empty".to_string());
        }
        if self.max_render_depth == 0 {
            return Err("Render depth must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Get a copy with invalid values replaced by defaults
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        if config.framework_source.trim().is_empty() {
            config.framework_source = default_framework_source();
        }
        if config.max_render_depth == 0 {
            config.max_render_depth = default_max_render_depth();
        }
        config
    }
}

/// Scroll synchronization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long a programmatic scroll suppresses the reciprocal handler
    #[serde(default = "default_suppression_window_ms")]
    pub suppression_window_ms: u64,

    /// Interval of the scroll offset poll used when the editor lacks reliable events
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_suppression_window_ms() -> u64 {
    250
}

fn default_poll_interval_ms() -> u64 {
    120
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            suppression_window_ms: default_suppression_window_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SyncConfig {
    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("Scroll poll interval must be greater than 0".to_string());
        }
        if self.suppression_window_ms > 5000 {
            return Err("Suppression window should not exceed 5 seconds".to_string());
        }
        Ok(())
    }

    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        if config.poll_interval_ms == 0 {
            config.poll_interval_ms = default_poll_interval_ms();
        }
        config.suppression_window_ms = config.suppression_window_ms.min(5000);
        config
    }
}

/// Anchor recomputation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Delay after a content change before anchors are rebuilt
    #[serde(default = "default_content_debounce_ms")]
    pub content_debounce_ms: u64,

    /// Delay after a rendered tree mutation before anchors are rebuilt
    #[serde(default = "default_mutation_debounce_ms")]
    pub mutation_debounce_ms: u64,
}

fn default_content_debounce_ms() -> u64 {
    120
}

fn default_mutation_debounce_ms() -> u64 {
    30
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            content_debounce_ms: default_content_debounce_ms(),
            mutation_debounce_ms: default_mutation_debounce_ms(),
        }
    }
}

impl AnchorConfig {
    pub fn content_debounce(&self) -> Duration {
        Duration::from_millis(self.content_debounce_ms)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }
}

/// Block layout estimation used when no real layout engine is attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Height of one line of body text in pixels
    #[serde(default = "default_line_height")]
    pub line_height: f32,

    /// Characters that fit on one line before wrapping
    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: usize,

    /// Vertical gap after paragraphs, headings and other blocks
    #[serde(default = "default_block_gap")]
    pub block_gap: f32,
}

fn default_line_height() -> f32 {
    24.0
}

fn default_chars_per_line() -> usize {
    80
}

fn default_block_gap() -> f32 {
    16.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_height: default_line_height(),
            chars_per_line: default_chars_per_line(),
            block_gap: default_block_gap(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.line_height <= 0.0 {
            return Err("Line height must be positive".to_string());
        }
        if self.chars_per_line == 0 {
            return Err("Characters per line must be greater than 0".to_string());
        }
        if self.block_gap < 0.0 {
            return Err("Block gap must not be negative".to_string());
        }
        Ok(())
    }

    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        if config.line_height <= 0.0 {
            config.line_height = default_line_height();
        }
        if config.chars_per_line == 0 {
            config.chars_per_line = default_chars_per_line();
        }
        if config.block_gap < 0.0 {
            config.block_gap = 0.0;
        }
        config
    }
}
