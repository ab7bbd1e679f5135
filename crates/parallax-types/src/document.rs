// ABOUTME: Document state for a live editing session
// ABOUTME: Raw text is the source of truth; style and content are derived views

use serde::{Deserialize, Serialize};

/// Count the lines of a text the way the editor widget does.
///
/// An empty text has no lines; otherwise every `\n` starts a new line, so a
/// trailing newline yields a final empty line.
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split('\n').count()
    }
}

/// A document being edited.
///
/// `style` and `content` are always re-derived together from `raw`; the
/// revision increases on every raw change and acts as the document identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    raw: String,
    style: String,
    content: String,
    revision: u64,
}

impl Document {
    /// Build a document from its raw text and the views derived from it
    pub fn from_parts(raw: String, style: String, content: String, revision: u64) -> Self {
        debug_assert_eq!(
            line_count(&raw),
            line_count(&content),
            "content must keep the line count of raw"
        );
        Self {
            raw,
            style,
            content,
            revision,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of lines in the raw text (and therefore in the content)
    pub fn line_count(&self) -> usize {
        line_count(&self.raw)
    }
}

/// One top-level import declaration found in the content before stripping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// The raw binding clause, e.g. `{ useState }` or `* as React`
    pub specifier: String,
    /// The module source string, e.g. `react`
    pub source: String,
}

impl ImportRecord {
    pub fn new(specifier: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("one"), 1);
        assert_eq!(line_count("one\ntwo"), 2);
        assert_eq!(line_count("one\n"), 2);
        assert_eq!(line_count("\n\n"), 3);
    }

    #[test]
    fn test_document_accessors() {
        let doc = Document::from_parts(
            "<style>p{}</style>\n# Title".to_string(),
            "p{}".to_string(),
            "\n# Title".to_string(),
            3,
        );
        assert_eq!(doc.style(), "p{}");
        assert_eq!(doc.content(), "\n# Title");
        assert_eq!(doc.revision(), 3);
        assert_eq!(doc.line_count(), 2);
    }

    #[test]
    fn test_default_document_is_empty() {
        let doc = Document::default();
        assert_eq!(doc.line_count(), 0);
        assert_eq!(doc.revision(), 0);
    }
}
