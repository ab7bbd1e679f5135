// ABOUTME: Splits raw document text into a style payload and a content payload
// ABOUTME: Style blocks are replaced by their own newlines so line numbers never shift

use regex::Regex;
use std::sync::LazyLock;

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("style block pattern is valid")
});

/// Result of separating style blocks from document content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleExtraction {
    /// Concatenated style bodies, trimmed
    pub css: String,
    /// Raw text with every style block blanked to newlines
    pub content: String,
}

/// Extract every `<style>` block from `raw`.
///
/// Each block is replaced by exactly as many newlines as it spanned, which
/// keeps `line_count(content) == line_count(raw)`.
pub fn extract(raw: &str) -> StyleExtraction {
    let mut css = String::new();
    let mut content = String::with_capacity(raw.len());
    let mut last = 0;

    for captures in STYLE_BLOCK.captures_iter(raw) {
        let (Some(block), Some(body)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        css.push_str(body.as_str());
        css.push('\n');

        content.push_str(&raw[last..block.start()]);
        content.extend(std::iter::repeat_n('\n', newline_count(block.as_str())));
        last = block.end();
    }

    if last == 0 {
        return StyleExtraction {
            css: String::new(),
            content: raw.to_string(),
        };
    }

    content.push_str(&raw[last..]);
    StyleExtraction {
        css: css.trim().to_string(),
        content,
    }
}

pub(crate) fn newline_count(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}
