// ABOUTME: Deterministic block layout estimator for rendered documents
// ABOUTME: Assigns vertical offsets to rendered nodes when no real layout engine is attached

use parallax_compiler::{DomNode, SOURCE_LINE_ATTRIBUTE};
use parallax_core::RenderedSurface;
use parallax_types::LayoutConfig;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "ul",
];

/// Blocks followed by the configured gap
const SPACED_TAGS: &[&str] = &[
    "blockquote", "dl", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "ol", "p", "pre",
    "table", "ul",
];

/// Lines of height an image occupies
const IMAGE_LINES: f32 = 8.0;

/// One laid-out element
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub tag: String,
    /// Value of the source line attribute, if stamped
    pub stamp: Option<String>,
    pub top: f32,
    pub height: f32,
}

/// Vertical layout of a rendered tree
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    config: LayoutConfig,
    boxes: Vec<LayoutBox>,
    height: f32,
}

impl BlockLayout {
    pub fn compute(root: &DomNode, config: &LayoutConfig) -> Self {
        let mut layout = Self {
            config: config.sanitized(),
            boxes: Vec::new(),
            height: 0.0,
        };
        layout.height = layout.flow(std::slice::from_ref(root), 0.0, 1.0);
        layout
    }

    /// Boxes in document order.
    pub fn boxes(&self) -> &[LayoutBox] {
        &self.boxes
    }

    /// Total height of the laid-out document.
    pub fn height(&self) -> f32 {
        self.height
    }

    fn flow(&mut self, children: &[DomNode], mut y: f32, scale: f32) -> f32 {
        let mut run: Vec<&DomNode> = Vec::new();
        for child in children {
            if is_block(child) {
                y = self.inline_run(&run, y, scale);
                run.clear();
                y = self.block(child, y, scale);
            } else {
                run.push(child);
            }
        }
        self.inline_run(&run, y, scale)
    }

    fn block(&mut self, node: &DomNode, y: f32, scale: f32) -> f32 {
        let DomNode::Element { tag, children, .. } = node else {
            return self.flow(node.children(), y, scale);
        };

        let index = self.boxes.len();
        self.boxes.push(LayoutBox {
            tag: tag.clone(),
            stamp: node.attribute(SOURCE_LINE_ATTRIBUTE).map(str::to_string),
            top: y,
            height: 0.0,
        });

        let line_height = self.config.line_height * scale;
        let mut end = match tag.as_str() {
            "pre" => {
                let text = node.text_content();
                let lines = text.trim_end_matches('\n').split('\n').count();
                y + lines as f32 * line_height
            }
            "hr" => y + 1.0,
            _ => self.flow(children, y, heading_scale(tag).unwrap_or(scale)),
        };
        if SPACED_TAGS.contains(&tag.as_str()) {
            end += self.config.block_gap;
        }

        self.boxes[index].height = end - y;
        end
    }

    fn inline_run(&mut self, run: &[&DomNode], y: f32, scale: f32) -> f32 {
        if run.is_empty() {
            return y;
        }

        let mut text = String::new();
        let mut images = 0usize;
        for node in run {
            self.collect_inline(node, y, &mut text, &mut images);
        }

        let chars = text.split_whitespace().collect::<Vec<_>>().join(" ").chars().count();
        let lines = chars.div_ceil(self.config.chars_per_line);
        let line_height = self.config.line_height * scale;
        y + lines as f32 * line_height + images as f32 * IMAGE_LINES * self.config.line_height
    }

    fn collect_inline(&mut self, node: &DomNode, y: f32, text: &mut String, images: &mut usize) {
        match node {
            DomNode::Text(value) => text.push_str(value),
            DomNode::Fragment(children) => {
                for child in children {
                    self.collect_inline(child, y, text, images);
                }
            }
            DomNode::Element { tag, children, .. } => {
                if let Some(stamp) = node.attribute(SOURCE_LINE_ATTRIBUTE) {
                    self.boxes.push(LayoutBox {
                        tag: tag.clone(),
                        stamp: Some(stamp.to_string()),
                        top: y,
                        height: self.config.line_height,
                    });
                }
                if tag == "img" {
                    *images += 1;
                }
                for child in children {
                    self.collect_inline(child, y, text, images);
                }
            }
        }
    }
}

impl RenderedSurface for BlockLayout {
    fn stamped_offsets(&self) -> Vec<(String, f32)> {
        self.boxes
            .iter()
            .filter_map(|b| b.stamp.as_ref().map(|stamp| (stamp.clone(), b.top)))
            .collect()
    }
}

fn is_block(node: &DomNode) -> bool {
    match node {
        DomNode::Element { tag, .. } => BLOCK_TAGS.contains(&tag.as_str()),
        DomNode::Fragment(_) => true,
        DomNode::Text(_) => false,
    }
}

fn heading_scale(tag: &str) -> Option<f32> {
    match tag {
        "h1" => Some(2.0),
        "h2" => Some(1.5),
        "h3" => Some(1.25),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(tag: &str, line: usize, children: Vec<DomNode>) -> DomNode {
        DomNode::element(
            tag,
            vec![(SOURCE_LINE_ATTRIBUTE.to_string(), line.to_string())],
            children,
        )
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            line_height: 20.0,
            chars_per_line: 10,
            block_gap: 5.0,
        }
    }

    #[test]
    fn test_paragraphs_stack_with_gap() {
        let root = DomNode::Fragment(vec![
            stamped("p", 1, vec![DomNode::text("short")]),
            stamped("p", 3, vec![DomNode::text("a much longer paragraph")]),
        ]);
        let layout = BlockLayout::compute(&root, &config());
        assert_eq!(
            layout.stamped_offsets(),
            vec![("1".to_string(), 0.0), ("3".to_string(), 25.0)]
        );
        // 23 characters wrap onto three lines
        assert_eq!(layout.height(), 25.0 + 60.0 + 5.0);
    }

    #[test]
    fn test_headings_are_taller() {
        let root = DomNode::Fragment(vec![
            stamped("h1", 1, vec![DomNode::text("Title")]),
            stamped("p", 2, vec![DomNode::text("x")]),
        ]);
        let layout = BlockLayout::compute(&root, &config());
        assert_eq!(layout.stamped_offsets()[1].1, 45.0);
    }

    #[test]
    fn test_nested_blocks_and_inline_stamps() {
        let root = DomNode::Fragment(vec![stamped(
            "ul",
            1,
            vec![
                stamped("li", 1, vec![DomNode::text("one")]),
                stamped(
                    "li",
                    2,
                    vec![stamped("em", 2, vec![DomNode::text("two")])],
                ),
            ],
        )]);
        let layout = BlockLayout::compute(&root, &config());
        let offsets: Vec<f32> = layout.stamped_offsets().iter().map(|(_, top)| *top).collect();
        assert_eq!(offsets, vec![0.0, 0.0, 20.0, 20.0]);
        assert_eq!(layout.boxes()[0].height, 45.0);
    }

    #[test]
    fn test_unstamped_components_still_take_space() {
        let root = DomNode::Fragment(vec![
            DomNode::element("div", Vec::new(), vec![DomNode::text("from a component")]),
            stamped("p", 4, vec![DomNode::text("after")]),
        ]);
        let layout = BlockLayout::compute(&root, &config());
        assert_eq!(layout.stamped_offsets(), vec![("4".to_string(), 40.0)]);
    }

    #[test]
    fn test_preformatted_lines() {
        let root = stamped(
            "pre",
            1,
            vec![DomNode::element("code", Vec::new(), vec![DomNode::text("a\nb\nc\n")])],
        );
        let layout = BlockLayout::compute(&root, &config());
        assert_eq!(layout.height(), 65.0);
    }
}
