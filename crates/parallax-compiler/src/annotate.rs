// ABOUTME: Post-parse tree visitors, including the source line annotator
// ABOUTME: Stamps markdown-derived elements with the line they start on

use crate::tree::{Node, Root};

/// Attribute carrying the 1-based source line of a rendered element
pub const SOURCE_LINE_ATTRIBUTE: &str = "data-source-line";

/// A transformation applied to the parsed tree before evaluation
pub trait TreeVisitor {
    fn visit(&self, tree: Root) -> Root;
}

/// Stamps every positioned element with [`SOURCE_LINE_ATTRIBUTE`].
///
/// The walk descends through element children only. Authored tags are
/// left untouched, as are their subtrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceLineAnnotator;

impl SourceLineAnnotator {
    fn stamp(nodes: &mut [Node]) {
        for node in nodes {
            if let Node::Element(element) = node {
                if let Some(position) = element.position {
                    element.set_property(SOURCE_LINE_ATTRIBUTE, position.start.line.to_string());
                }
                Self::stamp(&mut element.children);
            }
        }
    }
}

impl TreeVisitor for SourceLineAnnotator {
    fn visit(&self, mut tree: Root) -> Root {
        Self::stamp(&mut tree.children);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Element, JsxElement, Point, Position, Text};

    fn at(line: usize) -> Option<Position> {
        let point = Point {
            line,
            column: 1,
            offset: 0,
        };
        Some(Position {
            start: point,
            end: point,
        })
    }

    #[test]
    fn test_stamps_nested_elements() {
        let tree = Root {
            children: vec![Node::Element(
                Element::new("ul")
                    .with_position(at(3))
                    .with_children(vec![Node::Element(
                        Element::new("li").with_position(at(4)),
                    )]),
            )],
        };

        let annotated = SourceLineAnnotator.visit(tree);
        let Node::Element(list) = &annotated.children[0] else {
            panic!("expected element");
        };
        assert_eq!(list.property(SOURCE_LINE_ATTRIBUTE), Some("3"));
        let Node::Element(item) = &list.children[0] else {
            panic!("expected element");
        };
        assert_eq!(item.property(SOURCE_LINE_ATTRIBUTE), Some("4"));
    }

    #[test]
    fn test_unpositioned_elements_stay_unstamped() {
        let tree = Root {
            children: vec![Node::Element(
                Element::new("p").with_children(vec![Node::Element(
                    Element::new("em").with_position(at(2)),
                )]),
            )],
        };

        let annotated = SourceLineAnnotator.visit(tree);
        let Node::Element(p) = &annotated.children[0] else {
            panic!("expected element");
        };
        assert_eq!(p.property(SOURCE_LINE_ATTRIBUTE), None);
        let Node::Element(em) = &p.children[0] else {
            panic!("expected element");
        };
        assert_eq!(em.property(SOURCE_LINE_ATTRIBUTE), Some("2"));
    }

    #[test]
    fn test_authored_tags_are_not_descended() {
        let tree = Root {
            children: vec![Node::Jsx(JsxElement {
                name: "Note".into(),
                attributes: Vec::new(),
                children: vec![
                    Node::Element(Element::new("p").with_position(at(5))),
                    Node::Text(Text {
                        value: "x".into(),
                        position: at(5),
                    }),
                ],
                position: at(4),
            })],
        };

        let annotated = SourceLineAnnotator.visit(tree.clone());
        assert_eq!(annotated, tree);
    }

    #[test]
    fn test_restamping_replaces_value() {
        let tree = Root {
            children: vec![Node::Element(
                Element::new("h1")
                    .with_property(SOURCE_LINE_ATTRIBUTE, "99")
                    .with_position(at(1)),
            )],
        };
        let annotated = SourceLineAnnotator.visit(tree);
        let Node::Element(h1) = &annotated.children[0] else {
            panic!("expected element");
        };
        assert_eq!(h1.property(SOURCE_LINE_ATTRIBUTE), Some("1"));
        assert_eq!(h1.properties.len(), 1);
    }
}
