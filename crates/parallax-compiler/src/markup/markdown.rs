// ABOUTME: Builds tree nodes from markdown runs using pulldown-cmark offset events
// ABOUTME: Handles inline tags, brace expressions and bare URL links inside text

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::MarkupParser;
use super::expr;
use super::jsx::{self, TagToken};
use crate::error::CompileError;
use crate::tree::{Element, ExpressionNode, JsxAttribute, JsxElement, Node, Text};

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>]+").expect("Invalid bare URL regex"));

impl MarkupParser<'_> {
    /// Parse `[start, end)` as markdown after removing its common indentation.
    pub(super) fn markdown(&self, start: usize, end: usize) -> Result<Vec<Node>, CompileError> {
        let (text, map) = dedent(&self.src[start..end], start);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        let mut builder = TreeBuilder::new(self, &map);
        for (event, range) in Parser::new_ext(&text, options).into_offset_iter() {
            builder.event(event, range)?;
        }
        builder.finish()
    }

    /// Parse `[start, end)` as inline content, without a wrapping paragraph.
    pub(super) fn inline(&self, start: usize, end: usize) -> Result<Vec<Node>, CompileError> {
        let mut nodes = self.markdown(start, end)?;
        if let [Node::Element(paragraph)] = nodes.as_mut_slice()
            && paragraph.tag == "p"
        {
            return Ok(std::mem::take(&mut paragraph.children));
        }
        Ok(nodes)
    }
}

/// Maps offsets in dedented text back to the source
struct OffsetMap {
    /// `(dedented line start, source offset of that line's first kept byte)`
    segments: Vec<(usize, usize)>,
    fallback: usize,
}

impl OffsetMap {
    fn source(&self, offset: usize) -> usize {
        let idx = self.segments.partition_point(|(dedented, _)| *dedented <= offset);
        match idx.checked_sub(1).and_then(|idx| self.segments.get(idx)) {
            Some((dedented, source)) => source + (offset - dedented),
            None => self.fallback,
        }
    }
}

fn dedent(text: &str, base: usize) -> (String, OffsetMap) {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(text.len());
    let mut segments = Vec::new();
    let mut line_start = base;
    for line in text.split_inclusive('\n') {
        let leading = line.len() - line.trim_start_matches([' ', '\t']).len();
        let removed = indent.min(leading);
        segments.push((out.len(), line_start + removed));
        out.push_str(&line[removed..]);
        line_start += line.len();
    }

    (
        out,
        OffsetMap {
            segments,
            fallback: base,
        },
    )
}

enum FrameKind {
    Root,
    Element(Element),
    Jsx { name: String, attributes: Vec<JsxAttribute> },
    CodeBlock { language: Option<String>, code: String },
    Image { src: String, title: String },
    TableHead,
    /// Markdown constructs without an HTML counterpart; children are spliced
    Transparent,
}

struct Frame {
    kind: FrameKind,
    start: usize,
    end: usize,
    children: Vec<Node>,
}

struct PendingText {
    value: String,
    start: usize,
    end: usize,
}

struct TreeBuilder<'p, 'a> {
    parser: &'p MarkupParser<'a>,
    map: &'p OffsetMap,
    stack: Vec<Frame>,
    pending: Option<PendingText>,
    alignments: Vec<Alignment>,
    cell: usize,
}

impl<'p, 'a> TreeBuilder<'p, 'a> {
    fn new(parser: &'p MarkupParser<'a>, map: &'p OffsetMap) -> Self {
        Self {
            parser,
            map,
            stack: vec![Frame {
                kind: FrameKind::Root,
                start: 0,
                end: 0,
                children: Vec::new(),
            }],
            pending: None,
            alignments: Vec::new(),
            cell: 0,
        }
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) -> Result<(), CompileError> {
        let start = self.map.source(range.start);
        let end = self.map.source(range.end);

        if let Event::Text(text) = &event {
            if let Some(Frame {
                kind: FrameKind::CodeBlock { code, .. },
                ..
            }) = self.stack.last_mut()
            {
                code.push_str(text);
            } else {
                self.push_text(text, start, end);
            }
            return Ok(());
        }
        if let Event::SoftBreak = event {
            self.push_text("\n", start, end);
            return Ok(());
        }
        self.flush_text()?;

        match event {
            Event::Start(Tag::HtmlBlock) | Event::End(pulldown_cmark::TagEnd::HtmlBlock) => {}
            Event::Start(tag) => self.open(tag, start, end),
            Event::End(_) => self.close()?,
            Event::Code(code) => {
                let element = Element::new("code")
                    .with_children(vec![self.text_node(code.to_string(), start, end)])
                    .with_position(self.parser.position(start, end));
                self.push(Node::Element(element));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.html(&html, start)?,
            Event::HardBreak => {
                let element = Element::new("br").with_position(self.parser.position(start, end));
                self.push(Node::Element(element));
            }
            Event::Rule => {
                let element = Element::new("hr").with_position(self.parser.position(start, end));
                self.push(Node::Element(element));
            }
            Event::TaskListMarker(checked) => {
                let mut element = Element::new("input")
                    .with_property("type", "checkbox")
                    .with_property("disabled", "");
                if checked {
                    element = element.with_property("checked", "");
                }
                self.push(Node::Element(element.with_position(self.parser.position(start, end))));
            }
            _ => {}
        }
        Ok(())
    }

    fn open(&mut self, tag: Tag<'_>, start: usize, end: usize) {
        let kind = match tag {
            Tag::Paragraph => FrameKind::Element(Element::new("p")),
            Tag::Heading { level, id, .. } => {
                let mut element = Element::new(heading_tag(level));
                if let Some(id) = id {
                    element = element.with_property("id", id.to_string());
                }
                FrameKind::Element(element)
            }
            Tag::BlockQuote(_) => FrameKind::Element(Element::new("blockquote")),
            Tag::CodeBlock(kind) => FrameKind::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                },
                code: String::new(),
            },
            Tag::List(Some(first)) if first != 1 => {
                FrameKind::Element(Element::new("ol").with_property("start", first.to_string()))
            }
            Tag::List(Some(_)) => FrameKind::Element(Element::new("ol")),
            Tag::List(None) => FrameKind::Element(Element::new("ul")),
            Tag::Item => FrameKind::Element(Element::new("li")),
            Tag::Table(alignments) => {
                self.alignments = alignments;
                FrameKind::Element(Element::new("table"))
            }
            Tag::TableHead => {
                self.cell = 0;
                FrameKind::TableHead
            }
            Tag::TableRow => {
                self.cell = 0;
                FrameKind::Element(Element::new("tr"))
            }
            Tag::TableCell => {
                let in_head = self
                    .stack
                    .last()
                    .is_some_and(|frame| matches!(frame.kind, FrameKind::TableHead));
                let mut element = Element::new(if in_head { "th" } else { "td" });
                let align = match self.alignments.get(self.cell) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    element = element.with_property("align", align);
                }
                self.cell += 1;
                FrameKind::Element(element)
            }
            Tag::Emphasis => FrameKind::Element(Element::new("em")),
            Tag::Strong => FrameKind::Element(Element::new("strong")),
            Tag::Strikethrough => FrameKind::Element(Element::new("del")),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut element = Element::new("a").with_property("href", dest_url.to_string());
                if !title.is_empty() {
                    element = element.with_property("title", title.to_string());
                }
                FrameKind::Element(element)
            }
            Tag::Image {
                dest_url, title, ..
            } => FrameKind::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
            },
            _ => FrameKind::Transparent,
        };
        self.stack.push(Frame {
            kind,
            start,
            end,
            children: Vec::new(),
        });
    }

    fn close(&mut self) -> Result<(), CompileError> {
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        let position = self.parser.position(frame.start, frame.end);

        match frame.kind {
            FrameKind::Root => {
                self.stack.push(frame);
            }
            FrameKind::Jsx { name, .. } => {
                return Err(self.parser.unclosed_tag(frame.start, &name));
            }
            FrameKind::Element(mut element) if element.tag == "p" => {
                if is_flow_expression(&frame.children) {
                    for child in frame.children {
                        if let Node::Expression(_) = child {
                            self.push(child);
                        }
                    }
                } else {
                    element.children = frame.children;
                    self.push(Node::Element(element.with_position(position)));
                }
            }
            FrameKind::Element(mut element) if element.tag == "table" => {
                let mut head = Vec::new();
                let mut rows = Vec::new();
                for child in frame.children {
                    match child {
                        Node::Element(e) if e.tag == "thead" => head.push(Node::Element(e)),
                        other => rows.push(other),
                    }
                }
                if !rows.is_empty() {
                    head.push(Node::Element(Element::new("tbody").with_children(rows)));
                }
                element.children = head;
                self.push(Node::Element(element.with_position(position)));
            }
            FrameKind::Element(mut element) => {
                element.children = frame.children;
                self.push(Node::Element(element.with_position(position)));
            }
            FrameKind::CodeBlock { language, code } => {
                let mut inner = Element::new("code");
                if let Some(language) = language {
                    inner = inner.with_property("class", format!("language-{language}"));
                }
                let inner = inner.with_children(vec![Node::Text(Text {
                    value: code,
                    position,
                })]);
                let pre = Element::new("pre")
                    .with_children(vec![Node::Element(inner)])
                    .with_position(position);
                self.push(Node::Element(pre));
            }
            FrameKind::Image { src, title } => {
                let mut image = Element::new("img")
                    .with_property("src", src)
                    .with_property("alt", plain_text(&frame.children));
                if !title.is_empty() {
                    image = image.with_property("title", title);
                }
                self.push(Node::Element(image.with_position(position)));
            }
            FrameKind::TableHead => {
                let row = Element::new("tr").with_children(frame.children);
                let head = Element::new("thead")
                    .with_children(vec![Node::Element(row)])
                    .with_position(position);
                self.push(Node::Element(head));
            }
            FrameKind::Transparent => {
                for child in frame.children {
                    self.push(child);
                }
            }
        }
        Ok(())
    }

    /// Handle raw HTML: authored tags open and close inline elements.
    fn html(&mut self, html: &str, base: usize) -> Result<(), CompileError> {
        let mut pos = 0;
        while pos < html.len() {
            let Some(idx) = html[pos..].find('<') else {
                self.text_segment(&html[pos..], base + pos)?;
                break;
            };
            let at = pos + idx;
            if at > pos {
                self.text_segment(&html[pos..at], base + pos)?;
            }

            if html[at..].starts_with("<!--") {
                pos = html[at..]
                    .find("-->")
                    .map_or(html.len(), |close| at + close + 3);
                continue;
            }

            match jsx::parse_tag(html, at) {
                Ok(Some(tag)) => {
                    pos = tag.end;
                    self.tag(tag, base)?;
                }
                Ok(None) => {
                    self.text_segment("<", base + at)?;
                    pos = at + 1;
                }
                Err(err) => return Err(self.parser.tag_error(base, err)),
            }
        }
        Ok(())
    }

    fn tag(&mut self, tag: TagToken, base: usize) -> Result<(), CompileError> {
        let start = base + tag.start;
        let end = base + tag.end;

        if tag.closing {
            let matches_top = matches!(
                self.stack.last(),
                Some(Frame { kind: FrameKind::Jsx { name, .. }, .. }) if *name == tag.name
            );
            if !matches_top {
                return Err(self.parser.parse_error(
                    start,
                    format!("Unexpected closing tag `</{}>`", tag.name),
                ));
            }
            if let Some(Frame {
                kind: FrameKind::Jsx { name, attributes },
                start: open_start,
                children,
                ..
            }) = self.stack.pop()
            {
                let element = JsxElement {
                    name,
                    attributes,
                    children,
                    position: self.parser.position(open_start, end),
                };
                self.push(Node::Jsx(element));
            }
            return Ok(());
        }

        if tag.self_closing {
            self.push(Node::Jsx(JsxElement {
                name: tag.name,
                attributes: tag.attributes,
                children: Vec::new(),
                position: self.parser.position(start, end),
            }));
        } else {
            self.stack.push(Frame {
                kind: FrameKind::Jsx {
                    name: tag.name,
                    attributes: tag.attributes,
                },
                start,
                end,
                children: Vec::new(),
            });
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str, start: usize, end: usize) {
        match &mut self.pending {
            Some(pending) => {
                pending.value.push_str(text);
                pending.end = end;
            }
            None => {
                self.pending = Some(PendingText {
                    value: text.to_string(),
                    start,
                    end,
                });
            }
        }
    }

    fn flush_text(&mut self) -> Result<(), CompileError> {
        if let Some(pending) = self.pending.take() {
            self.split_text(&pending.value, pending.start, pending.end)?;
        }
        Ok(())
    }

    fn text_segment(&mut self, text: &str, start: usize) -> Result<(), CompileError> {
        self.split_text(text, start, start + text.len())
    }

    /// Split text into plain text, `{expression}` nodes and bare URL links.
    fn split_text(&mut self, text: &str, start: usize, end: usize) -> Result<(), CompileError> {
        let mut rest = 0;
        while let Some(idx) = text[rest..].find('{') {
            let open = rest + idx;
            self.plain_text(&text[rest..open], start, end);

            let close = expr::matching_brace(text, open).ok_or_else(|| {
                self.parser.parse_error(
                    start,
                    "Unexpected end of file in expression, expected a corresponding closing brace for `{`",
                )
            })?;
            let inner = &text[open + 1..close - 1];
            let expression = expr::parse(inner)
                .map_err(|err| self.parser.expression_error(start, inner, err))?;
            self.push(Node::Expression(ExpressionNode {
                expression,
                position: self.parser.position(start, end),
            }));
            rest = close;
        }
        self.plain_text(&text[rest..], start, end);
        Ok(())
    }

    fn plain_text(&mut self, text: &str, start: usize, end: usize) {
        if text.is_empty() {
            return;
        }
        if self.inside_link() {
            let node = self.text_node(text.to_string(), start, end);
            self.push(node);
            return;
        }

        let mut last = 0;
        for found in BARE_URL.find_iter(text) {
            let url = found
                .as_str()
                .trim_end_matches(['.', ',', ':', ';', '!', '?', ')', '\'', '"']);
            if found.start() > last {
                let node = self.text_node(text[last..found.start()].to_string(), start, end);
                self.push(node);
            }
            let link = Element::new("a")
                .with_property("href", url)
                .with_children(vec![self.text_node(url.to_string(), start, end)])
                .with_position(self.parser.position(start, end));
            self.push(Node::Element(link));
            last = found.start() + url.len();
        }
        if last < text.len() {
            let node = self.text_node(text[last..].to_string(), start, end);
            self.push(node);
        }
    }

    fn inside_link(&self) -> bool {
        self.stack.iter().any(|frame| match &frame.kind {
            FrameKind::Element(element) => element.tag == "a",
            FrameKind::Jsx { name, .. } => name == "a",
            _ => false,
        })
    }

    fn text_node(&self, value: String, start: usize, end: usize) -> Node {
        Node::Text(Text {
            value,
            position: self.parser.position(start, end),
        })
    }

    fn push(&mut self, node: Node) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(node);
        }
    }

    fn finish(mut self) -> Result<Vec<Node>, CompileError> {
        self.flush_text()?;
        while self.stack.len() > 1 {
            if let Some(Frame {
                kind: FrameKind::Jsx { name, .. },
                start,
                ..
            }) = self.stack.last()
            {
                return Err(self.parser.unclosed_tag(*start, name));
            }
            self.close()?;
        }
        Ok(self
            .stack
            .pop()
            .map(|root| root.children)
            .unwrap_or_default())
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// A paragraph holding only expressions is a flow expression, not a paragraph.
fn is_flow_expression(children: &[Node]) -> bool {
    children
        .iter()
        .any(|child| matches!(child, Node::Expression(_)))
        && children.iter().all(|child| match child {
            Node::Expression(_) => true,
            Node::Text(text) => text.value.trim().is_empty(),
            _ => false,
        })
}

fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&text.value),
            Node::Element(element) => out.push_str(&plain_text(&element.children)),
            Node::Jsx(jsx) => out.push_str(&plain_text(&jsx.children)),
            Node::Expression(_) => {}
        }
    }
    out
}
