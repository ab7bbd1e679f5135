// ABOUTME: Line-oriented flow segmentation of document content
// ABOUTME: Recognizes component exports and block-level tags, leaving the rest to markdown

use super::MarkupParser;
use super::expr;
use super::jsx::{self, TagToken};
use crate::error::CompileError;
use crate::imports::is_identifier;
use crate::tree::{ComponentDef, JsxElement, Node, Params};

const EXPORT_SHAPE: &str = "only `export const Name = (props) => (...)` component definitions are supported";

impl MarkupParser<'_> {
    /// Parse `[start, end)` as a sequence of blocks.
    pub(super) fn flow(
        &mut self,
        start: usize,
        end: usize,
        top_level: bool,
    ) -> Result<Vec<Node>, CompileError> {
        let mut nodes = Vec::new();
        let mut run_start: Option<usize> = None;
        let mut fence: Option<(char, usize)> = None;
        let mut pos = start;

        while pos < end {
            let line_end = self.line_end(pos, end);
            let line = &self.src[pos..line_end];
            let trimmed = line.trim_start();
            let at = pos + (line.len() - trimmed.len());

            if let Some((marker, width)) = fence {
                if closes_fence(trimmed, marker, width) {
                    fence = None;
                }
                pos = next_line(line_end, end);
                continue;
            }
            if let Some(open) = opens_fence(trimmed) {
                fence = Some(open);
                run_start.get_or_insert(pos);
                pos = next_line(line_end, end);
                continue;
            }

            if top_level && starts_with_word(trimmed, "export") {
                self.flush(&mut nodes, &mut run_start, pos)?;
                let statement_end = self.export(at, end)?;
                pos = next_line(self.line_end(statement_end, end), end);
                continue;
            }

            if let Some(block_end) = self.block_at(at, end, &mut nodes, &mut run_start, pos)? {
                pos = next_line(self.line_end(block_end, end), end);
                continue;
            }

            run_start.get_or_insert(pos);
            pos = next_line(line_end, end);
        }

        self.flush(&mut nodes, &mut run_start, end)?;
        Ok(nodes)
    }

    /// Try to read a block-level tag starting at `at`.
    ///
    /// A tag is block-level when nothing but whitespace follows it (or its
    /// matching closing tag) on the line. Returns the end of the block.
    fn block_at(
        &mut self,
        at: usize,
        end: usize,
        nodes: &mut Vec<Node>,
        run_start: &mut Option<usize>,
        line_start: usize,
    ) -> Result<Option<usize>, CompileError> {
        let bounded = &self.src[..end];
        let tag = match jsx::parse_tag(bounded, at) {
            Ok(Some(tag)) => tag,
            Ok(None) => return Ok(None),
            Err(err) => return Err(self.tag_error(0, err)),
        };

        if tag.closing {
            return Err(self.parse_error(
                at,
                format!("Unexpected closing tag `</{}>`", tag.name),
            ));
        }

        let close = if tag.self_closing {
            None
        } else {
            match jsx::find_matching_close(bounded, &tag.name, tag.end, end) {
                Some(close) => Some(close),
                None if self.rest_is_blank(tag.end, end) => {
                    return Err(self.unclosed_tag(at, &tag.name));
                }
                None => return Ok(None),
            }
        };

        let block_end = close.as_ref().map_or(tag.end, |close| close.end);
        if !self.rest_is_blank(block_end, end) {
            return Ok(None);
        }

        self.flush(nodes, run_start, line_start)?;
        let node = self.block_element(tag, close)?;
        nodes.push(node);
        Ok(Some(block_end))
    }

    /// Build the node for an authored tag and its matching close.
    fn block_element(
        &mut self,
        open: TagToken,
        close: Option<TagToken>,
    ) -> Result<Node, CompileError> {
        let (children, end) = match &close {
            None => (Vec::new(), open.end),
            Some(close) => {
                let interior = &self.src[open.end..close.start];
                let children = if interior.contains('\n') {
                    self.flow(open.end, close.start, false)?
                } else {
                    self.inline(open.end, close.start)?
                };
                (children, close.end)
            }
        };

        Ok(Node::Jsx(JsxElement {
            name: open.name,
            attributes: open.attributes,
            children,
            position: self.position(open.start, end),
        }))
    }

    /// Parse `export const Name = (params) => ( <Tag>...</Tag> )` at `at`.
    fn export(&mut self, at: usize, end: usize) -> Result<usize, CompileError> {
        let src = self.src;
        let mut cursor = Cursor {
            src: &src[..end],
            pos: at + "export".len(),
        };

        cursor.skip_ws();
        if !cursor.eat_word("const") {
            return Err(self.export_error(at, format!("Unsupported export: {EXPORT_SHAPE}")));
        }
        cursor.skip_ws();
        let name = cursor
            .identifier()
            .ok_or_else(|| self.export_error(cursor.pos, "Expected a component name"))?;
        cursor.skip_ws();
        if !cursor.eat("=") {
            return Err(self.export_error(at, format!("Unsupported export: {EXPORT_SHAPE}")));
        }
        cursor.skip_ws();

        let params = if cursor.peek_str("(") {
            let params_start = cursor.pos;
            let close = cursor
                .matching_paren()
                .ok_or_else(|| self.export_error(params_start, "Expected `)` after parameters"))?;
            let text = &src[params_start + 1..close - 1];
            cursor.pos = close;
            self.params(text, params_start)?
        } else {
            let ident = cursor
                .identifier()
                .ok_or_else(|| self.export_error(at, format!("Unsupported export: {EXPORT_SHAPE}")))?;
            Params::Props(ident)
        };

        cursor.skip_ws();
        if !cursor.eat("=>") {
            return Err(self.export_error(at, format!("Unsupported export: {EXPORT_SHAPE}")));
        }
        cursor.skip_ws();
        let parenthesized = cursor.eat("(");
        cursor.skip_ws();

        let body_start = cursor.pos;
        let open = match jsx::parse_tag(cursor.src, body_start) {
            Ok(Some(tag)) if !tag.closing => tag,
            Ok(_) => {
                return Err(self.export_error(
                    body_start,
                    format!("Component `{name}` must return markup"),
                ));
            }
            Err(err) => return Err(self.tag_error(0, err)),
        };
        let close = if open.self_closing {
            None
        } else {
            Some(
                jsx::find_matching_close(cursor.src, &open.name, open.end, end)
                    .ok_or_else(|| self.unclosed_tag(body_start, &open.name))?,
            )
        };
        cursor.pos = close.as_ref().map_or(open.end, |close| close.end);
        let body = self.block_element(open, close)?;

        cursor.skip_ws();
        if parenthesized && !cursor.eat(")") {
            return Err(self.export_error(cursor.pos, "Expected `)` to close the component body"));
        }
        while cursor.peek_str(" ") || cursor.peek_str("\t") {
            cursor.pos += 1;
        }
        cursor.eat(";");
        if !self.rest_is_blank(cursor.pos, end) {
            return Err(self.export_error(cursor.pos, "Unexpected content after export"));
        }

        if self.exports.iter().any(|def| def.name == name) {
            return Err(self.export_error(
                at,
                format!("Identifier '{name}' has already been declared"),
            ));
        }
        self.exports.push(ComponentDef {
            name,
            params,
            body: vec![body],
            position: self.position(at, cursor.pos),
        });
        Ok(cursor.pos)
    }

    fn params(&self, text: &str, offset: usize) -> Result<Params, CompileError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Params::None);
        }
        if is_identifier(text) {
            return Ok(Params::Props(text.to_string()));
        }

        let inner = text
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| self.export_error(offset, "Unsupported component parameters"))?;

        let mut entries = Vec::new();
        for entry in split_top_level(inner) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, default) = match entry.split_once('=') {
                Some((name, default)) => {
                    let expression = expr::parse(default)
                        .map_err(|err| self.expression_error(offset, default, err))?;
                    (name.trim(), Some(expression))
                }
                None => (entry, None),
            };
            if !is_identifier(name) {
                return Err(self.export_error(offset, format!("Unsupported parameter `{entry}`")));
            }
            entries.push((name.to_string(), default));
        }
        Ok(Params::Destructured(entries))
    }

    fn flush(
        &self,
        nodes: &mut Vec<Node>,
        run_start: &mut Option<usize>,
        upto: usize,
    ) -> Result<(), CompileError> {
        if let Some(start) = run_start.take() {
            nodes.extend(self.markdown(start, upto)?);
        }
        Ok(())
    }

    fn line_end(&self, pos: usize, end: usize) -> usize {
        self.src[pos..end].find('\n').map_or(end, |idx| pos + idx)
    }

    fn rest_is_blank(&self, pos: usize, end: usize) -> bool {
        self.src[pos..self.line_end(pos, end)].trim().is_empty()
    }
}

struct Cursor<'s> {
    src: &'s str,
    pos: usize,
}

impl Cursor<'_> {
    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek_str(&self, text: &str) -> bool {
        self.src[self.pos..].starts_with(text)
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.peek_str(text) {
            self.pos += text.len();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if starts_with_word(&self.src[self.pos..], word) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Option<String> {
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        let ident = &rest[..len];
        if !is_identifier(ident) {
            return None;
        }
        self.pos += len;
        Some(ident.to_string())
    }

    /// Index just past the `)` matching the `(` at the cursor.
    fn matching_paren(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, c) in self.src[self.pos..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(self.pos + idx + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

fn next_line(line_end: usize, end: usize) -> usize {
    (line_end + 1).min(end)
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.starts_with(word)
        && !text[word.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn opens_fence(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let width = trimmed.chars().take_while(|c| *c == marker).count();
    (width >= 3).then_some((marker, width))
}

fn closes_fence(trimmed: &str, marker: char, width: usize) -> bool {
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    run >= width && trimmed[run * marker.len_utf8()..].trim().is_empty()
}

/// Split on commas that are not nested inside braces, brackets or strings.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'' | '`') => quote = Some(c),
            (None, '{' | '[' | '(') => depth += 1,
            (None, '}' | ']' | ')') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
