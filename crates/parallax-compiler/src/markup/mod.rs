// ABOUTME: Markup parser turning cleaned document content into a syntax tree
// ABOUTME: Splits flow into exports, authored block tags and markdown runs

mod expr;
mod flow;
mod jsx;
mod markdown;

use crate::error::CompileError;
use crate::tree::{Module, Point, Position};
use jsx::TagError;

/// Parse cleaned content into its content tree and exported components.
pub fn parse(source: &str) -> Result<Module, CompileError> {
    MarkupParser::new(source).parse_module()
}

/// Maps byte offsets to line and column
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(src.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { starts }
    }

    pub(crate) fn point(&self, src: &str, offset: usize) -> Point {
        let offset = offset.min(src.len());
        let line_idx = self.starts.partition_point(|start| *start <= offset) - 1;
        let line_start = self.starts[line_idx];
        let column = src
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count())
            + 1;
        Point {
            line: line_idx + 1,
            column,
            offset,
        }
    }
}

pub(crate) struct MarkupParser<'a> {
    src: &'a str,
    lines: LineIndex,
    exports: Vec<crate::tree::ComponentDef>,
}

impl<'a> MarkupParser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            lines: LineIndex::new(src),
            exports: Vec::new(),
        }
    }

    pub(crate) fn parse_module(mut self) -> Result<Module, CompileError> {
        let children = self.flow(0, self.src.len(), true)?;
        Ok(Module {
            content: crate::tree::Root { children },
            exports: self.exports,
        })
    }

    fn point(&self, offset: usize) -> Point {
        self.lines.point(self.src, offset)
    }

    fn position(&self, start: usize, end: usize) -> Option<Position> {
        Some(Position {
            start: self.point(start),
            end: self.point(end),
        })
    }

    fn parse_error(&self, offset: usize, message: impl Into<String>) -> CompileError {
        let point = self.point(offset);
        CompileError::Parse {
            line: point.line,
            column: point.column,
            message: message.into(),
        }
    }

    fn export_error(&self, offset: usize, message: impl Into<String>) -> CompileError {
        let point = self.point(offset);
        CompileError::Export {
            line: point.line,
            column: point.column,
            message: message.into(),
        }
    }

    fn expression_error(&self, offset: usize, expression: &str, error: expr::ExprError) -> CompileError {
        let point = self.point(offset);
        match error {
            expr::ExprError::DynamicImport => CompileError::DynamicImport {
                line: point.line,
                column: point.column,
            },
            expr::ExprError::Invalid(message) => CompileError::Expression {
                line: point.line,
                column: point.column,
                expression: expression.trim().to_string(),
                message,
            },
        }
    }

    /// Convert a tag error whose offsets are relative to `base`.
    fn tag_error(&self, base: usize, error: TagError) -> CompileError {
        match error {
            TagError::Syntax { offset, message } => self.parse_error(base + offset, message),
            TagError::Expression {
                offset,
                expression,
                message,
            } => self.expression_error(base + offset, &expression, expr::ExprError::Invalid(message)),
            TagError::DynamicImport { offset } => {
                self.expression_error(base + offset, "", expr::ExprError::DynamicImport)
            }
        }
    }

    fn unclosed_tag(&self, offset: usize, name: &str) -> CompileError {
        self.parse_error(offset, format!("Expected a closing tag for `<{name}>`"))
    }
}
