// ABOUTME: Tokenizer for authored tags such as <Note kind="info"> and </Note>
// ABOUTME: Also finds the closing tag that matches an opening one, honouring nesting

use super::expr::{self, ExprError};
use crate::tree::{AttributeValue, JsxAttribute};

/// One opening, closing or self-closing tag
#[derive(Debug, Clone, PartialEq)]
pub struct TagToken {
    pub name: String,
    pub attributes: Vec<JsxAttribute>,
    pub closing: bool,
    pub self_closing: bool,
    /// Byte offset of `<`
    pub start: usize,
    /// Byte offset just past `>`
    pub end: usize,
}

/// A malformed tag: byte offset of the problem and a message
#[derive(Debug, Clone, PartialEq)]
pub enum TagError {
    Syntax { offset: usize, message: String },
    Expression { offset: usize, expression: String, message: String },
    DynamicImport { offset: usize },
}

/// Whether the text at `at` starts something that must be a tag.
pub fn looks_like_tag(src: &str, at: usize) -> bool {
    let rest = &src.as_bytes()[at..];
    rest.first() == Some(&b'<')
        && matches!(rest.get(1), Some(c) if c.is_ascii_alphabetic() || *c == b'/' || *c == b'>')
}

/// Parse the tag starting at `at`.
///
/// `Ok(None)` means the text is not tag syntax at all (for example `<3` or an
/// autolink such as `<https://example.com>`), so callers may treat it as text.
pub fn parse_tag(src: &str, at: usize) -> Result<Option<TagToken>, TagError> {
    if !looks_like_tag(src, at) {
        return Ok(None);
    }
    let bytes = src.as_bytes();
    let mut pos = at + 1;

    let closing = bytes.get(pos) == Some(&b'/');
    if closing {
        pos += 1;
    }

    let name_start = pos;
    while pos < bytes.len() && is_name_byte(bytes[pos], pos == name_start) {
        pos += 1;
    }
    let name = &src[name_start..pos];
    match bytes.get(pos) {
        Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => {}
        _ => return Ok(None),
    }

    if closing {
        pos = skip_ws(bytes, pos);
        if bytes.get(pos) != Some(&b'>') {
            return Err(TagError::Syntax {
                offset: pos,
                message: format!("Expected `>` to end closing tag `</{name}`"),
            });
        }
        return Ok(Some(TagToken {
            name: name.to_string(),
            attributes: Vec::new(),
            closing: true,
            self_closing: false,
            start: at,
            end: pos + 1,
        }));
    }

    let mut attributes = Vec::new();
    loop {
        pos = skip_ws(bytes, pos);
        match bytes.get(pos) {
            None => {
                return Err(TagError::Syntax {
                    offset: pos,
                    message: format!("Unexpected end of file in tag `<{name}`, expected `>`"),
                });
            }
            Some(b'>') => {
                return Ok(Some(token(name, attributes, false, at, pos + 1)));
            }
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => {
                return Ok(Some(token(name, attributes, true, at, pos + 2)));
            }
            Some(b'{') => {
                return Err(TagError::Syntax {
                    offset: pos,
                    message: "Spread attributes are not supported".to_string(),
                });
            }
            Some(_) => {
                let (attribute, next) = parse_attribute(src, pos)?;
                attributes.push(attribute);
                pos = next;
            }
        }
    }
}

fn token(
    name: &str,
    attributes: Vec<JsxAttribute>,
    self_closing: bool,
    start: usize,
    end: usize,
) -> TagToken {
    TagToken {
        name: name.to_string(),
        attributes,
        closing: false,
        self_closing,
        start,
        end,
    }
}

fn parse_attribute(src: &str, at: usize) -> Result<(JsxAttribute, usize), TagError> {
    let bytes = src.as_bytes();
    let mut pos = at;
    while pos < bytes.len() && is_attribute_name_byte(bytes[pos], pos == at) {
        pos += 1;
    }
    if pos == at {
        let unexpected = src[at..].chars().next().unwrap_or(' ');
        return Err(TagError::Syntax {
            offset: at,
            message: format!("Unexpected character `{unexpected}` in tag"),
        });
    }
    let name = src[at..pos].to_string();

    let after_name = skip_ws(bytes, pos);
    if bytes.get(after_name) != Some(&b'=') {
        return Ok((
            JsxAttribute {
                name,
                value: AttributeValue::Implicit,
            },
            pos,
        ));
    }

    pos = skip_ws(bytes, after_name + 1);
    match bytes.get(pos) {
        Some(quote @ (b'"' | b'\'')) => {
            let close = src[pos + 1..]
                .find(*quote as char)
                .map(|idx| pos + 1 + idx)
                .ok_or_else(|| TagError::Syntax {
                    offset: pos,
                    message: format!("Unterminated string in attribute `{name}`"),
                })?;
            let value = AttributeValue::Text(src[pos + 1..close].to_string());
            Ok((JsxAttribute { name, value }, close + 1))
        }
        Some(b'{') => {
            let close = expr::matching_brace(src, pos).ok_or_else(|| TagError::Syntax {
                offset: pos,
                message: format!("Expected a closing brace for the value of `{name}`"),
            })?;
            let inner = &src[pos + 1..close - 1];
            let expression = expr::parse(inner).map_err(|err| match err {
                ExprError::DynamicImport => TagError::DynamicImport { offset: pos },
                ExprError::Invalid(message) => TagError::Expression {
                    offset: pos,
                    expression: inner.trim().to_string(),
                    message,
                },
            })?;
            Ok((
                JsxAttribute {
                    name,
                    value: AttributeValue::Expression(expression),
                },
                close,
            ))
        }
        _ => Err(TagError::Syntax {
            offset: pos,
            message: format!("Expected a quoted string or `{{expression}}` as the value of `{name}`"),
        }),
    }
}

/// Find the closing tag that matches `name`, searching `[from, end)`.
///
/// Returns the closing tag token. Nested tags with the same name are counted.
pub fn find_matching_close(src: &str, name: &str, from: usize, end: usize) -> Option<TagToken> {
    let mut depth = 0usize;
    let mut pos = from;
    while let Some(idx) = src[pos..end].find('<') {
        let at = pos + idx;
        match parse_tag(&src[..end], at) {
            Ok(Some(tag)) if tag.name == name => {
                if tag.closing {
                    if depth == 0 {
                        return Some(tag);
                    }
                    depth -= 1;
                } else if !tag.self_closing {
                    depth += 1;
                }
                pos = tag.end;
            }
            Ok(Some(tag)) => pos = tag.end,
            _ => pos = at + 1,
        }
    }
    None
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

fn is_name_byte(b: u8, first: bool) -> bool {
    if first {
        b.is_ascii_alphabetic()
    } else {
        b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_')
    }
}

fn is_attribute_name_byte(b: u8, first: bool) -> bool {
    if first {
        b.is_ascii_alphabetic() || matches!(b, b'_' | b':')
    } else {
        b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'-')
    }
}
