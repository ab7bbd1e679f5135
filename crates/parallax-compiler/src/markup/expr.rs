// ABOUTME: Parser for the small expression language allowed inside braces
// ABOUTME: Literals, identifiers, member access and object literals; nothing executable

use crate::tree::Expr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    DynamicImport,
    Invalid(String),
}

/// Parse the text between `{` and `}`.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let stripped = strip_comments(source);
    if contains_dynamic_import(&stripped) {
        return Err(ExprError::DynamicImport);
    }
    if stripped.trim().is_empty() {
        return Ok(Expr::Empty);
    }

    let mut parser = ExprParser {
        chars: stripped.chars().collect(),
        pos: 0,
    };
    let expr = parser.expression()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(ExprError::Invalid(format!(
            "unexpected `{}`",
            parser.chars[parser.pos]
        )));
    }
    Ok(expr)
}

/// Index just past the `}` matching the `{` at `open`, skipping strings and comments.
pub fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = src[i + 2..].find("*/").map(|end| i + 2 + end + 1)?;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out.lines()
        .map(|line| match line.find("//") {
            Some(idx) if !line[..idx].contains(['"', '\'']) => &line[..idx],
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn contains_dynamic_import(source: &str) -> bool {
    source.match_indices("import").any(|(idx, _)| {
        let before = source[..idx].chars().next_back();
        let boundary = before.is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '$'));
        boundary && source[idx + "import".len()..].trim_start().starts_with('(')
    })
}

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        while self.eat('.') {
            let name = self.identifier().ok_or_else(|| {
                ExprError::Invalid("expected a property name after `.`".to_string())
            })?;
            expr = Expr::Member(Box::new(expr), name);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('"' | '\'' | '`')) => self.string(quote).map(Expr::Str),
            Some('{') => self.object(),
            Some('(') => {
                self.pos += 1;
                let inner = self.expression()?;
                if !self.eat(')') {
                    return Err(ExprError::Invalid("expected `)`".to_string()));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => self.number(),
            Some(_) => {
                let name = self
                    .identifier()
                    .ok_or_else(|| ExprError::Invalid("unsupported syntax".to_string()))?;
                Ok(match name.as_str() {
                    "true" => Expr::Bool(true),
                    "false" => Expr::Bool(false),
                    "null" => Expr::Null,
                    "undefined" => Expr::Undefined,
                    _ => Expr::Identifier(name),
                })
            }
            None => Err(ExprError::Invalid("unexpected end of expression".to_string())),
        }
    }

    fn identifier(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => self.pos += 1,
            _ => return None,
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn string(&mut self, quote: char) -> Result<String, ExprError> {
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(ExprError::Invalid("unterminated string".to_string())),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('$') if quote == '`' && self.chars.get(self.pos + 1) == Some(&'{') => {
                    return Err(ExprError::Invalid(
                        "template substitutions are not supported".to_string(),
                    ));
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| ExprError::Invalid("unterminated string".to_string()))?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    self.pos += 1;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn number(&mut self) -> Result<Expr, ExprError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '_')
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        text.parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| ExprError::Invalid(format!("invalid number `{text}`")))
    }

    fn object(&mut self) -> Result<Expr, ExprError> {
        self.pos += 1;
        let mut entries = Vec::new();
        loop {
            if self.eat('}') {
                return Ok(Expr::Object(entries));
            }

            self.skip_ws();
            let key = match self.peek() {
                Some(quote @ ('"' | '\'')) => self.string(quote)?,
                _ => self
                    .identifier()
                    .ok_or_else(|| ExprError::Invalid("expected an object key".to_string()))?,
            };

            let value = if self.eat(':') {
                self.expression()?
            } else {
                Expr::Identifier(key.clone())
            };
            entries.push((key, value));

            if !self.eat(',') {
                if self.eat('}') {
                    return Ok(Expr::Object(entries));
                }
                return Err(ExprError::Invalid("expected `,` or `}` in object".to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(parse(" 'hi' "), Ok(Expr::Str("hi".into())));
        assert_eq!(parse("\"a\\\"b\""), Ok(Expr::Str("a\"b".into())));
        assert_eq!(parse("`plain`"), Ok(Expr::Str("plain".into())));
        assert_eq!(parse("42"), Ok(Expr::Number(42.0)));
        assert_eq!(parse("-1.5"), Ok(Expr::Number(-1.5)));
        assert_eq!(parse("true"), Ok(Expr::Bool(true)));
        assert_eq!(parse("null"), Ok(Expr::Null));
    }

    #[test]
    fn test_identifiers_and_members() {
        assert_eq!(parse("count"), Ok(Expr::Identifier("count".into())));
        assert_eq!(
            parse("props.title"),
            Ok(Expr::Member(
                Box::new(Expr::Identifier("props".into())),
                "title".into()
            ))
        );
    }

    #[test]
    fn test_object_literal() {
        let parsed = parse("{ color: 'red', fontSize: 12, 'data-x': true, size }").unwrap();
        assert_eq!(
            parsed,
            Expr::Object(vec![
                ("color".into(), Expr::Str("red".into())),
                ("fontSize".into(), Expr::Number(12.0)),
                ("data-x".into(), Expr::Bool(true)),
                ("size".into(), Expr::Identifier("size".into())),
            ])
        );
    }

    #[test]
    fn test_comments_and_empty() {
        assert_eq!(parse(""), Ok(Expr::Empty));
        assert_eq!(parse("/* a note */"), Ok(Expr::Empty));
        assert_eq!(parse("// line note"), Ok(Expr::Empty));
        assert_eq!(parse("/* n */ 3"), Ok(Expr::Number(3.0)));
    }

    #[test]
    fn test_rejects_code() {
        assert!(matches!(parse("a + b"), Err(ExprError::Invalid(_))));
        assert!(matches!(parse("fn()"), Err(ExprError::Invalid(_))));
        assert!(matches!(parse("`${x}`"), Err(ExprError::Invalid(_))));
        assert_eq!(parse("import('./x.js')"), Err(ExprError::DynamicImport));
        assert_eq!(parse("await import ('x')"), Err(ExprError::DynamicImport));
        assert!(parse("important").is_ok());
    }

    #[test]
    fn test_matching_brace() {
        let src = "{ a: { b: '}' } } tail";
        assert_eq!(matching_brace(src, 0), Some(17));
        assert_eq!(matching_brace("{ open", 0), None);
        assert_eq!(matching_brace("{/* } */}", 0), Some(9));
    }
}
