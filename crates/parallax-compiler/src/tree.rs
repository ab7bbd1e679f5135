// ABOUTME: Syntax tree produced by the markup parser
// ABOUTME: Markdown elements, authored tags, text and expressions with source positions

/// A location in the cleaned content. Line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

/// Top of a parsed document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Root {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Structural element produced from markdown syntax
    Element(Element),
    /// Tag written by the author, either an HTML tag or a component
    Jsx(JsxElement),
    Text(Text),
    /// `{expression}` child
    Expression(ExpressionNode),
}

impl Node {
    pub fn position(&self) -> Option<&Position> {
        match self {
            Node::Element(e) => e.position.as_ref(),
            Node::Jsx(j) => j.position.as_ref(),
            Node::Text(t) => t.position.as_ref(),
            Node::Expression(x) => x.position.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Ordered attributes; boolean attributes carry an empty value
    pub properties: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub position: Option<Position>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: Vec::new(),
            children: Vec::new(),
            position: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set `name`, replacing an existing value.
    pub fn set_property(&mut self, name: &str, value: String) {
        match self.properties.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    /// Tag name; empty for a fragment `<>...</>`
    pub name: String,
    pub attributes: Vec<JsxAttribute>,
    pub children: Vec<Node>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttribute {
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// `name="text"` or `name='text'`
    Text(String),
    /// `name={expression}`
    Expression(Expr),
    /// bare `name`
    Implicit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    pub expression: Expr,
    pub position: Option<Position>,
}

/// The expression language allowed inside `{...}`
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    Undefined,
    Identifier(String),
    Member(Box<Expr>, String),
    Object(Vec<(String, Expr)>),
    /// `{}` or a comment-only expression
    Empty,
}

/// Parameters of an exported component
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `()`
    None,
    /// `(props)` or `props =>`
    Props(String),
    /// `({ title, level = 2, children })`
    Destructured(Vec<(String, Option<Expr>)>),
}

/// `export const Name = (params) => ( markup )`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub params: Params,
    pub body: Vec<Node>,
    pub position: Option<Position>,
}

/// A parsed document: its content tree plus locally exported components
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub content: Root,
    pub exports: Vec<ComponentDef>,
}

impl Module {
    pub fn export(&self, name: &str) -> Option<&ComponentDef> {
        self.exports.iter().find(|def| def.name == name)
    }
}
