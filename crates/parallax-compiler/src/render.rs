// ABOUTME: Rendered DOM tree and the renderer that expands compiled documents into it
// ABOUTME: Resolves components against locals, document exports and the evaluation scope

use std::fmt::Write as _;

use crate::error::{RenderError, RenderFailure};
use crate::scope::{EvaluationScope, Value, format_number, lookup};
use crate::tree::{AttributeValue, ComponentDef, Expr, JsxAttribute, JsxElement, Module, Node, Params};

/// Name the document's own content component reports in component stacks
pub const CONTENT_COMPONENT_NAME: &str = "MDXContent";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const UNITLESS_PROPERTIES: &[&str] = &[
    "animationIterationCount",
    "aspectRatio",
    "borderImageOutset",
    "borderImageSlice",
    "borderImageWidth",
    "columnCount",
    "columns",
    "fillOpacity",
    "flex",
    "flexGrow",
    "flexShrink",
    "floodOpacity",
    "fontWeight",
    "gridArea",
    "gridColumn",
    "gridColumnEnd",
    "gridColumnStart",
    "gridRow",
    "gridRowEnd",
    "gridRowStart",
    "lineClamp",
    "lineHeight",
    "opacity",
    "order",
    "orphans",
    "scale",
    "stopOpacity",
    "strokeDasharray",
    "strokeDashoffset",
    "strokeMiterlimit",
    "strokeOpacity",
    "strokeWidth",
    "tabSize",
    "widows",
    "zIndex",
    "zoom",
];

/// A node of the rendered output
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<DomNode>,
    },
    Text(String),
    Fragment(Vec<DomNode>),
}

impl DomNode {
    pub fn element(
        tag: impl Into<String>,
        attributes: Vec<(String, String)>,
        children: Vec<DomNode>,
    ) -> Self {
        DomNode::Element {
            tag: tag.into(),
            attributes,
            children,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        DomNode::Text(value.into())
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            DomNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            DomNode::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn children(&self) -> &[DomNode] {
        match self {
            DomNode::Element { children, .. } | DomNode::Fragment(children) => children,
            DomNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            DomNode::Text(value) => out.push_str(value),
            _ => self.children().iter().for_each(|child| child.collect_text(out)),
        }
    }

    /// Serialise to HTML, escaping text and attribute values.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            DomNode::Text(value) => out.push_str(&escape(value, false)),
            DomNode::Fragment(children) => children.iter().for_each(|c| c.write_html(out)),
            DomNode::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                children.iter().for_each(|c| c.write_html(out));
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape(value: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Identifier bindings local to one component expansion
#[derive(Debug, Default)]
struct Env {
    locals: Vec<(String, Value)>,
}

impl Env {
    fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.locals.push((name.into(), value));
    }

    fn get(&self, name: &str) -> Option<&Value> {
        lookup(&self.locals, name)
    }
}

/// Expands a parsed module into DOM nodes
pub(crate) struct Renderer<'c> {
    module: &'c Module,
    scope: &'c EvaluationScope,
    max_depth: usize,
    stack: Vec<String>,
}

impl<'c> Renderer<'c> {
    pub(crate) fn new(module: &'c Module, scope: &'c EvaluationScope, max_depth: usize) -> Self {
        Self {
            module,
            scope,
            max_depth,
            stack: vec![CONTENT_COMPONENT_NAME.to_string()],
        }
    }

    /// Render the document content with `props` bound as `props`.
    pub(crate) fn render(mut self, props: &[(String, Value)]) -> Result<DomNode, RenderFailure> {
        let mut env = Env::default();
        env.bind("props", Value::Object(props.to_vec()));
        let module = self.module;
        match self.nodes(&module.content.children, &env, 0) {
            Ok(children) => Ok(DomNode::Fragment(children)),
            Err(error) => Err(RenderFailure {
                error,
                component_stack: self.component_stack(),
            }),
        }
    }

    fn component_stack(&self) -> String {
        self.stack
            .iter()
            .rev()
            .map(|name| format!("\n    in {name}"))
            .collect()
    }

    fn nodes(&mut self, nodes: &[Node], env: &Env, depth: usize) -> Result<Vec<DomNode>, RenderError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            self.node(node, env, depth, &mut out)?;
        }
        Ok(out)
    }

    fn node(
        &mut self,
        node: &Node,
        env: &Env,
        depth: usize,
        out: &mut Vec<DomNode>,
    ) -> Result<(), RenderError> {
        match node {
            Node::Element(element) => {
                let children = self.nodes(&element.children, env, depth)?;
                out.push(DomNode::element(
                    element.tag.clone(),
                    element.properties.clone(),
                    children,
                ));
            }
            Node::Text(text) => out.push(DomNode::text(text.value.clone())),
            Node::Expression(expression) => {
                let value = self.eval(&expression.expression, env)?;
                out.extend(child_nodes(value)?);
            }
            Node::Jsx(jsx) => out.extend(self.jsx(jsx, env, depth)?),
        }
        Ok(())
    }

    fn jsx(&mut self, jsx: &JsxElement, env: &Env, depth: usize) -> Result<Vec<DomNode>, RenderError> {
        if jsx.name.is_empty() {
            return self.nodes(&jsx.children, env, depth);
        }
        if is_intrinsic(&jsx.name) {
            let attributes = self.dom_attributes(&jsx.attributes, env)?;
            let children = self.nodes(&jsx.children, env, depth)?;
            return Ok(vec![DomNode::element(jsx.name.clone(), attributes, children)]);
        }

        match self.resolve_component(&jsx.name, env)? {
            Value::Builtin(_) => self.nodes(&jsx.children, env, depth),
            Value::Local(name) => {
                let module = self.module;
                let def = module
                    .export(&name)
                    .ok_or_else(|| RenderError::MissingComponent(name.clone()))?;
                self.expand(def, jsx, env, depth)
            }
            Value::Function(_) => Ok(Vec::new()),
            other => Err(RenderError::InvalidElementType(other.type_name().to_string())),
        }
    }

    fn resolve_component(&self, name: &str, env: &Env) -> Result<Value, RenderError> {
        let missing = || RenderError::MissingComponent(name.to_string());
        let mut parts = name.split('.');
        let head = parts.next().unwrap_or_default();
        let mut value = self.lookup(head, env).ok_or_else(missing)?;
        for key in parts {
            value = value.member(key).map_err(RenderError::Type)?;
        }
        match value {
            Value::Undefined => Err(missing()),
            value => Ok(value),
        }
    }

    fn lookup(&self, name: &str, env: &Env) -> Option<Value> {
        if let Some(value) = env.get(name) {
            return Some(value.clone());
        }
        if self.module.export(name).is_some() {
            return Some(Value::Local(name.to_string()));
        }
        self.scope.get(name).cloned()
    }

    fn expand(
        &mut self,
        def: &ComponentDef,
        jsx: &JsxElement,
        env: &Env,
        depth: usize,
    ) -> Result<Vec<DomNode>, RenderError> {
        if depth + 1 > self.max_depth {
            return Err(RenderError::DepthExceeded);
        }

        let mut props = Vec::with_capacity(jsx.attributes.len() + 1);
        for attribute in &jsx.attributes {
            let value = match &attribute.value {
                AttributeValue::Text(text) => Value::Str(text.clone()),
                AttributeValue::Implicit => Value::Bool(true),
                AttributeValue::Expression(expr) => self.eval(expr, env)?,
            };
            props.push((attribute.name.clone(), value));
        }
        let children = self.nodes(&jsx.children, env, depth)?;
        if !children.is_empty() {
            props.push(("children".to_string(), Value::Nodes(children)));
        }

        let mut inner = Env::default();
        match &def.params {
            Params::None => {}
            Params::Props(name) => inner.bind(name.clone(), Value::Object(props)),
            Params::Destructured(fields) => {
                for (name, default) in fields {
                    let value = match lookup(&props, name) {
                        Some(value) if *value != Value::Undefined => value.clone(),
                        _ => match default {
                            Some(expr) => self.eval(expr, &Env::default())?,
                            None => Value::Undefined,
                        },
                    };
                    inner.bind(name.clone(), value);
                }
            }
        }

        self.stack.push(def.name.clone());
        let rendered = self.nodes(&def.body, &inner, depth + 1)?;
        self.stack.pop();
        Ok(rendered)
    }

    fn eval(&self, expr: &Expr, env: &Env) -> Result<Value, RenderError> {
        Ok(match expr {
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Number(n) => Value::Number(*n),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null => Value::Null,
            Expr::Undefined | Expr::Empty => Value::Undefined,
            Expr::Identifier(name) => self
                .lookup(name, env)
                .ok_or_else(|| RenderError::Reference(name.clone()))?,
            Expr::Member(object, key) => self
                .eval(object, env)?
                .member(key)
                .map_err(RenderError::Type)?,
            Expr::Object(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    values.push((key.clone(), self.eval(value, env)?));
                }
                Value::Object(values)
            }
        })
    }

    fn dom_attributes(
        &self,
        attributes: &[JsxAttribute],
        env: &Env,
    ) -> Result<Vec<(String, String)>, RenderError> {
        let mut out = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let name = match attribute.name.as_str() {
                "key" | "ref" | "children" => continue,
                "className" => "class",
                "htmlFor" => "for",
                other => other,
            };
            let value = match &attribute.value {
                AttributeValue::Text(text) => Some(text.clone()),
                AttributeValue::Implicit => Some(String::new()),
                AttributeValue::Expression(expr) => {
                    attribute_text(name, self.eval(expr, env)?)
                }
            };
            if let Some(value) = value {
                out.push((name.to_string(), value));
            }
        }
        Ok(out)
    }
}

fn is_intrinsic(name: &str) -> bool {
    !name.contains('.') && name.starts_with(|c: char| c.is_ascii_lowercase())
}

fn is_enumerated(name: &str) -> bool {
    name.starts_with("data-") || name.starts_with("aria-")
}

fn attribute_text(name: &str, value: Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s),
        Value::Number(n) => Some(format_number(n)),
        Value::Bool(true) if is_enumerated(name) => Some("true".to_string()),
        Value::Bool(false) if is_enumerated(name) => Some("false".to_string()),
        Value::Bool(true) => Some(String::new()),
        Value::Object(entries) if name == "style" => Some(style_text(&entries)),
        Value::Object(_) | Value::Namespace(_) => Some("[object Object]".to_string()),
        _ => None,
    }
}

/// CSS declaration text for a style object, e.g. `color:red;font-size:12px`.
pub fn style_text(entries: &[(String, Value)]) -> String {
    let mut declarations = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let text = match value {
            Value::Str(s) => s.clone(),
            Value::Number(n) if *n == 0.0 || key.starts_with("--") => format_number(*n),
            Value::Number(n) if UNITLESS_PROPERTIES.contains(&key.as_str()) => format_number(*n),
            Value::Number(n) => format!("{}px", format_number(*n)),
            _ => continue,
        };
        declarations.push(format!("{}:{text}", css_property(key)));
    }
    declarations.join(";")
}

fn css_property(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    out
}

fn child_nodes(value: Value) -> Result<Vec<DomNode>, RenderError> {
    Ok(match value {
        Value::Str(s) => vec![DomNode::Text(s)],
        Value::Number(n) => vec![DomNode::Text(format_number(n))],
        Value::Nodes(nodes) => nodes,
        Value::Object(entries) => {
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            return Err(RenderError::InvalidChild(format!(
                "object with keys {{{}}}",
                keys.join(", ")
            )));
        }
        Value::Namespace(namespace) => {
            let keys: Vec<&str> = namespace.names().collect();
            return Err(RenderError::InvalidChild(format!(
                "object with keys {{{}}}",
                keys.join(", ")
            )));
        }
        Value::Undefined
        | Value::Null
        | Value::Bool(_)
        | Value::Builtin(_)
        | Value::Local(_)
        | Value::Function(_) => Vec::new(),
    })
}
