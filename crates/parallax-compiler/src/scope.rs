// ABOUTME: Runtime values, the framework namespace and the per-compilation evaluation scope
// ABOUTME: Import bindings are resolved against the namespace and layered over its exports

use parallax_types::{AliasBinding, ImportRecord};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::imports::{ImportBinding, parse_bindings};
use crate::render::DomNode;

/// Name the top-level framework object is bound under
pub const FRAMEWORK_OBJECT_NAME: &str = "React";

/// Framework version reported through the namespace
pub const FRAMEWORK_VERSION: &str = "18.3.1";

/// Components built into the framework namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinComponent {
    Fragment,
    StrictMode,
    Suspense,
    Profiler,
}

/// A value an expression can evaluate to
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Object literal or props; later entries win on lookup
    Object(Vec<(String, Value)>),
    /// Already rendered nodes, as passed through `children`
    Nodes(Vec<DomNode>),
    Builtin(BuiltinComponent),
    /// A component exported by the document itself
    Local(String),
    /// A framework function such as a hook; renders nothing
    Function(&'static str),
    Namespace(Arc<Namespace>),
}

impl Value {
    /// JavaScript `typeof`-style name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) | Value::Nodes(_) | Value::Namespace(_) => "object",
            Value::Builtin(_) | Value::Local(_) | Value::Function(_) => "function",
        }
    }

    /// Read `key` from this value the way a property access would.
    pub fn member(&self, key: &str) -> Result<Value, String> {
        match self {
            Value::Undefined | Value::Null => Err(format!(
                "Cannot read properties of {} (reading '{key}')",
                self.type_name()
            )),
            Value::Object(entries) => Ok(lookup(entries, key).cloned().unwrap_or(Value::Undefined)),
            Value::Namespace(namespace) => Ok(namespace.get(key).unwrap_or(Value::Undefined)),
            Value::Str(s) if key == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::Nodes(nodes) if key == "length" => Ok(Value::Number(nodes.len() as f64)),
            _ => Ok(Value::Undefined),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s}"),
            Value::Object(_) | Value::Namespace(_) => write!(f, "[object Object]"),
            Value::Nodes(_) => write!(f, "[object Array]"),
            Value::Builtin(_) | Value::Local(_) | Value::Function(_) => write!(f, "function"),
        }
    }
}

/// Find `key` in ordered object entries; the last occurrence wins.
pub fn lookup<'v>(entries: &'v [(String, Value)], key: &str) -> Option<&'v Value> {
    entries
        .iter()
        .rev()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value)
}

/// Format a number the way JavaScript string conversion does for common values.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// An external module's exports
#[derive(Debug, PartialEq)]
pub struct Namespace {
    source: String,
    exports: BTreeMap<String, Value>,
}

static FRAMEWORK: LazyLock<Arc<Namespace>> = LazyLock::new(|| Arc::new(Namespace::build_framework()));

const FRAMEWORK_FUNCTIONS: &[&str] = &[
    "Children",
    "Component",
    "PureComponent",
    "cloneElement",
    "createContext",
    "createElement",
    "createRef",
    "forwardRef",
    "isValidElement",
    "jsx",
    "jsxs",
    "lazy",
    "memo",
    "startTransition",
    "useCallback",
    "useContext",
    "useDebugValue",
    "useDeferredValue",
    "useEffect",
    "useId",
    "useImperativeHandle",
    "useInsertionEffect",
    "useLayoutEffect",
    "useMemo",
    "useReducer",
    "useRef",
    "useState",
    "useSyncExternalStore",
    "useTransition",
];

impl Namespace {
    /// The shared framework namespace.
    pub fn framework() -> Arc<Namespace> {
        FRAMEWORK.clone()
    }

    /// The framework namespace published under a different import source.
    pub fn framework_at(source: &str) -> Arc<Namespace> {
        if source == FRAMEWORK.source {
            return FRAMEWORK.clone();
        }
        Arc::new(Namespace {
            source: source.to_string(),
            exports: FRAMEWORK.exports.clone(),
        })
    }

    fn build_framework() -> Self {
        let mut exports = BTreeMap::new();
        for (name, component) in [
            ("Fragment", BuiltinComponent::Fragment),
            ("StrictMode", BuiltinComponent::StrictMode),
            ("Suspense", BuiltinComponent::Suspense),
            ("Profiler", BuiltinComponent::Profiler),
        ] {
            exports.insert(name.to_string(), Value::Builtin(component));
        }
        for name in FRAMEWORK_FUNCTIONS {
            exports.insert((*name).to_string(), Value::Function(*name));
        }
        exports.insert(
            "version".to_string(),
            Value::Str(FRAMEWORK_VERSION.to_string()),
        );
        Self {
            source: parallax_types::config::DEFAULT_FRAMEWORK_SOURCE.to_string(),
            exports,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.exports.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

/// Identifier bindings visible to a compiled document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationScope {
    bindings: BTreeMap<String, Value>,
}

impl EvaluationScope {
    /// Framework exports plus the framework object, overlaid with import bindings.
    pub fn build(
        namespace: &Arc<Namespace>,
        imports: &[ImportRecord],
        alias_binding: AliasBinding,
    ) -> Self {
        let mut bindings: BTreeMap<String, Value> = namespace
            .exports
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.insert(
            FRAMEWORK_OBJECT_NAME.to_string(),
            Value::Namespace(namespace.clone()),
        );

        for record in imports.iter().filter(|r| r.source == namespace.source) {
            for binding in parse_bindings(&record.specifier) {
                match binding {
                    ImportBinding::Named { imported, local } => {
                        let value = namespace.get(&imported).unwrap_or(Value::Undefined);
                        let name = match alias_binding {
                            AliasBinding::Alias => local,
                            AliasBinding::Original => imported,
                        };
                        bindings.insert(name, value);
                    }
                    ImportBinding::Namespace(local) | ImportBinding::Default(local) => {
                        bindings.insert(local, Value::Namespace(namespace.clone()));
                    }
                }
            }
        }

        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
