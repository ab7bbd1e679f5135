// ABOUTME: Error types for compiling and rendering documents
// ABOUTME: Compile errors carry source positions, render errors mirror runtime failures

use thiserror::Error;

/// Failure to turn document content into a component
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(
        "Unsupported imports in {document}: {}. Only imports from '{allowed}' are supported in-browser.",
        .sources.join(", ")
    )]
    UnsupportedImports {
        document: String,
        sources: Vec<String>,
        allowed: String,
    },

    #[error("{line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{line}:{column}: Could not parse expression `{expression}`: {message}")]
    Expression {
        line: usize,
        column: usize,
        expression: String,
        message: String,
    },

    #[error("{line}:{column}: {message}")]
    Export {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{line}:{column}: Dynamic `import()` is not supported, use a top-level import from the framework instead")]
    DynamicImport { line: usize, column: usize },
}

impl CompileError {
    /// Source position of the offending construct, when known.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            CompileError::UnsupportedImports { .. } => None,
            CompileError::Parse { line, column, .. }
            | CompileError::Expression { line, column, .. }
            | CompileError::Export { line, column, .. }
            | CompileError::DynamicImport { line, column } => Some((*line, *column)),
        }
    }
}

/// Failure while expanding a compiled component into DOM nodes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(
        "Expected component `{0}` to be defined: you likely forgot to import, pass, or provide it."
    )]
    MissingComponent(String),

    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    #[error("RangeError: Maximum call stack size exceeded")]
    DepthExceeded,

    #[error("TypeError: {0}")]
    Type(String),

    #[error(
        "Element type is invalid: expected a string (for built-in components) or a function (for composite components) but got: {0}."
    )]
    InvalidElementType(String),

    #[error(
        "Objects are not valid as a React child (found: {0}). If you meant to render a collection of children, use an array instead."
    )]
    InvalidChild(String),

    #[error("{0}")]
    Panicked(String),
}

/// A render error together with the component stack it happened in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct RenderFailure {
    pub error: RenderError,
    /// Innermost component first, one `    in Name` line each
    pub component_stack: String,
}
