// ABOUTME: Document compilation pipeline for Parallax (Layer 4)
// ABOUTME: Style extraction, import gating, markup parsing, annotation and rendering

pub mod annotate;
pub mod compiler;
pub mod error;
pub mod imports;
pub mod markup;
pub mod render;
pub mod scope;
pub mod style;
pub mod tree;

pub use annotate::{SOURCE_LINE_ATTRIBUTE, SourceLineAnnotator, TreeVisitor};
pub use compiler::{
    CommitResult, CompileOutcome, CompileService, CompiledComponent, CompiledState,
    DocumentCompiler, ErrorDisplay, ErrorDisplayKind,
};
pub use error::{CompileError, RenderError, RenderFailure};
pub use imports::{CleanedSource, clean, unsupported};
pub use render::DomNode;
pub use scope::{EvaluationScope, Namespace, Value};
pub use style::{StyleExtraction, extract};
