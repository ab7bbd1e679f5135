// ABOUTME: Document compiler turning cleaned content into a renderable component
// ABOUTME: CompileService runs compilations off-thread and commits only the newest result

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parallax_events::EventBus;
use parallax_events::document::{CompileStatus, Event as DocumentEvent};
use parallax_logging::{PerfTimer, debug, info, warn};
use parallax_types::{CompilerConfig, ImportRecord};
use tokio::task::JoinHandle;

use crate::annotate::{SourceLineAnnotator, TreeVisitor};
use crate::error::{CompileError, RenderError, RenderFailure};
use crate::imports::{self, CleanedSource};
use crate::markup;
use crate::render::{DomNode, Renderer};
use crate::scope::{EvaluationScope, Namespace, Value};
use crate::tree::Module;

/// What kind of failure an [`ErrorDisplay`] shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisplayKind {
    UnsupportedImports,
    Exception,
}

/// Preformatted error view shown in place of a document that failed to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDisplay {
    kind: ErrorDisplayKind,
    message: String,
}

impl ErrorDisplay {
    pub fn unsupported_imports(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorDisplayKind::UnsupportedImports,
            message: message.into(),
        }
    }

    /// Display the string form of any error.
    pub fn exception(error: &dyn fmt::Display) -> Self {
        Self {
            kind: ErrorDisplayKind::Exception,
            message: error.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorDisplayKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_dom(&self) -> DomNode {
        DomNode::element(
            "pre",
            vec![("style".to_string(), "color:red".to_string())],
            vec![DomNode::text(self.message.clone())],
        )
    }
}

/// A successfully compiled document, ready to render
#[derive(Debug)]
pub struct CompiledComponent {
    module: Module,
    scope: EvaluationScope,
    max_depth: usize,
}

impl CompiledComponent {
    /// Render the document with the given top-level props.
    pub fn render(&self, props: &[(String, Value)]) -> Result<DomNode, RenderError> {
        self.render_traced(props).map_err(|failure| failure.error)
    }

    /// Render and report the component stack on failure.
    pub fn render_traced(&self, props: &[(String, Value)]) -> Result<DomNode, RenderFailure> {
        Renderer::new(&self.module, &self.scope, self.max_depth).render(props)
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn scope(&self) -> &EvaluationScope {
        &self.scope
    }

    /// Names of components the document exports itself.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.module.exports.iter().map(|def| def.name.as_str())
    }
}

/// Result of one compilation, or the placeholder shown before the first one
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    Loading,
    Compiled(Arc<CompiledComponent>),
    Failed(ErrorDisplay),
}

impl CompileOutcome {
    /// Render whatever this outcome shows. Only a compiled document can fail.
    pub fn render(&self) -> Result<DomNode, RenderFailure> {
        match self {
            CompileOutcome::Loading => Ok(DomNode::element(
                "div",
                Vec::new(),
                vec![DomNode::text("Loading...")],
            )),
            CompileOutcome::Compiled(component) => component.render_traced(&[]),
            CompileOutcome::Failed(display) => Ok(display.to_dom()),
        }
    }

    pub fn status(&self) -> Option<CompileStatus> {
        match self {
            CompileOutcome::Loading => None,
            CompileOutcome::Compiled(_) => Some(CompileStatus::Succeeded),
            CompileOutcome::Failed(display) => Some(match display.kind() {
                ErrorDisplayKind::UnsupportedImports => CompileStatus::UnsupportedImports,
                ErrorDisplayKind::Exception => CompileStatus::Failed,
            }),
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, CompileOutcome::Compiled(_))
    }
}

/// Parses, annotates and binds cleaned document content
#[derive(Debug, Clone)]
pub struct DocumentCompiler {
    config: CompilerConfig,
    namespace: Arc<Namespace>,
}

impl Default for DocumentCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl DocumentCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        let config = config.sanitized();
        let namespace = Namespace::framework_at(&config.framework_source);
        Self { config, namespace }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile on the current thread.
    pub fn compile_now(
        &self,
        cleaned: &str,
        imports: &[ImportRecord],
    ) -> Result<CompiledComponent, CompileError> {
        let offending = imports::unsupported(imports, &self.config.framework_source);
        if !offending.is_empty() {
            return Err(CompileError::UnsupportedImports {
                document: self.config.document_label.clone(),
                sources: offending.into_iter().map(str::to_string).collect(),
                allowed: self.config.framework_source.clone(),
            });
        }

        let scope = EvaluationScope::build(&self.namespace, imports, self.config.alias_binding);
        let module = markup::parse(cleaned)?;
        let module = Module {
            content: SourceLineAnnotator.visit(module.content),
            exports: module.exports,
        };

        Ok(CompiledComponent {
            module,
            scope,
            max_depth: self.config.max_render_depth,
        })
    }

    /// Compile on the blocking pool.
    pub async fn compile(&self, cleaned: String, imports: Vec<ImportRecord>) -> CompileOutcome {
        let timer = PerfTimer::new("compile");
        let compiler = self.clone();
        let result =
            tokio::task::spawn_blocking(move || compiler.compile_now(&cleaned, &imports)).await;
        let outcome = match result {
            Ok(result) => Self::outcome(result),
            Err(join_error) => {
                warn!(error = %join_error, "Compilation task did not complete");
                CompileOutcome::Failed(ErrorDisplay::exception(&join_error))
            }
        };
        timer.finish();
        outcome
    }

    /// Map a compile result onto what the preview shows.
    pub fn outcome(result: Result<CompiledComponent, CompileError>) -> CompileOutcome {
        match result {
            Ok(component) => CompileOutcome::Compiled(Arc::new(component)),
            Err(error @ CompileError::UnsupportedImports { .. }) => {
                info!(error = %error, "Rejected document imports");
                CompileOutcome::Failed(ErrorDisplay::unsupported_imports(error.to_string()))
            }
            Err(error) => {
                debug!(error = %error, "Compilation failed");
                CompileOutcome::Failed(ErrorDisplay::exception(&error))
            }
        }
    }
}

/// The last committed compilation
#[derive(Debug, Clone)]
pub struct CompiledState {
    pub generation: u64,
    pub revision: u64,
    pub outcome: CompileOutcome,
}

/// What happened to a finished compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    Committed { generation: u64 },
    Discarded { generation: u64, current: u64 },
}

/// Runs compilations asynchronously and keeps only the newest result.
///
/// Every request takes a new generation. A result is committed only if no
/// newer request was made while it ran.
#[derive(Clone)]
pub struct CompileService {
    compiler: Arc<DocumentCompiler>,
    generation: Arc<AtomicU64>,
    slot: Arc<ArcSwap<CompiledState>>,
    event_bus: Option<Arc<dyn EventBus + Send + Sync>>,
}

impl CompileService {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            compiler: Arc::new(DocumentCompiler::new(config)),
            generation: Arc::new(AtomicU64::new(0)),
            slot: Arc::new(ArcSwap::from_pointee(CompiledState {
                generation: 0,
                revision: 0,
                outcome: CompileOutcome::Loading,
            })),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus + Send + Sync>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn compiler(&self) -> &DocumentCompiler {
        &self.compiler
    }

    /// Latest committed state.
    pub fn current(&self) -> Arc<CompiledState> {
        self.slot.load_full()
    }

    /// Generation of the most recent request.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Strip imports from `content` and compile it in the background.
    pub fn request(&self, content: &str, revision: u64) -> JoinHandle<CommitResult> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, revision, "Compilation requested");
        if let Some(bus) = &self.event_bus {
            bus.dispatch_document(DocumentEvent::CompileRequested { generation });
        }

        let service = self.clone();
        let content = content.to_string();
        tokio::spawn(async move {
            let CleanedSource { cleaned, imports } = imports::clean(&content);
            let outcome = service.compiler.compile(cleaned, imports).await;
            service.commit(generation, revision, outcome)
        })
    }

    fn commit(&self, generation: u64, revision: u64, outcome: CompileOutcome) -> CommitResult {
        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            debug!(generation, current, "Discarding stale compilation");
            self.dispatch(DocumentEvent::CompileDiscarded {
                generation,
                current,
            });
            return CommitResult::Discarded {
                generation,
                current,
            };
        }

        let status = outcome.status();
        let previous = self.slot.rcu(|state| {
            if state.generation > generation {
                Arc::clone(state)
            } else {
                Arc::new(CompiledState {
                    generation,
                    revision,
                    outcome: outcome.clone(),
                })
            }
        });
        if previous.generation > generation {
            let current = previous.generation;
            debug!(generation, current, "Discarding stale compilation");
            self.dispatch(DocumentEvent::CompileDiscarded {
                generation,
                current,
            });
            return CommitResult::Discarded {
                generation,
                current,
            };
        }

        if let Some(status) = status {
            self.dispatch(DocumentEvent::Compiled { generation, status });
        }
        CommitResult::Committed { generation }
    }

    fn dispatch(&self, event: DocumentEvent) {
        if let Some(bus) = &self.event_bus {
            bus.dispatch_document(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::SOURCE_LINE_ATTRIBUTE;
    use parallax_events::{preview, scroll};
    use parallax_types::AliasBinding;
    use std::sync::Mutex;

    fn compile(src: &str) -> Result<CompiledComponent, CompileError> {
        let CleanedSource { cleaned, imports } = imports::clean(src);
        DocumentCompiler::default().compile_now(&cleaned, &imports)
    }

    #[derive(Default)]
    struct RecordingBus {
        events: Mutex<Vec<DocumentEvent>>,
    }

    impl EventBus for RecordingBus {
        fn dispatch_document(&self, event: DocumentEvent) {
            self.events.lock().unwrap().push(event);
        }
        fn dispatch_preview(&self, _event: preview::Event) {}
        fn dispatch_scroll(&self, _event: scroll::Event) {}
    }

    #[test]
    fn test_unsupported_imports_message() {
        let err = compile("import { Chart } from 'other-lib'\nimport x from \"more\"\nimport y from 'other-lib'\n\n# Hi")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported imports in MDX: other-lib, more. Only imports from 'react' are supported in-browser."
        );
    }

    #[test]
    fn test_unsupported_imports_skip_parsing() {
        let err = compile("import { Chart } from 'other-lib'\n\n{not valid +}").unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedImports { .. }));
    }

    #[test]
    fn test_crlf_foreign_import_is_rejected() {
        let err = compile("import { useState } from \"other-lib\"\r\n\r\n# Hi\r\n").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedImports {
                document: "MDX".to_string(),
                sources: vec!["other-lib".to_string()],
                allowed: "react".to_string(),
            }
        );
    }

    #[test]
    fn test_compiled_document_is_annotated() {
        let src = "import { Fragment } from 'react'\n\n# Title\n\nBody";
        let component = compile(src).unwrap();
        let dom = component.render(&[]).unwrap();
        let lines: Vec<&str> = dom
            .children()
            .iter()
            .filter_map(|node| node.attribute(SOURCE_LINE_ATTRIBUTE))
            .collect();
        assert_eq!(lines, vec!["3", "5"]);
    }

    #[test]
    fn test_parse_errors_become_displays() {
        let outcome = DocumentCompiler::outcome(compile("<Note>\nunclosed"));
        let CompileOutcome::Failed(display) = outcome else {
            panic!("expected a failure");
        };
        assert_eq!(display.kind(), ErrorDisplayKind::Exception);
        assert_eq!(display.message(), "1:1: Expected a closing tag for `<Note>`");
        assert_eq!(
            display.to_dom().to_html(),
            "<pre style=\"color:red\">1:1: Expected a closing tag for `&lt;Note&gt;`</pre>"
        );
    }

    #[test]
    fn test_configured_alias_binding() {
        let compiler = DocumentCompiler::new(CompilerConfig {
            alias_binding: AliasBinding::Original,
            ..Default::default()
        });
        let imports = vec![ImportRecord::new("{ Fragment as F }", "react")];
        let component = compiler.compile_now("<F>x</F>", &imports).unwrap();
        assert!(matches!(
            component.render(&[]),
            Err(RenderError::MissingComponent(name)) if name == "F"
        ));
    }

    #[test]
    fn test_loading_placeholder() {
        let html = CompileOutcome::Loading.render().unwrap().to_html();
        assert_eq!(html, "<div>Loading...</div>");
        assert_eq!(CompileOutcome::Loading.status(), None);
    }

    #[tokio::test]
    async fn test_async_compile() {
        let outcome = DocumentCompiler::default()
            .compile("# Hi".to_string(), Vec::new())
            .await;
        assert!(outcome.is_compiled());
        assert_eq!(outcome.status(), Some(CompileStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_service_commits_latest_request() {
        let bus = Arc::new(RecordingBus::default());
        let service = CompileService::new(CompilerConfig::default()).with_event_bus(bus.clone());
        assert!(matches!(service.current().outcome, CompileOutcome::Loading));

        let first = service.request("# One", 1);
        let second = service.request("import x from 'nope'\n# Two", 2);

        assert_eq!(
            first.await.unwrap(),
            CommitResult::Discarded {
                generation: 1,
                current: 2
            }
        );
        assert_eq!(
            second.await.unwrap(),
            CommitResult::Committed { generation: 2 }
        );

        let state = service.current();
        assert_eq!((state.generation, state.revision), (2, 2));
        assert_eq!(state.outcome.status(), Some(CompileStatus::UnsupportedImports));

        let events = bus.events.lock().unwrap();
        assert!(events.contains(&DocumentEvent::CompileDiscarded {
            generation: 1,
            current: 2
        }));
        assert!(events.contains(&DocumentEvent::Compiled {
            generation: 2,
            status: CompileStatus::UnsupportedImports
        }));
    }

    #[tokio::test]
    async fn test_service_single_request_commits() {
        let service = CompileService::new(CompilerConfig::default());
        let result = service.request("Hello *world*", 7).await.unwrap();
        assert_eq!(result, CommitResult::Committed { generation: 1 });
        assert!(service.current().outcome.is_compiled());
        assert_eq!(service.latest_generation(), 1);
    }
}
