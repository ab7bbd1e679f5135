// ABOUTME: End-to-end scenarios across compiling, anchoring and scroll synchronization
// ABOUTME: Drives a live session through stand-in editor and preview surfaces

use parallax::{ParallaxConfig, check, render};
use parallax_compiler::CompileError;
use parallax_core::{EditorSurface, PreviewSurface, RenderedSurface};
use parallax_editor::{LiveSession, SyncOutcome, recompute};
use parallax_types::LineRange;
use std::io::Write;
use std::time::Duration;

/// Rendered tree with a heading at line 1 and a second block at line 50
struct TwoBlocks;

impl RenderedSurface for TwoBlocks {
    fn stamped_offsets(&self) -> Vec<(String, f32)> {
        vec![("1".to_string(), 0.0), ("50".to_string(), 2000.0)]
    }
}

#[derive(Default)]
struct Editor {
    first_visible: usize,
    revealed: Vec<usize>,
}

impl EditorSurface for Editor {
    fn visible_ranges(&self) -> Option<Vec<LineRange>> {
        Some(vec![LineRange::new(self.first_visible, self.first_visible + 30)])
    }

    fn reveal_line_near_top(&mut self, line: usize) {
        self.revealed.push(line);
    }
}

#[derive(Default)]
struct Preview {
    top: f32,
}

impl PreviewSurface for Preview {
    fn scroll_top(&self) -> f32 {
        self.top
    }

    fn scroll_to(&mut self, offset: f32) {
        self.top = offset;
    }
}

fn eighty_line_document() -> String {
    let mut lines = vec!["# Introduction".to_string()];
    lines.extend((2..50).map(|_| String::new()));
    lines.push("## Details".to_string());
    lines.extend((51..=80).map(|n| if n % 2 == 0 { String::new() } else { format!("line {n}") }));
    lines.join("\n")
}

#[test]
fn anchors_carry_forward_between_stamps() {
    let table = recompute(&TwoBlocks, 80);
    assert_eq!(table.len(), 80);
    for line in 1..=49 {
        assert_eq!(table.offset_for_line(line), Some(0.0), "line {line}");
    }
    for line in 50..=80 {
        assert_eq!(table.offset_for_line(line), Some(2000.0), "line {line}");
    }
}

#[tokio::test(start_paused = true)]
async fn editor_and_preview_drive_each_other() {
    let mut session = LiveSession::new(ParallaxConfig::default().session_config());
    session.set_raw(eighty_line_document()).await.unwrap();
    assert_eq!(session.document().line_count(), 80);
    session.refresh_anchors(&TwoBlocks, None);

    let mut editor = Editor {
        first_visible: 50,
        ..Default::default()
    };
    let mut preview = Preview::default();

    let outcome = session.on_editor_scroll(&editor, &mut preview);
    assert_eq!(
        outcome,
        SyncOutcome::Driven {
            line: 50,
            offset: 2000.0
        }
    );
    assert_eq!(preview.top, 2000.0);

    // The preview's own scroll event echoes back inside the window
    assert_eq!(
        session.on_preview_scroll(&mut editor, &preview),
        SyncOutcome::Suppressed
    );
    assert!(editor.revealed.is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    preview.top = 1000.0;
    assert_eq!(
        session.on_preview_scroll(&mut editor, &preview),
        SyncOutcome::Driven {
            line: 50,
            offset: 1000.0
        }
    );
    assert_eq!(editor.revealed, vec![50]);
}

#[tokio::test]
async fn foreign_imports_are_reported_without_evaluation() {
    let raw = "import { Chart } from 'other-lib'\n\n# Sales\n\n<Chart data={undefinedThing} />";

    let report = check(raw, &ParallaxConfig::default());
    let Some(CompileError::UnsupportedImports { sources, .. }) = &report.compile else {
        panic!("expected an unsupported import error, got {report:?}");
    };
    assert_eq!(sources, &vec!["other-lib".to_string()]);
    assert!(report.render.is_none());

    let html = render(raw, &ParallaxConfig::default()).await.unwrap().html;
    assert_eq!(
        html,
        "<pre style=\"color:red\">Unsupported imports in MDX: other-lib. Only imports from 'react' are supported in-browser.</pre>"
    );
}

#[tokio::test]
async fn crlf_foreign_imports_are_reported() {
    let raw = "import { useState } from \"other-lib\"\r\n\r\n# Hi\r\n";
    let output = render(raw, &ParallaxConfig::default()).await.unwrap();
    assert_eq!(
        output.html,
        "<pre style=\"color:red\">Unsupported imports in MDX: other-lib. Only imports from 'react' are supported in-browser.</pre>"
    );
    assert!(output.render_failures.is_empty());
}

#[tokio::test]
async fn full_document_renders_with_framework_imports() {
    let raw = "<style>\n.card { padding: 4px; }\n</style>\nimport { Fragment } from 'react'\n\nexport const Card = ({ title, children }) => (\n  <div className=\"card\">\n    <strong>{title}</strong>\n    {children}\n  </div>\n)\n\n# Report\n\n<Card title=\"Q1\">Numbers</Card>\n\n<Fragment>tail</Fragment>";

    assert!(check(raw, &ParallaxConfig::default()).is_ok());

    let html = render(raw, &ParallaxConfig::default()).await.unwrap().html;
    assert!(html.starts_with("<style>.card { padding: 4px; }</style>"));
    assert!(html.contains("<h1 data-source-line=\"13\">Report</h1>"));
    assert!(html.contains("<div class=\"card\"><strong>Q1</strong>Numbers</div>"));
    assert!(html.ends_with("tail"));
}

#[tokio::test]
async fn config_file_changes_document_label() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[compiler]\ndocument_label = \"Notebook\"").unwrap();
    let config = ParallaxConfig::load(Some(file.path())).unwrap();

    let report = check("import x from 'lodash'", &config);
    assert_eq!(
        report.diagnostics(),
        vec![
            "error: Unsupported imports in Notebook: lodash. Only imports from 'react' are supported in-browser."
                .to_string()
        ]
    );
}
