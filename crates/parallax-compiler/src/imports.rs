// ABOUTME: Strips top-level import declarations and checks where they come from
// ABOUTME: Parses binding clauses so permitted imports can be bound in the evaluation scope

use parallax_types::ImportRecord;
use regex::Regex;
use std::sync::LazyLock;

use crate::style::newline_count;

static IMPORT_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import[ \t\r\n]+([\s\S]*?)[ \t\r\n]+from[ \t]*['"]([^'"\r\n]+)['"][ \t]*;?[ \t]*\r?$"#)
        .expect("Invalid import declaration regex")
});

/// Content with its import declarations removed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanedSource {
    pub cleaned: String,
    pub imports: Vec<ImportRecord>,
}

/// Remove every top-level `import ... from '...'` declaration.
///
/// Each declaration is replaced by the newlines it spanned so the cleaned
/// text has the same line count as the input.
pub fn clean(content: &str) -> CleanedSource {
    let mut cleaned = String::with_capacity(content.len());
    let mut imports = Vec::new();
    let mut last = 0;

    for captures in IMPORT_DECLARATION.captures_iter(content) {
        let (Some(declaration), Some(specifier), Some(source)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            continue;
        };
        imports.push(ImportRecord::new(
            specifier.as_str().trim(),
            source.as_str().trim(),
        ));

        cleaned.push_str(&content[last..declaration.start()]);
        cleaned.extend(std::iter::repeat_n('\n', newline_count(declaration.as_str())));
        last = declaration.end();
    }
    cleaned.push_str(&content[last..]);

    CleanedSource { cleaned, imports }
}

/// Distinct import sources other than `allowed`, in first-seen order.
pub fn unsupported<'a>(imports: &'a [ImportRecord], allowed: &str) -> Vec<&'a str> {
    let mut offending: Vec<&str> = Vec::new();
    for record in imports {
        let source = record.source.as_str();
        if source != allowed && !offending.contains(&source) {
            offending.push(source);
        }
    }
    offending
}

/// One name introduced by an import clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `{ imported as local }`, or `{ name }` where both are the same
    Named { imported: String, local: String },
    /// `* as local`
    Namespace(String),
    /// `local` (default import)
    Default(String),
}

/// Parse an import clause such as `React, { useState as useLocal }`.
///
/// Clauses that cannot be understood produce no bindings.
pub fn parse_bindings(clause: &str) -> Vec<ImportBinding> {
    let clause = clause.trim();
    if clause.is_empty() {
        return Vec::new();
    }

    if let Some(open) = clause.find('{') {
        let Some(close) = clause.rfind('}').filter(|close| *close > open) else {
            return Vec::new();
        };

        let mut bindings = Vec::new();
        let head = clause[..open].trim().trim_end_matches(',').trim();
        if is_identifier(head) {
            bindings.push(ImportBinding::Default(head.to_string()));
        } else if !head.is_empty() {
            return Vec::new();
        }
        bindings.extend(parse_named(&clause[open + 1..close]));
        return bindings;
    }

    if let Some(rest) = clause.strip_prefix('*') {
        return match rest.trim().strip_prefix("as") {
            Some(name) if is_identifier(name.trim()) => {
                vec![ImportBinding::Namespace(name.trim().to_string())]
            }
            _ => Vec::new(),
        };
    }

    if let Some((default, rest)) = clause.split_once(',') {
        let default = default.trim();
        let mut bindings = Vec::new();
        if is_identifier(default) {
            bindings.push(ImportBinding::Default(default.to_string()));
        }
        bindings.extend(parse_bindings(rest));
        return bindings;
    }

    if is_identifier(clause) {
        return vec![ImportBinding::Default(clause.to_string())];
    }

    Vec::new()
}

fn parse_named(list: &str) -> Vec<ImportBinding> {
    list.split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let imported = parts.next()?;
            let local = match (parts.next(), parts.next()) {
                (Some("as"), Some(alias)) => alias,
                (None, None) => imported,
                _ => return None,
            };
            (is_identifier(imported) && is_identifier(local)).then(|| ImportBinding::Named {
                imported: imported.to_string(),
                local: local.to_string(),
            })
        })
        .collect()
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_types::line_count;

    #[test]
    fn test_clean_strips_and_records() {
        let content = "import { Chart } from 'other-lib'\nimport React from \"react\";\n# Title";
        let result = clean(content);

        assert_eq!(result.cleaned, "\n\n# Title");
        assert_eq!(
            result.imports,
            vec![
                ImportRecord::new("{ Chart }", "other-lib"),
                ImportRecord::new("React", "react"),
            ]
        );
    }

    #[test]
    fn test_multiline_import_keeps_line_count() {
        let content = "import {\n  useState,\n  useMemo\n} from 'react'\nText on line 5";
        let result = clean(content);

        assert_eq!(line_count(&result.cleaned), line_count(content));
        assert_eq!(result.cleaned.lines().nth(4), Some("Text on line 5"));
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "react");
    }

    #[test]
    fn test_line_count_preserved_across_layouts() {
        // (content, sources, text expected on the last line)
        let cases = [
            (
                "import { useState } from \"other-lib\"\r\n\r\n# Hi\r\n",
                vec!["other-lib"],
                "",
            ),
            (
                "  import {\n    useState,\n    useMemo\n  } from 'react';\nafter",
                vec!["react"],
                "after",
            ),
            (
                "import {\r\n  Fragment\r\n} from 'react' ;\r\nafter",
                vec!["react"],
                "after",
            ),
            (
                "import a from 'react'\nimport b from 'react'\nimport c from 'x'",
                vec!["react", "react", "x"],
                "",
            ),
        ];

        for (content, sources, last_line) in cases {
            let result = clean(content);
            let found: Vec<&str> = result.imports.iter().map(|r| r.source.as_str()).collect();
            assert_eq!(found, sources, "{content:?}");
            assert_eq!(line_count(&result.cleaned), line_count(content), "{content:?}");
            assert_eq!(
                result.cleaned.split('\n').next_back().map(|l| l.trim_end_matches('\r')),
                Some(last_line),
                "{content:?}"
            );
            assert!(!result.cleaned.contains("import"), "{content:?}");
        }
    }

    #[test]
    fn test_crlf_import_clause_is_trimmed() {
        let result = clean("import {\r\n  useState\r\n} from 'react'\r\n");
        assert_eq!(
            parse_bindings(&result.imports[0].specifier),
            vec![ImportBinding::Named {
                imported: "useState".into(),
                local: "useState".into()
            }]
        );
    }

    #[test]
    fn test_imports_inside_text_are_left_alone() {
        let content = "You can import things from 'anywhere' in prose.";
        let result = clean(content);
        assert_eq!(result.cleaned, content);
        assert!(result.imports.is_empty());
    }

    #[test]
    fn test_unsupported_sources_are_distinct_and_ordered() {
        let imports = vec![
            ImportRecord::new("{ a }", "other-lib"),
            ImportRecord::new("React", "react"),
            ImportRecord::new("b", "./local"),
            ImportRecord::new("{ c }", "other-lib"),
        ];
        assert_eq!(unsupported(&imports, "react"), vec!["other-lib", "./local"]);
        assert!(unsupported(&imports[1..2], "react").is_empty());
    }

    #[test]
    fn test_parse_bindings_forms() {
        assert_eq!(
            parse_bindings("{ useState, useMemo as memo, }"),
            vec![
                ImportBinding::Named {
                    imported: "useState".into(),
                    local: "useState".into()
                },
                ImportBinding::Named {
                    imported: "useMemo".into(),
                    local: "memo".into()
                },
            ]
        );
        assert_eq!(
            parse_bindings("* as R"),
            vec![ImportBinding::Namespace("R".into())]
        );
        assert_eq!(
            parse_bindings("React"),
            vec![ImportBinding::Default("React".into())]
        );
        assert_eq!(
            parse_bindings("React, { Fragment }"),
            vec![
                ImportBinding::Default("React".into()),
                ImportBinding::Named {
                    imported: "Fragment".into(),
                    local: "Fragment".into()
                },
            ]
        );
        assert_eq!(
            parse_bindings("React, * as All"),
            vec![
                ImportBinding::Default("React".into()),
                ImportBinding::Namespace("All".into()),
            ]
        );
    }

    #[test]
    fn test_unparseable_clauses_bind_nothing() {
        assert!(parse_bindings("").is_empty());
        assert!(parse_bindings("{ }").is_empty());
        assert!(parse_bindings("* React").is_empty());
        assert!(parse_bindings("not valid here").is_empty());
        assert!(parse_bindings("'side-effect'").is_empty());
    }
}
