//! Import classifier & renderer (component B).
//!
//! Classifies each import path into one of four ordered groups (Module,
//! Workspace, Stdlib, External), plus an always-separate, always-first
//! Cgo group for the `import "C"` foreign-function-interface directive,
//! then renders a single merged `import ( … )` block.
//!
//! Implemented as a regex-driven, line-oriented scan over import
//! statements, with no dependency on a full parse of the surrounding file.

use std::sync::OnceLock;

use regex::Regex;

/// Which of the five rendered groups an import path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportGroup {
    /// `import "C"`: always first, always its own group.
    Cgo,
    /// Standard library: first path segment has no dot.
    Stdlib,
    /// Third-party dependency.
    External,
    /// A sibling module in the same multi-module workspace.
    Workspace,
    /// This workspace's own module.
    Module,
}

/// A single import entry, already classified.
#[derive(Debug, Clone)]
pub struct ImportEntry {
    /// Optional alias: `.`, `_`, or a named alias.
    pub alias: Option<String>,
    /// The import path, without quotes.
    pub path: String,
    /// Trailing line comment, without the leading `//`, if any.
    pub comment: Option<String>,
}

/// Classify `path` into its rendering group. Classification
/// is total: every path maps to exactly one group.
pub fn classify(path: &str, module_path: Option<&str>, workspace_modules: &[String]) -> ImportGroup {
    if path == "C" {
        return ImportGroup::Cgo;
    }
    if let Some(module_path) = module_path {
        if path == module_path || path.starts_with(&format!("{}/", module_path)) {
            return ImportGroup::Module;
        }
    }
    for ws in workspace_modules {
        if path == ws || path.starts_with(&format!("{}/", ws)) {
            return ImportGroup::Workspace;
        }
    }
    let first_segment = path.split('/').next().unwrap_or(path);
    if !first_segment.contains('.') {
        return ImportGroup::Stdlib;
    }
    ImportGroup::External
}

/// Render a single `import ( … )` block from already-classified entries.
///
/// Groups appear in the fixed order Cgo, Stdlib, External, Workspace,
/// Module, separated by exactly one blank line; entries within a group
/// are sorted lexicographically by path. Returns an empty string if
/// `entries` is empty.
pub fn render_block(entries: &[ImportEntry], module_path: Option<&str>, workspace_modules: &[String]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut groups: [Vec<&ImportEntry>; 5] = Default::default();
    for e in entries {
        let group = classify(&e.path, module_path, workspace_modules);
        groups[group as usize].push(e);
    }
    for group in &mut groups {
        group.sort_by(|a, b| a.path.cmp(&b.path));
    }

    let mut out = String::from("import (\n");
    let mut first_group = true;
    for group in &groups {
        if group.is_empty() {
            continue;
        }
        if !first_group {
            out.push('\n');
        }
        first_group = false;
        for entry in group {
            out.push('\t');
            if let Some(alias) = &entry.alias {
                out.push_str(alias);
                out.push(' ');
            }
            out.push('"');
            out.push_str(&entry.path);
            out.push('"');
            if let Some(comment) = &entry.comment {
                out.push_str(" //");
                out.push_str(comment);
            }
            out.push('\n');
        }
    }
    out.push(')');
    out
}

fn single_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*import\s+(?:(\.|_|[A-Za-z_][A-Za-z0-9_]*)\s+)?"([^"]*)"\s*(//.*)?$"#)
            .expect("static regex is valid")
    })
}

fn block_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(?:(\.|_|[A-Za-z_][A-Za-z0-9_]*)\s+)?"([^"]*)"\s*(//.*)?$"#)
            .expect("static regex is valid")
    })
}

struct Span {
    start: usize,
    end: usize,
}

/// Scan `source` for every import construct (block or single-line),
/// returning the merged entries and the overall byte span they occupy
/// (from the start of the first `import` keyword to the end of the last
/// import construct). Returns `None` if the file has no import at all.
fn scan_imports(source: &str) -> Option<(Vec<ImportEntry>, Span)> {
    let mut entries = Vec::new();
    let mut span: Option<Span> = None;
    let mut offset = 0usize;
    let mut lines = source.split_inclusive('\n').peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        let line_start = offset;
        offset += line.len();

        if let Some(caps) = single_import_re().captures(trimmed) {
            entries.push(ImportEntry {
                alias: caps.get(1).map(|m| m.as_str().to_string()),
                path: caps[2].to_string(),
                comment: caps.get(3).map(|m| m.as_str()[2..].to_string()),
            });
            extend_span(&mut span, line_start, offset);
            continue;
        }

        if trimmed.trim_start().starts_with("import") && trimmed.trim_end().ends_with('(') {
            let block_start = line_start;
            let mut block_end = offset;
            for block_line in lines.by_ref() {
                let block_trimmed = block_line.trim_end_matches(['\n', '\r']);
                block_end += block_line.len();
                if block_trimmed.trim() == ")" {
                    break;
                }
                if block_trimmed.trim().is_empty() {
                    continue;
                }
                if let Some(caps) = block_entry_re().captures(block_trimmed) {
                    entries.push(ImportEntry {
                        alias: caps.get(1).map(|m| m.as_str().to_string()),
                        path: caps[2].to_string(),
                        comment: caps.get(3).map(|m| m.as_str()[2..].to_string()),
                    });
                }
            }
            extend_span(&mut span, block_start, block_end);
        }
    }

    span.map(|s| (entries, s))
}

fn extend_span(span: &mut Option<Span>, start: usize, end: usize) {
    match span {
        Some(s) => {
            s.start = s.start.min(start);
            s.end = s.end.max(end);
        }
        None => *span = Some(Span { start, end }),
    }
}

/// Compute the minimal byte range and replacement text for organizing
/// `source`'s imports, without applying it. Returns `None` if `source` has
/// no recognizable import construct at all.
pub fn organize_imports_edit(source: &str, module_path: Option<&str>, workspace_modules: &[String]) -> Option<(usize, usize, String)> {
    let (entries, span) = scan_imports(source)?;
    if entries.is_empty() {
        return None;
    }
    Some((span.start, span.end, render_block(&entries, module_path, workspace_modules)))
}

/// Reclassify and regroup every import declaration in `source` into a
/// single merged block. Returns `source` unchanged if it has no import
/// declarations at all. This mirrors the same no-op fallback as "if the
/// file does not parse, return the input unchanged", applied to the
/// analogous case of no recognizable import construct being present.
pub fn organize_imports(source: &str, module_path: Option<&str>, workspace_modules: &[String]) -> String {
    let Some((start, end, rendered)) = organize_imports_edit(source, module_path, workspace_modules) else {
        return source.to_string();
    };
    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..start]);
    out.push_str(&rendered);
    out.push_str(&source[end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_all_four_groups_plus_cgo() {
        let module = Some("github.com/mamaar/gorefactor");
        let workspace = vec!["github.com/mamaar/othermod".to_string()];
        assert_eq!(classify("C", module, &workspace), ImportGroup::Cgo);
        assert_eq!(classify("fmt", module, &workspace), ImportGroup::Stdlib);
        assert_eq!(
            classify("github.com/stretchr/testify/assert", module, &workspace),
            ImportGroup::External
        );
        assert_eq!(
            classify("github.com/mamaar/othermod/pkg/foo", module, &workspace),
            ImportGroup::Workspace
        );
        assert_eq!(
            classify("github.com/mamaar/gorefactor/pkg/types", module, &workspace),
            ImportGroup::Module
        );
    }

    #[test]
    fn classification_is_total_for_arbitrary_paths() {
        for path in ["os", "a.b/c", "C", "x", "", "github.com/x/y"] {
            // must not panic, and must land in exactly one of the five groups
            let _ = classify(path, None, &[]);
        }
    }

    #[test]
    fn renders_groups_in_fixed_order_with_blank_lines() {
        let entries = vec![
            ImportEntry { alias: None, path: "github.com/stretchr/testify/assert".into(), comment: None },
            ImportEntry { alias: None, path: "fmt".into(), comment: None },
            ImportEntry {
                alias: None,
                path: "github.com/mamaar/othermod/pkg/foo".into(),
                comment: None,
            },
            ImportEntry {
                alias: None,
                path: "github.com/mamaar/gorefactor/pkg/types".into(),
                comment: None,
            },
        ];
        let rendered = render_block(
            &entries,
            Some("github.com/mamaar/gorefactor"),
            &["github.com/mamaar/othermod".to_string()],
        );
        let expected = "import (\n\t\"fmt\"\n\n\t\"github.com/stretchr/testify/assert\"\n\n\t\"github.com/mamaar/othermod/pkg/foo\"\n\n\t\"github.com/mamaar/gorefactor/pkg/types\"\n)";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn preserves_aliases_and_comments() {
        let entries = vec![
            ImportEntry { alias: Some(".".into()), path: "fmt".into(), comment: None },
            ImportEntry { alias: Some("_".into()), path: "os".into(), comment: Some(" side effects".into()) },
        ];
        let rendered = render_block(&entries, None, &[]);
        assert!(rendered.contains(". \"fmt\""));
        assert!(rendered.contains("_ \"os\" // side effects"));
    }

    #[test]
    fn organizes_unsorted_block_source() {
        let src = "package foo\n\nimport (\n\t\"fmt\"\n\t\"github.com/stretchr/testify/assert\"\n\t\"github.com/mamaar/othermod/pkg/foo\"\n\t\"github.com/mamaar/gorefactor/pkg/types\"\n)\n\nfunc main() {}\n";
        let out = organize_imports(
            src,
            Some("github.com/mamaar/gorefactor"),
            &["github.com/mamaar/othermod".to_string()],
        );
        let stdlib_idx = out.find("\"fmt\"").unwrap();
        let external_idx = out.find("\"github.com/stretchr/testify/assert\"").unwrap();
        let workspace_idx = out.find("\"github.com/mamaar/othermod/pkg/foo\"").unwrap();
        let module_idx = out.find("\"github.com/mamaar/gorefactor/pkg/types\"").unwrap();
        assert!(stdlib_idx < external_idx);
        assert!(external_idx < workspace_idx);
        assert!(workspace_idx < module_idx);
        assert!(out.contains("func main() {}"));
    }

    #[test]
    fn no_imports_returns_input_unchanged() {
        let src = "package foo\n\nfunc main() {}\n";
        assert_eq!(organize_imports(src, None, &[]), src);
    }

    #[test]
    fn merges_single_line_and_block_imports() {
        let src = "package foo\n\nimport \"fmt\"\nimport (\n\t\"os\"\n)\n";
        let out = organize_imports(src, None, &[]);
        assert_eq!(out.matches("import").count(), 1);
        assert!(out.contains("\"fmt\""));
        assert!(out.contains("\"os\""));
    }
}
