//! Workspace-module discoverer (component C).
//!
//! Walks upward from a root directory looking for a workspace manifest;
//! if found, parses its `use` directives (single-line and block form),
//! reads each referenced module's manifest, and extracts its `module
//! <name>` identifier. Directories without a module manifest are silently
//! skipped. Returns the empty list when no workspace manifest exists
//! anywhere between the root and the filesystem root.

use std::path::{Path, PathBuf};

use crate::error::Result;

const WORKSPACE_MANIFEST: &str = "go.work";
const MODULE_MANIFEST: &str = "go.mod";

/// Find the nearest workspace manifest at or above `start`, returning its
/// path, or `None` if none exists up to the filesystem root.
fn find_workspace_manifest(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join(WORKSPACE_MANIFEST);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

/// Parse `use` directives (single-line `use ./path` and block `use ( …
/// )` forms) out of workspace manifest text. `//` begins a line comment;
/// blank lines are ignored.
fn parse_use_directives(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines = text.lines().peekable();
    while let Some(raw_line) = lines.next() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("use ") {
            let rest = rest.trim();
            if rest == "(" {
                for block_line in lines.by_ref() {
                    let block_line = strip_comment(block_line).trim();
                    if block_line.is_empty() {
                        continue;
                    }
                    if block_line == ")" {
                        break;
                    }
                    out.push(block_line.to_string());
                }
            } else {
                out.push(rest.to_string());
            }
        } else if line == "use (" {
            for block_line in lines.by_ref() {
                let block_line = strip_comment(block_line).trim();
                if block_line.is_empty() {
                    continue;
                }
                if block_line == ")" {
                    break;
                }
                out.push(block_line.to_string());
            }
        }
    }
    out
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse a module manifest's `module <path>` identifier line.
fn parse_module_identifier(text: &str) -> Option<String> {
    for line in text.lines() {
        let line = strip_comment(line).trim();
        if let Some(rest) = line.strip_prefix("module ") {
            let name = rest.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Discover every sibling module's import path in the multi-module
/// workspace rooted (or ancestor-rooted) at `start`.
///
/// Returns `[]` if no workspace manifest exists anywhere from `start` to
/// the filesystem root.
pub fn discover_workspace_modules(start: &Path) -> Result<Vec<String>> {
    let Some(manifest_path) = find_workspace_manifest(start) else {
        return Ok(Vec::new());
    };
    let workspace_root = manifest_path.parent().unwrap_or(start).to_path_buf();
    let manifest_text = std::fs::read_to_string(&manifest_path).map_err(|e| crate::error::RefactorError::io(&manifest_path, e))?;

    let mut modules = Vec::new();
    for rel_dir in parse_use_directives(&manifest_text) {
        let module_dir = workspace_root.join(&rel_dir);
        let module_manifest = module_dir.join(MODULE_MANIFEST);
        if !module_manifest.is_file() {
            continue; // silently skipped, per spec
        }
        let module_text = std::fs::read_to_string(&module_manifest).map_err(|e| crate::error::RefactorError::io(&module_manifest, e))?;
        if let Some(name) = parse_module_identifier(&module_text) {
            modules.push(name);
        }
    }
    Ok(modules)
}
