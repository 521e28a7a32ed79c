//! Safe-Delete engine (component F).
//!
//! Locates a declaration by its symbol's position, computes a removal
//! range that absorbs an immediately preceding comment group and trailing
//! line terminators, and validates that no references exist outside the
//! declaration itself, unless the caller forces the deletion, in which
//! case each external reference's enclosing statement is also removed.

use crate::ast;
use crate::edit::Change;
use crate::error::{RefactorError, Result};
use crate::fileset::FileSet;
use crate::model::{Reference, Scope, Symbol, SymbolKind, Workspace};
use crate::plan::{IssueKind, RefactoringPlan};
use crate::resolver::SymbolResolver;

/// Tuning parameter for backward comment-group absorption: how many bytes
/// before a declaration's start a leading comment group may end and still
/// be considered "attached" to it. Approximate by design, since this
/// crate's minimal AST carries no comment-association metadata of its own.
pub const COMMENT_ASSOCIATION_WINDOW: usize = 100;

/// Inputs to a Safe-Delete operation.
#[derive(Debug, Clone)]
pub struct SafeDeleteInput {
    /// The symbol to delete, already resolved by the caller.
    pub symbol: Symbol,
    /// Cascade-remove external reference sites instead of failing.
    pub force: bool,
}

/// Validate operation inputs without touching the workspace.
pub fn validate(input: &SafeDeleteInput) -> Result<()> {
    if input.symbol.name.trim().is_empty() {
        return Err(RefactorError::InvalidOperation("symbol name must not be empty".into()));
    }
    Ok(())
}

enum DeclNode<'a> {
    Func(&'a ast::FuncDecl),
    Type(&'a ast::TypeDecl),
}

impl<'a> DeclNode<'a> {
    fn pos(&self) -> usize {
        match self {
            DeclNode::Func(f) => f.pos,
            DeclNode::Type(t) => t.pos,
        }
    }

    fn end(&self) -> usize {
        match self {
            DeclNode::Func(f) => f.end,
            DeclNode::Type(t) => t.end,
        }
    }
}

/// Locate the declaration whose defining identifier (functions/methods)
/// or declaration start (types/interfaces) matches `position`.
fn find_decl_at(file: &ast::File, position: usize) -> Option<DeclNode<'_>> {
    for decl in &file.decls {
        match decl {
            ast::Decl::Func(f) => {
                if f.name_pos == position || f.pos == position {
                    return Some(DeclNode::Func(f));
                }
            }
            ast::Decl::Type(t) => {
                if t.pos == position {
                    return Some(DeclNode::Type(t));
                }
            }
        }
    }
    None
}

fn find_enclosing_stmt<'a>(block: &'a ast::Block, pos: usize) -> Option<&'a ast::Stmt> {
    for stmt in &block.stmts {
        if stmt.pos() <= pos && pos < stmt.end() {
            let narrower = match stmt {
                ast::Stmt::If(i) => find_enclosing_stmt(&i.then, pos).or_else(|| i.els.as_ref().and_then(|e| find_enclosing_stmt(e, pos))),
                ast::Stmt::For(f) => find_enclosing_stmt(&f.body, pos),
                ast::Stmt::Range(r) => find_enclosing_stmt(&r.body, pos),
                ast::Stmt::Block(b) => find_enclosing_stmt(b, pos),
                _ => None,
            };
            return Some(narrower.unwrap_or(stmt));
        }
    }
    None
}

fn find_enclosing_stmt_in_file(file: &ast::File, pos: usize) -> Option<&ast::Stmt> {
    for func in file.funcs() {
        if let Some(body) = &func.body {
            if body.pos <= pos && pos < body.end {
                if let Some(stmt) = find_enclosing_stmt(body, pos) {
                    return Some(stmt);
                }
            }
        }
    }
    None
}

fn extend_backward_for_comments(content: &str, fileset: &FileSet, decl_pos: usize) -> usize {
    let mut start = decl_pos;
    let mut line = fileset.resolve(decl_pos).line;
    loop {
        if line == 0 {
            break;
        }
        let prev_line = line - 1;
        let Some(prev_start) = fileset.line_start(prev_line) else { break };
        let prev_end = fileset.line_start(line).unwrap_or(start);
        let prev_text = content[prev_start..prev_end].trim();
        if !prev_text.starts_with("//") {
            break;
        }
        if decl_pos.saturating_sub(prev_start) > COMMENT_ASSOCIATION_WINDOW {
            break;
        }
        start = prev_start;
        line = prev_line;
    }
    start
}

fn extend_forward_for_newline(content: &str, decl_end: usize) -> usize {
    let bytes = content.as_bytes();
    let mut end = decl_end;
    while end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    end
}

fn removal_range(content: &str, fileset: &FileSet, decl_pos: usize, decl_end: usize) -> (usize, usize) {
    (extend_backward_for_comments(content, fileset, decl_pos), extend_forward_for_newline(content, decl_end))
}

/// Execute a Safe-Delete operation against `workspace`.
pub fn execute(workspace: &Workspace, input: &SafeDeleteInput, resolver: &dyn SymbolResolver) -> Result<RefactoringPlan> {
    validate(input)?;

    let (owning_pkg, file) = workspace
        .file_by_path(&input.symbol.file)
        .ok_or_else(|| RefactorError::SymbolNotFound(format!("no such file: {}", input.symbol.file.display())))?;
    let decl = find_decl_at(&file.ast, input.symbol.position).ok_or_else(|| RefactorError::SymbolNotFound(input.symbol.name.clone()))?;

    let references = resolver.find_references(&input.symbol, Scope::Workspace).map_err(|e| RefactorError::InvalidOperation(e.to_string()))?;
    let outside_refs: Vec<&Reference> = references
        .iter()
        .filter(|r| !(r.file == file.path && decl.pos() <= r.position && r.position < decl.end()))
        .collect();

    if !outside_refs.is_empty() && !input.force {
        return Err(RefactorError::InvalidOperation(format!(
            "cannot delete {}: {} external reference(s) exist (pass force to override)",
            input.symbol.name,
            outside_refs.len()
        )));
    }

    let fileset = FileSet::new(&file.original_content);
    let (removal_start, removal_end) = removal_range(&file.original_content, &fileset, decl.pos(), decl.end());
    let mut changes = vec![Change::new(
        file.path.clone(),
        removal_start,
        removal_end,
        file.original_content[removal_start..removal_end].to_string(),
        "",
        format!("delete {}", input.symbol.name),
    )?];

    let mut affected_packages = vec![owning_pkg.path.clone()];

    if !outside_refs.is_empty() {
        for reference in &outside_refs {
            let Some((ref_pkg, ref_file)) = workspace.file_by_path(&reference.file) else { continue };
            let Some(stmt) = find_enclosing_stmt_in_file(&ref_file.ast, reference.position) else { continue };
            changes.push(Change::new(
                ref_file.path.clone(),
                stmt.pos(),
                stmt.end(),
                ref_file.original_content[stmt.pos()..stmt.end()].to_string(),
                "",
                format!("remove reference to deleted symbol {}", input.symbol.name),
            )?);
            if !affected_packages.contains(&ref_pkg.path) {
                affected_packages.push(ref_pkg.path.clone());
            }
        }
    }

    let mut plan = RefactoringPlan::new(changes, affected_packages);

    if input.symbol.exported {
        plan.warn(IssueKind::VisibilityError, format!("{} is exported; deleting it may break downstream packages", input.symbol.name));
    }
    if matches!(input.symbol.kind, SymbolKind::Type | SymbolKind::Interface) {
        plan.warn(IssueKind::CompilationError, format!("{} is a type/interface; deleting it risks compile errors at remaining use sites", input.symbol.name));
    }
    if !outside_refs.is_empty() {
        plan.warn(IssueKind::CompilationError, format!("forced deletion removed {} reference site(s)", outside_refs.len()));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_symbol_name() {
        let symbol = Symbol {
            name: String::new(),
            kind: SymbolKind::Function,
            package: "main".into(),
            file: "main.go".into(),
            position: 0,
            end: 0,
            line: 0,
            column: 0,
            exported: false,
        };
        assert!(validate(&SafeDeleteInput { symbol, force: false }).is_err());
    }

    #[test]
    fn removal_range_absorbs_adjacent_comment_and_trailing_newline() {
        let content = "package main\n\n// Helper does a thing.\nfunc Helper() {\n}\n\nfunc main() {}\n";
        let fileset = FileSet::new(content);
        let decl_pos = content.find("func Helper").unwrap();
        let decl_end = content.find("}\n\nfunc main").unwrap() + 1;
        let (start, end) = removal_range(content, &fileset, decl_pos, decl_end);
        assert_eq!(&content[start..start + 2], "//");
        assert!(content[start..end].ends_with('\n'));
        assert!(!content[..start].ends_with("thing.\n\n"));
    }

    #[test]
    fn removal_range_ignores_comment_outside_window() {
        let padding = "x".repeat(COMMENT_ASSOCIATION_WINDOW + 50);
        let content = format!("// far away\n{}\nfunc Helper() {{\n}}\n", padding);
        let fileset = FileSet::new(&content);
        let decl_pos = content.find("func Helper").unwrap();
        let decl_end = content.len();
        let (start, _) = removal_range(&content, &fileset, decl_pos, decl_end);
        assert_eq!(start, decl_pos);
    }

    #[test]
    fn find_enclosing_stmt_returns_narrowest_match() {
        let src = "x := 1\nif true {\n\tuse(x)\n}\n";
        let inner_pos = src.find("use(x)").unwrap();
        let inner_end = inner_pos + "use(x)".len();
        let outer_if_pos = src.find("if true").unwrap();
        let block = ast::Block {
            stmts: vec![ast::Stmt::If(ast::IfStmt {
                then: ast::Block {
                    stmts: vec![ast::Stmt::Other { pos: inner_pos, end: inner_end }],
                    pos: src.find('{').unwrap(),
                    end: src.rfind('}').unwrap() + 1,
                },
                els: None,
                pos: outer_if_pos,
                end: src.len(),
            })],
            pos: 0,
            end: src.len(),
        };
        let found = find_enclosing_stmt(&block, inner_pos).expect("must find enclosing stmt");
        assert_eq!(found.pos(), inner_pos);
        assert_eq!(found.end(), inner_end);
    }
}
