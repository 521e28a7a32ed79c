//! Extract-Method engine (component G).
//!
//! Promotes a line range inside a method into a new method on the same
//! receiver type, inferring parameters (outer-scope names read inside the
//! block) and returns (outer-scope names written inside the block and
//! read again afterward). Parameter inference descends into nested
//! function literals (a closure still captures outer variables) but
//! return inference does not (a closure's assignments are not guaranteed
//! to execute inline with the block).

use std::path::PathBuf;

use crate::ast::{self, Block, Expr, Field, Stmt};
use crate::error::{RefactorError, Result};
use crate::fileset::FileSet;
use crate::model::Workspace;
use crate::plan::RefactoringPlan;

/// Inputs to an Extract-Method operation.
#[derive(Debug, Clone)]
pub struct ExtractMethodInput {
    /// File containing the method to extract from.
    pub source_file: PathBuf,
    /// First 0-based line of the statement range to extract.
    pub start_line: u32,
    /// Last 0-based line of the statement range to extract (inclusive).
    pub end_line: u32,
    /// Name of the new method.
    pub new_method_name: String,
    /// Receiver type the enclosing and new method both belong to.
    pub target_struct: String,
}

/// Validate operation inputs without touching the workspace.
pub fn validate(input: &ExtractMethodInput) -> Result<()> {
    if input.new_method_name.trim().is_empty() {
        return Err(RefactorError::InvalidOperation("new_method_name must not be empty".into()));
    }
    if input.target_struct.trim().is_empty() {
        return Err(RefactorError::InvalidOperation("target_struct must not be empty".into()));
    }
    if input.start_line > input.end_line {
        return Err(RefactorError::InvalidOperation(format!("start_line {} is after end_line {}", input.start_line, input.end_line)));
    }
    Ok(())
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}

fn leading_ident(text: &str) -> Option<&str> {
    let end = text.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(text.len());
    let first = text.chars().next()?;
    if end == 0 || (!first.is_alphabetic() && first != '_') {
        return None;
    }
    Some(&text[..end])
}

fn base_ident_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(i) => Some(&i.name),
        Expr::Selector(s) => base_ident_name(&s.x),
        Expr::Paren { inner, .. } => base_ident_name(inner),
        _ => None,
    }
}

fn collect_reads_in_expr(expr: &Expr, content: &str, out: &mut Vec<String>) {
    if let Some(name) = base_ident_name(expr) {
        push_unique(out, name);
    }
    match expr {
        Expr::Selector(s) => collect_reads_in_expr(&s.x, content, out),
        Expr::Call(c) => {
            collect_reads_in_expr(&c.fun, content, out);
            for a in &c.args {
                collect_reads_in_expr(a, content, out);
            }
        }
        Expr::FuncLit(f) => {
            let mut shadowed = out.clone();
            for p in &f.params {
                for n in &p.names {
                    push_unique(&mut shadowed, n);
                }
            }
            let mut inner = Vec::new();
            collect_reads_in_stmts(&f.body.stmts, content, &mut inner);
            for name in inner {
                if !f.params.iter().any(|p| p.names.contains(&name)) {
                    push_unique(out, &name);
                }
            }
        }
        Expr::Paren { inner, .. } => collect_reads_in_expr(inner, content, out),
        Expr::Other { pos, end } => {
            if let Some(name) = leading_ident(&content[*pos..*end]) {
                push_unique(out, name);
            }
        }
        Expr::Ident(_) | Expr::BasicLit { .. } => {}
    }
}

fn collect_reads_in_stmts(stmts: &[Stmt], content: &str, out: &mut Vec<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Expr(e) => collect_reads_in_expr(e, content, out),
            Stmt::Assign(a) => {
                for e in &a.lhs {
                    if !matches!(e, Expr::Ident(_)) {
                        collect_reads_in_expr(e, content, out);
                    }
                }
                for e in &a.rhs {
                    collect_reads_in_expr(e, content, out);
                }
            }
            Stmt::Go(g) => {
                collect_reads_in_expr(&g.call.fun, content, out);
                for a in &g.call.args {
                    collect_reads_in_expr(a, content, out);
                }
            }
            Stmt::Defer(d) => {
                collect_reads_in_expr(&d.call.fun, content, out);
                for a in &d.call.args {
                    collect_reads_in_expr(a, content, out);
                }
            }
            Stmt::Return(r) => {
                for e in &r.results {
                    collect_reads_in_expr(e, content, out);
                }
            }
            Stmt::If(i) => {
                collect_reads_in_stmts(&i.then.stmts, content, out);
                if let Some(els) = &i.els {
                    collect_reads_in_stmts(&els.stmts, content, out);
                }
            }
            Stmt::For(f) => collect_reads_in_stmts(&f.body.stmts, content, out),
            Stmt::Range(r) => {
                collect_reads_in_expr(&r.x, content, out);
                collect_reads_in_stmts(&r.body.stmts, content, out);
            }
            Stmt::Block(b) => collect_reads_in_stmts(&b.stmts, content, out),
            Stmt::Other { .. } => {}
        }
    }
}

fn collect_locally_declared(stmts: &[Stmt], out: &mut Vec<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign(a) if a.op == ":=" => {
                for e in &a.lhs {
                    if let Expr::Ident(i) = e {
                        push_unique(out, &i.name);
                    }
                }
            }
            Stmt::Range(r) => {
                if let Some(k) = &r.key {
                    push_unique(out, &k.name);
                }
                if let Some(v) = &r.value {
                    push_unique(out, &v.name);
                }
                collect_locally_declared(&r.body.stmts, out);
            }
            Stmt::If(i) => {
                collect_locally_declared(&i.then.stmts, out);
                if let Some(els) = &i.els {
                    collect_locally_declared(&els.stmts, out);
                }
            }
            Stmt::For(f) => collect_locally_declared(&f.body.stmts, out),
            Stmt::Block(b) => collect_locally_declared(&b.stmts, out),
            _ => {}
        }
    }
}

/// `(name, is_compound)` for every top-level write reachable without
/// descending into a `go`/`defer` call or a function literal.
fn collect_writes(stmts: &[Stmt], out: &mut Vec<(String, bool)>) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign(a) if a.op != ":=" => {
                let is_compound = a.op != "=";
                for e in &a.lhs {
                    if let Expr::Ident(i) = e {
                        if !out.iter().any(|(n, _)| n == &i.name) {
                            out.push((i.name.clone(), is_compound));
                        }
                    }
                }
            }
            Stmt::If(i) => {
                collect_writes(&i.then.stmts, out);
                if let Some(els) = &i.els {
                    collect_writes(&els.stmts, out);
                }
            }
            Stmt::For(f) => collect_writes(&f.body.stmts, out),
            Stmt::Range(r) => collect_writes(&r.body.stmts, out),
            Stmt::Block(b) => collect_writes(&b.stmts, out),
            _ => {}
        }
    }
}

fn has_read_after(sibling_stmts: &[Stmt], after: usize, content: &str, name: &str) -> bool {
    let mut out = Vec::new();
    for stmt in sibling_stmts {
        if stmt.pos() >= after {
            collect_reads_in_stmts(std::slice::from_ref(stmt), content, &mut out);
        }
    }
    out.iter().any(|n| n == name)
}

fn find_enclosing_method<'a>(file: &'a ast::File, target_struct: &str, start_byte: usize, end_byte: usize) -> Option<&'a ast::FuncDecl> {
    file.funcs().find(|f| {
        f.recv.as_ref().map(|r| r.ty.trim_start_matches('*') == target_struct).unwrap_or(false)
            && f.body.as_ref().map(|b| b.pos <= start_byte && end_byte <= b.end).unwrap_or(false)
    })
}

fn select_stmt_range(body: &Block, range_start_byte: usize, range_end_byte: usize) -> Option<(usize, usize)> {
    let indices: Vec<usize> = body
        .stmts
        .iter()
        .enumerate()
        .filter(|(_, s)| s.pos() >= range_start_byte && s.end() <= range_end_byte)
        .map(|(i, _)| i)
        .collect();
    let first = *indices.first()?;
    let last = *indices.last()?;
    Some((first, last))
}

/// Infer a candidate's declared type from: the enclosing method's own
/// parameter/receiver list, a locally declared literal assignment
/// (`name := <literal>`), or a map-literal assignment. Returns `None`
/// (never a synthesized `interface{}` placeholder) if no source applies.
fn infer_type(method: &ast::FuncDecl, content: &str, name: &str) -> Option<String> {
    if let Some(recv) = &method.recv {
        if recv.names.iter().any(|n| n == name) {
            return Some(recv.ty.clone());
        }
    }
    for field in &method.params {
        if field.names.iter().any(|n| n == name) {
            return Some(field.ty.clone());
        }
    }
    if let Some(body) = &method.body {
        if let Some(ty) = find_declared_literal_type(&body.stmts, content, name) {
            return Some(ty);
        }
    }
    None
}

fn find_declared_literal_type(stmts: &[Stmt], content: &str, name: &str) -> Option<String> {
    for stmt in stmts {
        match stmt {
            Stmt::Assign(a) if a.op == ":=" && a.lhs.len() == a.rhs.len() => {
                for (lhs, rhs) in a.lhs.iter().zip(a.rhs.iter()) {
                    if let Expr::Ident(i) = lhs {
                        if i.name == name {
                            if let Some(ty) = infer_literal_type(rhs, content) {
                                return Some(ty);
                            }
                        }
                    }
                }
            }
            Stmt::If(i) => {
                if let Some(t) = find_declared_literal_type(&i.then.stmts, content, name) {
                    return Some(t);
                }
                if let Some(els) = &i.els {
                    if let Some(t) = find_declared_literal_type(&els.stmts, content, name) {
                        return Some(t);
                    }
                }
            }
            Stmt::For(f) => {
                if let Some(t) = find_declared_literal_type(&f.body.stmts, content, name) {
                    return Some(t);
                }
            }
            Stmt::Range(r) => {
                if let Some(t) = find_declared_literal_type(&r.body.stmts, content, name) {
                    return Some(t);
                }
            }
            Stmt::Block(b) => {
                if let Some(t) = find_declared_literal_type(&b.stmts, content, name) {
                    return Some(t);
                }
            }
            _ => {}
        }
    }
    None
}

fn infer_literal_type(expr: &Expr, content: &str) -> Option<String> {
    match expr {
        Expr::BasicLit { value, .. } => {
            if value.starts_with('"') {
                Some("string".to_string())
            } else if value == "true" || value == "false" {
                Some("bool".to_string())
            } else if value.contains('.') {
                Some("float64".to_string())
            } else if value.chars().all(|c| c.is_ascii_digit()) {
                Some("int".to_string())
            } else {
                None
            }
        }
        Expr::Other { pos, end } => {
            let text = &content[*pos..*end];
            if text.starts_with("map[") { Some(text.to_string()) } else { None }
        }
        _ => None,
    }
}

fn render_params(names: &[String], method: &ast::FuncDecl, content: &str) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    for name in names {
        let ty = infer_type(method, content, name).ok_or_else(|| RefactorError::InvalidOperation(format!("cannot infer type of {}", name)))?;
        fields.push(Field { names: vec![name.clone()], ty });
    }
    Ok(fields)
}

fn render_param_list(fields: &[Field]) -> String {
    fields.iter().map(|f| format!("{} {}", f.names.join(", "), f.ty)).collect::<Vec<_>>().join(", ")
}

fn render_return_types(types: &[String]) -> String {
    match types.len() {
        0 => String::new(),
        1 => format!(" {}", types[0]),
        _ => format!(" ({})", types.join(", ")),
    }
}

/// Execute an Extract-Method operation against `workspace`.
pub fn execute(workspace: &Workspace, input: &ExtractMethodInput) -> Result<RefactoringPlan> {
    validate(input)?;

    let (pkg, file) = workspace
        .file_by_path(&input.source_file)
        .ok_or_else(|| RefactorError::SymbolNotFound(format!("no such file: {}", input.source_file.display())))?;
    let content = &file.original_content;
    let fileset = FileSet::new(content);

    let start_byte = fileset.line_start(input.start_line).ok_or_else(|| RefactorError::InvalidOperation(format!("line {} out of range", input.start_line)))?;
    let end_byte = fileset.line_end(fileset.line_start(input.end_line).unwrap_or(content.len()));

    let method = find_enclosing_method(&file.ast, &input.target_struct, start_byte, end_byte)
        .ok_or_else(|| RefactorError::SymbolNotFound(format!("no method of {} spans lines {}..{}", input.target_struct, input.start_line, input.end_line)))?;
    let body = method.body.as_ref().ok_or_else(|| RefactorError::SymbolNotFound(format!("{} has no body", input.target_struct)))?;

    let (first_idx, last_idx) = select_stmt_range(body, start_byte, end_byte).ok_or_else(|| RefactorError::InvalidOperation("no statements in the given line range".into()))?;
    let selected = &body.stmts[first_idx..=last_idx];

    let mut locally_declared = Vec::new();
    collect_locally_declared(selected, &mut locally_declared);

    let mut reads = Vec::new();
    for stmt in selected {
        collect_reads_in_stmts(std::slice::from_ref(stmt), content, &mut reads);
    }

    let mut writes = Vec::new();
    collect_writes(selected, &mut writes);
    for (name, is_compound) in &writes {
        if *is_compound {
            push_unique(&mut reads, name);
        }
    }

    let range_end_byte = selected.last().map(|s| s.end()).unwrap_or(end_byte);
    let param_names: Vec<String> = reads.into_iter().filter(|n| !locally_declared.contains(n)).collect();
    let return_names: Vec<String> = writes
        .into_iter()
        .map(|(n, _)| n)
        .filter(|n| !locally_declared.contains(n))
        .filter(|n| has_read_after(&body.stmts[last_idx + 1..], range_end_byte, content, n))
        .collect();

    let param_fields = render_params(&param_names, method, content)?;
    let return_types: Vec<String> = return_names
        .iter()
        .map(|n| infer_type(method, content, n).ok_or_else(|| RefactorError::InvalidOperation(format!("cannot infer type of {}", n))))
        .collect::<Result<Vec<_>>>()?;

    let recv_name = method.recv.as_ref().and_then(|r| r.names.first().cloned()).unwrap_or_else(|| input.target_struct.to_lowercase().chars().take(1).collect());
    let recv_ty = method.recv.as_ref().map(|r| r.ty.clone()).unwrap_or_else(|| format!("*{}", input.target_struct));

    let byte_start = selected.first().map(|s| s.pos()).unwrap_or(start_byte);
    let byte_end = range_end_byte;
    let extracted_text = content[byte_start..byte_end].to_string();

    let new_method_text = format!(
        "\nfunc ({} {}) {}({}){} {{\n{}\n}}\n",
        recv_name,
        recv_ty,
        input.new_method_name,
        render_param_list(&param_fields),
        render_return_types(&return_types),
        extracted_text
    );

    // `return_names` excludes anything declared within the selected range (see the
    // `locally_declared` filter above), so every name here was already declared in the
    // enclosing function before extraction. `:=` would redeclare it, which Go rejects
    // ("no new variables on left side of :="); the call site must assign with `=`.
    let call_prefix = if return_names.is_empty() { String::new() } else { format!("{} = ", return_names.join(", ")) };
    let call_text = format!("{}{}.{}({})", call_prefix, recv_name, input.new_method_name, param_names.join(", "));

    let changes = vec![
        crate::edit::Change::new(file.path.clone(), byte_start, byte_end, extracted_text.clone(), call_text, format!("extract {}", input.new_method_name))?,
        crate::edit::Change::new(file.path.clone(), content.len(), content.len(), "", new_method_text, format!("append extracted method {}", input.new_method_name))?,
    ];

    Ok(RefactoringPlan::new(changes, vec![pkg.path.clone()]))
}
