//! Change-Signature engine (component E): the centerpiece of the crate.
//!
//! Rewrites a function or method declaration's parameter/return list and
//! every call site that invokes it, preserving argument syntax byte for
//! byte. Edits accumulate as plain `Change` values rather than being
//! applied in place, so the whole operation can be validated before any
//! file is touched.

use std::path::PathBuf;

use crate::ast::{self, Field};
use crate::edit::Change;
use crate::error::{RefactorError, Result};
use crate::fileset::FileSet;
use crate::model::{File as ModelFile, Package, Reference, Scope, Symbol, SymbolKind, Workspace};
use crate::plan::RefactoringPlan;
use crate::resolver::SymbolResolver;

/// One parameter in a new signature: `{ name, type }`, both already
/// rendered in surface syntax.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type, as surface syntax.
    pub ty: String,
}

/// The inputs to a single Change-Signature operation.
#[derive(Debug, Clone)]
pub struct ChangeSignatureInput {
    /// Target function/method. `Type.Method` for a method, bare name for
    /// a top-level function.
    pub function_name: String,
    /// File to search, if already known. When `None`, every package is
    /// scanned for a matching declaration.
    pub source_file: Option<PathBuf>,
    /// The full new parameter list (replaces the old one entirely).
    pub new_params: Vec<Parameter>,
    /// The full new return-type list. Empty means "preserve whatever the
    /// declaration already returns".
    pub new_returns: Vec<String>,
    /// Literal text inserted at call sites for the newly introduced
    /// parameter slot.
    pub default_value: String,
    /// Index, among `new_params`, of the newly introduced parameter.
    pub new_param_position: usize,
    /// Whether to search for call sites within the defining package only,
    /// or across the whole workspace.
    pub scope: Scope,
}

/// Validate operation inputs without touching the workspace.
///
/// `source_file` is deliberately **not** required here: leaving it absent
/// triggers a workspace-wide scan instead. Only an empty `function_name`
/// is a validation failure (see design note in `DESIGN.md` on this point).
pub fn validate(input: &ChangeSignatureInput) -> Result<()> {
    if input.function_name.trim().is_empty() {
        return Err(RefactorError::InvalidOperation("function_name must not be empty".into()));
    }
    Ok(())
}

enum FoundDecl<'a> {
    Func(&'a ast::FuncDecl),
    Interface { type_name: &'a str, method: &'a ast::MethodSpec },
}

impl<'a> FoundDecl<'a> {
    fn params_span(&self) -> (usize, usize) {
        match self {
            FoundDecl::Func(f) => f.params_span,
            FoundDecl::Interface { method, .. } => method.params_span,
        }
    }

    fn results_span(&self) -> Option<(usize, usize)> {
        match self {
            FoundDecl::Func(f) => f.results_span,
            FoundDecl::Interface { method, .. } => method.results_span,
        }
    }

    fn results(&self) -> &'a [Field] {
        match self {
            FoundDecl::Func(f) => &f.results,
            FoundDecl::Interface { method, .. } => &method.results,
        }
    }

    fn name_pos(&self) -> usize {
        match self {
            FoundDecl::Func(f) => f.name_pos,
            FoundDecl::Interface { method, .. } => method.name_pos,
        }
    }

    fn kind(&self) -> SymbolKind {
        match self {
            FoundDecl::Func(f) if f.recv.is_some() => SymbolKind::Method,
            FoundDecl::Func(_) => SymbolKind::Function,
            FoundDecl::Interface { .. } => SymbolKind::Method,
        }
    }
}

fn find_in_file<'a>(file: &'a ast::File, function_name: &str) -> Option<FoundDecl<'a>> {
    for (type_name, iface) in file.interfaces() {
        for method in &iface.methods {
            if format!("{}.{}", type_name, method.name) == function_name {
                return Some(FoundDecl::Interface { type_name, method });
            }
        }
    }
    for f in file.funcs() {
        if f.qualified_name() == function_name {
            return Some(FoundDecl::Func(f));
        }
    }
    None
}

fn resolve_declaration<'a>(
    workspace: &'a Workspace,
    input: &ChangeSignatureInput,
) -> Result<(&'a Package, &'a ModelFile, FoundDecl<'a>)> {
    if let Some(source_file) = &input.source_file {
        let (pkg, file) = workspace
            .file_by_path(source_file)
            .ok_or_else(|| RefactorError::SymbolNotFound(format!("no such file: {}", source_file.display())))?;
        let found = find_in_file(&file.ast, &input.function_name)
            .ok_or_else(|| RefactorError::SymbolNotFound(input.function_name.clone()))?;
        return Ok((pkg, file, found));
    }
    for pkg in workspace.packages.values() {
        for (_, file) in pkg.all_files() {
            if let Some(found) = find_in_file(&file.ast, &input.function_name) {
                return Ok((pkg, file, found));
            }
        }
    }
    Err(RefactorError::SymbolNotFound(input.function_name.clone()))
}

/// Flatten a field list into one type string per return slot: count is
/// computed by summing `len(Names)` per field, where an unnamed field
/// counts as 1.
fn expand_field_types(fields: &[Field]) -> Vec<String> {
    let mut out = Vec::new();
    for f in fields {
        for _ in 0..f.slot_count() {
            out.push(f.ty.clone());
        }
    }
    out
}

fn render_params(params: &[Parameter]) -> String {
    let inner = params.iter().map(|p| format!("{} {}", p.name, p.ty)).collect::<Vec<_>>().join(", ");
    format!("({})", inner)
}

/// Returns, rendered as they would appear standing alone in an existing
/// result-list byte span (no leading separator).
fn render_returns_standalone(returns: &[String]) -> String {
    match returns.len() {
        0 => String::new(),
        1 => returns[0].clone(),
        _ => format!("({})", returns.join(", ")),
    }
}

/// Returns, rendered with the leading space needed when inserting a
/// result list where none existed before.
fn render_returns_with_leading_space(returns: &[String]) -> String {
    if returns.is_empty() {
        String::new()
    } else {
        format!(" {}", render_returns_standalone(returns))
    }
}

fn build_declaration_changes(file: &ModelFile, found: &FoundDecl<'_>, input: &ChangeSignatureInput, new_returns: &[String]) -> Result<Vec<Change>> {
    let mut changes = Vec::new();

    let (p_start, p_end) = found.params_span();
    let old_params = file.original_content[p_start..p_end].to_string();
    let new_params = render_params(&input.new_params);
    changes.push(Change::new(file.path.clone(), p_start, p_end, old_params, new_params, format!("update parameter list of {}", input.function_name))?);

    match found.results_span() {
        Some((r_start, r_end)) => {
            let old_returns = file.original_content[r_start..r_end].to_string();
            let new = render_returns_standalone(new_returns);
            changes.push(Change::new(file.path.clone(), r_start, r_end, old_returns, new, format!("update return list of {}", input.function_name))?);
        }
        None if !new_returns.is_empty() => {
            let new = render_returns_with_leading_space(new_returns);
            changes.push(Change::new(file.path.clone(), p_end, p_end, "", new, format!("add return list to {}", input.function_name))?);
        }
        None => {}
    }

    Ok(changes)
}

/// Build the call-site edit for a single reference. Returns `None` if the
/// reference's position does not
/// resolve to an enclosing call expression (a resolver/AST mismatch that
/// this crate tolerates rather than aborting the whole plan on).
fn build_call_site_change(workspace: &Workspace, reference: &Reference, input: &ChangeSignatureInput) -> Option<Change> {
    let (_, file) = workspace.file_by_path(&reference.file)?;
    let call = ast::find_call_at(&file.ast, reference.position)?;
    let content = &file.original_content;

    let fun_text = &content[call.fun.pos()..call.fun.end()];
    let mut original_args = call.args.iter().map(|a| content[a.pos()..a.end()].to_string());

    let total_slots = input.new_params.len();
    let mut new_args: Vec<String> = Vec::with_capacity(total_slots);
    for slot in 0..total_slots {
        if slot == input.new_param_position {
            new_args.push(input.default_value.clone());
        } else {
            new_args.push(original_args.next().unwrap_or_default());
        }
    }

    let new_text = format!("{}({})", fun_text, new_args.join(", "));
    let old_text = content[call.pos..call.end].to_string();
    Change::new(file.path.clone(), call.pos, call.end, old_text, new_text, format!("update call to {}", input.function_name)).ok()
}

/// Execute a Change-Signature operation against `workspace`, using
/// `resolver` to find call sites.
pub fn execute(workspace: &Workspace, input: &ChangeSignatureInput, resolver: &dyn SymbolResolver) -> Result<RefactoringPlan> {
    validate(input)?;

    let (pkg, file, found) = resolve_declaration(workspace, input)?;

    let new_returns = if input.new_returns.is_empty() {
        expand_field_types(found.results())
    } else {
        input.new_returns.clone()
    };

    let mut changes = build_declaration_changes(file, &found, input, &new_returns)?;

    let fileset = FileSet::new(&file.original_content);
    let name_pos = found.name_pos();
    let name_len = input.function_name.rsplit('.').next().unwrap_or(&input.function_name).len();
    let position = fileset.resolve(name_pos);
    let symbol = Symbol {
        name: input.function_name.clone(),
        kind: found.kind(),
        package: pkg.path.clone(),
        file: file.path.clone(),
        position: name_pos,
        end: name_pos + name_len,
        line: position.line,
        column: position.column,
        exported: input.function_name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false),
    };

    let references = resolver.find_references(&symbol, input.scope).map_err(|e| RefactorError::InvalidOperation(e.to_string()))?;
    for reference in &references {
        if let Some(change) = build_call_site_change(workspace, reference, input) {
            changes.push(change);
        }
    }

    Ok(RefactoringPlan::new(changes, vec![pkg.path.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_function_name() {
        let input = ChangeSignatureInput {
            function_name: String::new(),
            source_file: None,
            new_params: vec![],
            new_returns: vec![],
            default_value: String::new(),
            new_param_position: 0,
            scope: Scope::Package,
        };
        assert!(validate(&input).is_err());
    }

    #[test]
    fn validate_allows_missing_source_file() {
        let input = ChangeSignatureInput {
            function_name: "Process".into(),
            source_file: None,
            new_params: vec![],
            new_returns: vec![],
            default_value: String::new(),
            new_param_position: 0,
            scope: Scope::Package,
        };
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn render_params_joins_with_commas() {
        let params = vec![
            Parameter { name: "ctx".into(), ty: "context.Context".into() },
            Parameter { name: "k".into(), ty: "int".into() },
        ];
        assert_eq!(render_params(&params), "(ctx context.Context, k int)");
    }

    #[test]
    fn render_returns_scales_with_count() {
        assert_eq!(render_returns_standalone(&[]), "");
        assert_eq!(render_returns_standalone(&["error".to_string()]), "error");
        assert_eq!(
            render_returns_standalone(&["string".to_string(), "error".to_string()]),
            "(string, error)"
        );
        assert_eq!(render_returns_with_leading_space(&["error".to_string()]), " error");
    }

    #[test]
    fn expand_field_types_counts_unnamed_as_one() {
        let fields = vec![
            Field { names: vec!["a".into(), "b".into()], ty: "int".into() },
            Field { names: vec![], ty: "error".into() },
        ];
        assert_eq!(expand_field_types(&fields), vec!["int", "int", "error"]);
    }

    #[test]
    fn finds_bare_top_level_function() {
        let src = "func Process(k int) {\n}\n";
        let file = ast::File {
            package_name: "main".into(),
            imports: vec![],
            decls: vec![ast::Decl::Func(ast::FuncDecl {
                name: "Process".into(),
                recv: None,
                params: vec![],
                results: vec![],
                pos: 0,
                name_pos: src.find("Process").unwrap(),
                params_span: (src.find("(k int)").unwrap(), src.find("(k int)").unwrap() + 7),
                results_span: None,
                body: None,
                end: src.len(),
            })],
        };
        let found = find_in_file(&file, "Process");
        assert!(matches!(found, Some(FoundDecl::Func(_))));
        assert!(find_in_file(&file, "Other").is_none());
    }

    #[test]
    fn finds_interface_method_by_dotted_name() {
        let src = "type Saver interface {\n\tSaveTile(key *string, data []byte) error\n}\n";
        let method_pos = src.find("SaveTile").unwrap();
        let file = ast::File {
            package_name: "main".into(),
            imports: vec![],
            decls: vec![ast::Decl::Type(ast::TypeDecl {
                name: "Saver".into(),
                spec: ast::TypeSpec::Interface(ast::InterfaceType {
                    methods: vec![ast::MethodSpec {
                        name: "SaveTile".into(),
                        params: vec![],
                        results: vec![Field { names: vec![], ty: "error".into() }],
                        name_pos: method_pos,
                        params_span: (0, 0),
                        results_span: Some((src.rfind("error").unwrap(), src.len() - 2)),
                        end: src.len(),
                    }],
                }),
                pos: 0,
                end: src.len(),
            })],
        };
        let found = find_in_file(&file, "Saver.SaveTile").expect("should find interface method");
        let returns = expand_field_types(found.results());
        assert_eq!(returns, vec!["error"]);
    }
}
